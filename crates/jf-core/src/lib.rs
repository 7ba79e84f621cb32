//! Job Filter Core Library
//!
//! This crate provides the content-side filtering engine for the Job Filter
//! extension: it finds job cards on LinkedIn and Indeed result pages, decides
//! which ones the user does not want to see, and dims them behind an
//! "unblock" control while the host page keeps mutating underneath.
//!
//! # Architecture
//!
//! The engine is generic over a small document abstraction ([`dom`]), so the
//! same code runs against the live page (through the wasm runtime) and
//! against an in-memory tree in tests. Time is injected the same way; the
//! engine never reads a clock or starts a timer on its own.
//!
//! # Modules
//!
//! - `dom`: Document/element traits and the in-memory implementation
//! - `profile`: Per-site selectors, company extraction and status detection
//! - `matcher`: Block-list normalization and matching
//! - `classify`: Combines the matcher and status filters into hide reasons
//! - `visibility`: Hidden/visible/override state and its DOM side effects
//! - `scheduler`: Debounce and safety-interval bookkeeping
//! - `change`: Inserted-node heuristics feeding the scheduler
//! - `engine`: The orchestrator
//! - `config`: Settings, block list, store and message formats

pub mod change;
pub mod classify;
pub mod config;
pub mod dom;
pub mod engine;
pub mod matcher;
pub mod profile;
pub mod scheduler;
pub mod visibility;

// Re-export commonly used types
pub use classify::{Classifier, HideReasons};
pub use config::{BlockList, BlockListError, ConfigError, FilterConfig, FilterSettings, InboundMessage};
pub use dom::{Document, Element, MemoryDocument, MemoryElement};
pub use engine::{FilterEngine, PassReport};
pub use matcher::{normalize_text, CompanyMatcher};
pub use profile::{JobStatus, Site, SiteProfile};
pub use scheduler::{Clock, ManualClock, PassKind, Timing};
pub use visibility::{CardState, UnblockError};
