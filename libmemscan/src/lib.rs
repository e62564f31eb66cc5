//! Core of a live-process memory scanner: process enumeration and
//! attachment, region discovery, byte-pattern search across committed
//! regions, and the stateful [`scanner::Scan`] engine that narrows a
//! candidate set across successive observations of a live target.
//!
//! Platform-specific code lives entirely in [`linux`]/[`windows`]; every
//! other module is portable and talks to the target only through
//! [`process::MemoryAccessor`].

// OS-specific modules: the only part of this crate that's hard to test.
// Each gates its own content with an inner `#![cfg(..)]`.
pub(crate) mod linux;
pub(crate) mod windows;

pub mod concurrency;
pub mod discovery;
pub mod error;
pub mod hex;
pub mod pattern;
pub mod process;
pub mod scanner;
pub mod value;

pub use concurrency::{AsyncTaskRunner, StopSource, StopToken, SyncTaskRunner, TaskRunner};
pub use discovery::{enumerate_processes, find_pid_by_name};
pub use error::{OpenError, ReadError, ScanError, WriteError};
pub use hex::{HexParseError, parse_hex_pattern};
pub use pattern::search_offsets;
pub use process::{MemoryAccessor, Page, PageFilter, Pid, Process, ProcessDescriptor, Protection, State};
pub use scanner::{MatchRecord, Scan};
pub use value::{FromLeBytes, Value, ValueKind, compare};
