// src/logs/mod.rs

//! Live execution log state.
//!
//! - [`event`] defines the immutable [`LogEvent`] record.
//! - [`buffer`] is the bounded, arrival-ordered [`LogBuffer`].
//! - [`store`] wraps the buffer and the connection flag into a single-writer
//!   state container ([`ConsoleStore`]) with cheap read-only views
//!   ([`ConsoleReader`]) for UI surfaces.

pub mod buffer;
pub mod event;
pub mod store;

pub use buffer::{LogBuffer, DEFAULT_LOG_CAPACITY};
pub use event::LogEvent;
pub use store::{ConsoleReader, ConsoleStore};
