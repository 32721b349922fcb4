#![deny(missing_docs)]
//! Core types for chorus, for talking to several local models at once.
//!
//! This crate holds the data model shared by every chorus crate: chat
//! messages, per-model status, stream chunks, install progress, the error
//! taxonomy, and the traits at the seams ([`ChatBackend`], [`ChatObserver`],
//! [`RecordStore`]). It has no I/O of its own.

pub mod error;
pub mod event;
pub mod model_name;
pub mod traits;
pub mod types;

pub use error::*;
pub use event::*;
pub use model_name::{base_name, check_model_name, is_well_formed};
pub use traits::*;
pub use types::*;
