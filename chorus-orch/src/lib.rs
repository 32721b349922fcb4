#![deny(missing_docs)]
//! Fan-out orchestration for chorus.
//!
//! A [`Session`] holds one append-only history per selected model. Each user
//! turn is appended to every history in one synchronous step, then every
//! model streams its reply concurrently through its own [`Aggregator`],
//! which strips `<think>` spans and rate limits display updates with a
//! [`Throttle`]. A [`StatusMachine`] per model tracks
//! `idle -> responding -> ready | error`.
//!
//! [`Installer`] pulls models with progress reporting. Everything observable
//! is reported as [`chorus_types::ChatEvent`]s to a
//! [`chorus_types::ChatObserver`].

pub mod aggregator;
pub mod installer;
pub mod observer;
pub mod session;
pub mod status;
pub mod think;
pub mod throttle;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregator::{Aggregator, EMPTY_REPLY, Finished};
pub use installer::Installer;
pub use observer::{ChannelObserver, CompositeObserver, TracingObserver};
pub use session::{Session, TurnOutcome};
pub use status::{StatusMachine, awaiting_reply};
pub use think::strip_thinking;
pub use throttle::{DEFAULT_THROTTLE_INTERVAL, Throttle};
