//! Shared types for the Logfolio client crates.
//!
//! Holds the pieces every orchestration component needs but none of them
//! owns: the error classification surfaced to users, the optional notifier
//! capability used for transient messages, and the clock abstraction that
//! makes TTL logic testable.

pub mod clock;
pub mod kind;
pub mod notice;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use kind::ErrorKind;
pub use notice::{Notice, NoticeLevel, Notifier, SharedNotifier, TracingNotifier, notify};
