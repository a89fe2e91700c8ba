//! Bounded value history for attributes and operation results.
//!
//! Tracking is opt-in per key: a [`HistoryKey`] is configured with a
//! capacity, after which every successful request addressing that key attaches
//! the previously recorded values to its response and records its own value.
//! Pattern keys configure capacity for every exact key they cover; matching
//! entries are created on first use.

mod entry;
mod key;
mod store;

pub use self::entry::HistoryValue;
pub use self::key::{HistoryKey, MemberKind};
pub use self::store::HistoryStore;

/// Tracing target for history bookkeeping.
pub(crate) const HISTORY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::history");
