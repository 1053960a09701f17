//! Orrery reactive state shared between the sync layer and the UI layer.
//!
//! - [`PlanetList`]: the current snapshot of active planets, with callback
//!   subscriptions and a consumer loop that applies snapshots from a stream.
//! - [`ErrorReporter`]: holds the most recent user-facing error message.

pub mod list;
pub mod reporter;

pub use list::{PlanetList, Snapshot, Subscription};
pub use reporter::{ErrorMessage, ErrorReporter};
