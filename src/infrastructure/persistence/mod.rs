//! Local database access.

mod gate;
mod store;
mod version;

pub use gate::{Admission, ReadinessGate};
pub use store::SqliteStore;
pub use version::StoreVersion;
