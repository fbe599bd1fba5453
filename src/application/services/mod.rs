//! Reactive plumbing shared by use cases.

mod binding;
mod cancellation;
mod memory_pressure;

pub use binding::Binding;
pub use cancellation::CancelHandle;
pub use memory_pressure::MemoryPressure;
