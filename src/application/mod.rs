//! Application layer with use cases and reactive plumbing.

/// Bindings, cancellation and host signals.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{Binding, CancelHandle, MemoryPressure};
pub use use_cases::{
    CountriesDbRepository, ImagesInteractor, RealImagesInteractor, StubImagesInteractor,
};
