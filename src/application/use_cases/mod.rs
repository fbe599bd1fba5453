//! Use case implementations.

mod countries_repository;
mod images_interactor;

pub use countries_repository::CountriesDbRepository;
pub use images_interactor::{
    DEFAULT_TARGET_WIDTH, ImagesInteractor, RealImagesInteractor, StubImagesInteractor,
};
