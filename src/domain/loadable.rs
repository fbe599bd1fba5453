//! Lifecycle of an asynchronously fetched value.

/// Four-state wrapper observed by the UI while a value is being fetched.
///
/// A request moves `NotRequested -> IsLoading -> Loaded | Failed`. A refresh
/// re-enters `IsLoading` and keeps the previously loaded value in `last` so
/// the UI can keep showing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T, E> {
    /// Nothing has been asked for yet.
    NotRequested,
    /// A request is in flight.
    IsLoading {
        /// Value from the previous successful load, if any.
        last: Option<T>,
    },
    /// The request produced a value.
    Loaded(T),
    /// The request failed.
    Failed(E),
}

impl<T, E> Default for Loadable<T, E> {
    fn default() -> Self {
        Self::NotRequested
    }
}

impl<T, E> Loadable<T, E> {
    /// Returns the available value, including the one kept during a refresh.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) | Self::IsLoading { last: Some(value) } => Some(value),
            _ => None,
        }
    }

    /// Returns the error of a failed request.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Returns true while a request is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::IsLoading { .. })
    }

    /// Returns true once a value has been loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Returns true if the request finished, successfully or not.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed(_))
    }

    /// Transforms the contained value, keeping the state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U, E> {
        match self {
            Self::NotRequested => Loadable::NotRequested,
            Self::IsLoading { last } => Loadable::IsLoading { last: last.map(f) },
            Self::Loaded(value) => Loadable::Loaded(f(value)),
            Self::Failed(error) => Loadable::Failed(error),
        }
    }
}

impl<T: Clone, E> Loadable<T, E> {
    /// Builds the loading state that follows this one.
    #[must_use]
    pub fn refreshing(&self) -> Self {
        Self::IsLoading {
            last: self.value().cloned(),
        }
    }
}

impl<T, E> From<Result<T, E>> for Loadable<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(error) => Self::Failed(error),
        }
    }
}
