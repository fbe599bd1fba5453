//! Image loading error types.

use thiserror::Error;

/// Coarse classification of an image failure, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageErrorKind {
    /// The image is not cached. Recovered locally by fetching it.
    NotFound,
    /// The network layer failed.
    Transport,
    /// A response could not be parsed or decoded.
    UnexpectedResponse,
}

/// Precise cause of an [`ImageError::UnexpectedResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ResponseIssue {
    #[error("conversion form not found in response")]
    MissingConversionForm,

    #[error("conversion token not found in response")]
    MissingToken,

    #[error("invalid conversion action URL: {0}")]
    InvalidActionUrl(String),

    #[error("converted image URL not found in response")]
    MissingDownloadUrl,

    #[error("invalid converted image URL: {0}")]
    InvalidDownloadUrl(String),

    #[error("image data could not be decoded: {0}")]
    Undecodable(String),
}

/// Image loading error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ImageError {
    #[error("image not cached: {key}")]
    NotFound { key: String },

    #[error("network error: {message}")]
    Transport { message: String },

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    #[error("unexpected response: {0}")]
    UnexpectedResponse(#[from] ResponseIssue),
}

impl ImageError {
    /// Creates cache miss error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the user-facing classification.
    #[must_use]
    pub const fn kind(&self) -> ImageErrorKind {
        match self {
            Self::NotFound { .. } => ImageErrorKind::NotFound,
            Self::Transport { .. } | Self::Http { .. } => ImageErrorKind::Transport,
            Self::UnexpectedResponse(_) => ImageErrorKind::UnexpectedResponse,
        }
    }

    /// Returns the parse or decode cause, if any.
    #[must_use]
    pub const fn response_issue(&self) -> Option<&ResponseIssue> {
        match self {
            Self::UnexpectedResponse(issue) => Some(issue),
            _ => None,
        }
    }

    /// Returns whether the error is a cache miss.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ImageError::not_found("k").kind(), ImageErrorKind::NotFound);
        assert_eq!(
            ImageError::Http {
                status: 404,
                url: "https://x".to_string()
            }
            .kind(),
            ImageErrorKind::Transport
        );
        let parse: ImageError = ResponseIssue::MissingToken.into();
        let decode: ImageError = ResponseIssue::Undecodable("eof".to_string()).into();
        assert_eq!(parse.kind(), decode.kind());
        assert_ne!(parse, decode);
    }

    #[test]
    fn test_display() {
        let error = ImageError::from(ResponseIssue::MissingConversionForm);
        assert_eq!(
            error.to_string(),
            "unexpected response: conversion form not found in response"
        );
    }
}
