//! Error types for the score view
//!
//! Load and render failures are persistent view states; priming and playback
//! failures reset the player to `Stopped` and are only reported.

use thiserror::Error;

use crate::view::LockedFeature;

/// Top-level error type for score view operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreViewError {
    /// Document fetch or decoding failed
    #[error("Failed to load score: {0}")]
    LoadFailure(#[from] LoadError),

    /// The rendering library rejected the notation
    #[error("Failed to render score: {0}")]
    RenderFailure(#[from] RenderError),

    /// Synthesizer allocation, init or prime failed
    #[error("Failed to prepare playback: {0}")]
    PrimingFailure(String),

    /// Synthesizer start failed or the end-of-playback handler failed
    #[error("Playback failed: {0}")]
    PlaybackFailure(String),

    /// Control is not available in preview access
    #[error("{0} is locked until the score is purchased")]
    FeatureLocked(LockedFeature),

    /// Rejected view configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Notation document loading errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The fetch itself failed (network, HTTP status)
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Response body is not a score record
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Response has no notation content
    #[error("response has no notation content")]
    MissingContent,
}

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// Target element is not in the page
    #[error("render surface '{0}' not found")]
    MissingSurface(String),

    /// The rendering library threw or returned nothing usable
    #[error("renderer error: {0}")]
    Library(String),

    /// The library produced no tune for the text
    #[error("no tune was rendered")]
    NothingRendered,
}

pub type Result<T> = std::result::Result<T, ScoreViewError>;
