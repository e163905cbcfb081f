//! Error types for Inset operations.
//!
//! This module provides the main error type [`InsetError`] which wraps the
//! failures that can occur while configuring, building or mutating a
//! composite projection. Hot-path calls (`project`, `stream`, `invert`)
//! never produce errors; they report misses with `Option`.

use std::io;

use thiserror::Error;

use inset_core::{identifier::Id, projection::ProjectionError};

/// The main error type for Inset operations.
#[derive(Debug, Error)]
pub enum InsetError {
    #[error("composite projection needs at least one entry")]
    EmptyComposite,

    #[error("duplicate entry id `{0}`")]
    DuplicateEntry(Id),

    #[error("ambiguous composite configuration: {0}")]
    AmbiguousConfiguration(String),

    #[error("unknown territory `{0}`")]
    UnknownTerritory(Id),

    #[error("unknown projection family `{0}`")]
    UnknownFamily(String),

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<inset_core::projection::UnknownFamily> for InsetError {
    fn from(error: inset_core::projection::UnknownFamily) -> Self {
        Self::UnknownFamily(error.0)
    }
}

impl From<toml::de::Error> for InsetError {
    fn from(error: toml::de::Error) -> Self {
        Self::Config(error.to_string())
    }
}

impl From<toml::ser::Error> for InsetError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Config(error.to_string())
    }
}
