//! Failure taxonomy of the preview pipeline.
//!
//! `Network`, `Decode` and `UnknownFormat` are recovered inside the widget by
//! advancing its fallback chain. Only `FallbackExhausted` is ever shown to the
//! user, and only as a placeholder message.

use thiserror::Error;

use crate::resources::{format::FormatTag, reference::AssetReference};

#[derive(Clone, Debug, PartialEq, Error)]
pub enum LoadError {
    /// The fetch was rejected or answered with a non-2xx status.
    #[error("could not fetch {reference}: {reason}")]
    Network {
        reference: AssetReference,
        reason: String,
    },
    /// Bytes arrived but do not parse as the attempted format.
    #[error("{reference} is not a valid {format} asset: {reason}")]
    Decode {
        reference: AssetReference,
        format: FormatTag,
        reason: String,
    },
    #[error("{reference} is neither a glTF scene nor an OBJ mesh")]
    UnknownFormat { reference: AssetReference },
    #[error("{requested} could not be loaded and no working fallback is left")]
    FallbackExhausted {
        requested: AssetReference,
        fallback: Option<AssetReference>,
    },
}

impl LoadError {
    pub fn network(reference: &AssetReference, reason: impl ToString) -> Self {
        LoadError::Network {
            reference: reference.clone(),
            reason: reason.to_string(),
        }
    }

    /// The reference the failure is about.
    pub fn reference(&self) -> &AssetReference {
        match self {
            LoadError::Network { reference, .. }
            | LoadError::Decode { reference, .. }
            | LoadError::UnknownFormat { reference } => reference,
            LoadError::FallbackExhausted { requested, .. } => requested,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadError::FallbackExhausted { .. })
    }
}
