use alloc::string::String;

use thiserror::Error;

use crate::Tag;

// -----------------------------------------------------------------------------
// Error

/// Resolution failure reported to the deserialization pipeline.
///
/// "Not configured" and "fallback" are not errors, see
/// [`Resolution`](crate::Resolution).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DowncastError {
    #[error("missing discriminator field `{field}` for `{supertype}` and no default is registered")]
    MissingDiscriminator {
        supertype: &'static str,
        field: String,
    },

    #[error("unrecognized discriminator value {tag} for `{supertype}`")]
    UnrecognizedDiscriminator { supertype: &'static str, tag: Tag },

    #[error("discriminator field `{field}` of `{supertype}` holds a {kind}, expected null, bool, integer or string")]
    UnsupportedDiscriminator {
        supertype: &'static str,
        field: String,
        kind: &'static str,
    },
}

impl DowncastError {
    /// Name of the supertype being resolved.
    pub const fn supertype(&self) -> &'static str {
        match self {
            Self::MissingDiscriminator { supertype, .. }
            | Self::UnrecognizedDiscriminator { supertype, .. }
            | Self::UnsupportedDiscriminator { supertype, .. } => supertype,
        }
    }
}
