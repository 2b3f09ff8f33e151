use std::path::PathBuf;

use thiserror::Error;

/// The invariant that failed validation, in the fixed checking order used by
/// [`crate::scene::Scene::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    MeshIndexOutOfRange,
    MaterialIndexOutOfRange,
    TextureIndexOutOfRange,
    BoneNodeUnresolved,
    StreamLengthMismatch,
    FaceIndexOutOfRange,
    DuplicateNode,
    NonMonotonicAnimation,
    CompressedTextureShape,
}

impl std::fmt::Display for Invariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Invariant::MeshIndexOutOfRange => "mesh index out of range",
            Invariant::MaterialIndexOutOfRange => "material index out of range",
            Invariant::TextureIndexOutOfRange => "texture index out of range",
            Invariant::BoneNodeUnresolved => "bone name does not resolve to a node",
            Invariant::StreamLengthMismatch => "parallel vertex stream length mismatch",
            Invariant::FaceIndexOutOfRange => "face index out of range",
            Invariant::DuplicateNode => "node appears more than once in the tree",
            Invariant::NonMonotonicAnimation => "animation channel times are not monotonic",
            Invariant::CompressedTextureShape => "compressed texture missing width/height tag",
        };
        f.write_str(s)
    }
}

/// Top level error type, one variant per taxonomy entry in the external
/// interfaces/error handling design.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no importer or exporter recognised this input")]
    UnknownFormat,

    #[error("format recognised but this variant is unsupported: {0}")]
    UnsupportedVariant(String),

    #[error("malformed input{}: {message}", at_location(location))]
    MalformedInput {
        message: String,
        location: Option<String>,
    },

    #[error("scene invariant violated: {0}")]
    InvariantViolation(Invariant),

    #[error("post-process pass '{pass}' failed: {reason}")]
    PostProcessFailed { pass: String, reason: String },

    #[error("out of memory")]
    OutOfMemory,
}

fn at_location(location: &Option<String>) -> String {
    match location {
        Some(loc) => format!(" at {loc}"),
        None => String::new(),
    }
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput {
            message: message.into(),
            location: None,
        }
    }

    pub fn malformed_at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Error::MalformedInput {
            message: message.into(),
            location: Some(location.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
