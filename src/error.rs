use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error taxonomy for the prediction pipeline.
///
/// Load-time contract violations, scoring-time unavailability, per-item
/// input problems and training degeneracies are kept as distinct variants so
/// callers can tell "not ready" from "bad input" from "broken artifact".
/// None of these are ever downgraded to a default probability.
#[derive(Debug)]
pub enum PredictError {
    /// No model has been loaded into the service yet.
    ModelUnavailable,
    /// Persisted feature list differs from the compiled schema.
    SchemaMismatch(String),
    /// One of the two artifact files is absent.
    ArtifactMissing(PathBuf),
    /// An artifact file exists but could not be deserialized.
    ArtifactMalformed { path: PathBuf, detail: String },
    /// Metadata parsed but its feature list is unusable.
    MetadataInvalid(String),
    /// Model blob and metadata sidecar disagree on the version string.
    VersionSkew { model: String, metadata: String },
    /// A single scoring input is unusable (non-finite value, wrong length).
    InvalidInput(String),
    /// Too few time-ordered examples for the requested fold count.
    InsufficientData { rows: usize, required: usize },
    /// All labels identical, globally or within a fold's training slice.
    DegenerateLabels(String),
    /// Filesystem failure while reading or writing an artifact.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::ModelUnavailable => {
                write!(f, "no model loaded; train and load a model first")
            }
            PredictError::SchemaMismatch(detail) => {
                write!(f, "persisted schema does not match compiled schema: {}", detail)
            }
            PredictError::ArtifactMissing(path) => {
                write!(f, "artifact file not found: {}", path.display())
            }
            PredictError::ArtifactMalformed { path, detail } => {
                write!(f, "artifact {} is malformed: {}", path.display(), detail)
            }
            PredictError::MetadataInvalid(detail) => {
                write!(f, "model metadata is invalid: {}", detail)
            }
            PredictError::VersionSkew { model, metadata } => write!(
                f,
                "model blob version '{}' does not match metadata version '{}'",
                model, metadata
            ),
            PredictError::InvalidInput(detail) => write!(f, "invalid input: {}", detail),
            PredictError::InsufficientData { rows, required } => write!(
                f,
                "insufficient training data: {} rows, need at least {}",
                rows, required
            ),
            PredictError::DegenerateLabels(detail) => {
                write!(f, "degenerate labels: {}", detail)
            }
            PredictError::Io { path, source } => {
                write!(f, "io error at {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for PredictError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PredictError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
