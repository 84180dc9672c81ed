use podstats_model::RdfParseError;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// An error raised while dereferencing a document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DereferenceError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Could not parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: RdfParseError,
    },
    /// Neither the media type nor the extension of the document name a known RDF serialization.
    #[error("{url} is not served in a known RDF serialization")]
    UnsupportedFormat { url: String },
    #[error("{url} does not exist")]
    NotFound { url: String },
    /// The URL does not belong to the mirrored pods.
    #[error("{url} is not below the mirrored base URL {base}")]
    OutsideMirror { url: String, base: String },
    #[error("{0} is not a valid IRI")]
    InvalidUrl(String),
}

impl DereferenceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// An error raised while populating a [`Catalog`](crate::Catalog).
///
/// The error of a population is shared with every lookup waiting for it, hence it is cheap to
/// clone.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// A statistics document could not be retrieved.
    #[error(transparent)]
    Dereference(Arc<DereferenceError>),
    /// A statistics document does not have the expected shape.
    #[error("Invalid statistics in {document}: {message}")]
    Query { document: String, message: String },
    #[error("Population for {hint} did not finish within {timeout:?}")]
    Timeout { hint: String, timeout: Duration },
    /// The population task ended without a result.
    #[error("Population for {hint} was aborted: {message}")]
    Aborted { hint: String, message: String },
}

impl From<DereferenceError> for CatalogError {
    fn from(error: DereferenceError) -> Self {
        Self::Dereference(Arc::new(error))
    }
}

/// An error raised while estimating the cardinality of a triple pattern.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EstimateError {
    /// The pattern can not be estimated, e.g. because its predicate is a variable.
    #[error("Unsupported pattern {pattern}: {reason}")]
    UnsupportedPattern { pattern: String, reason: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// No extractor of a chain accepted the request.
    #[error("No extractor can handle {pattern}: {}", reasons.join("; "))]
    NoExtractor {
        pattern: String,
        reasons: Vec<String>,
    },
}
