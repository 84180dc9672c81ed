use podstats_model::{IriParseError, RdfParseError};
use std::io;
use std::path::PathBuf;

/// An error raised while rebuilding an [`Index`](crate::Index) from faceted statements.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("{0} is not a cardinality facet")]
    UnknownFacet(String),
    #[error("Expected owl:cardinality statements, found predicate <{0}>")]
    UnexpectedPredicate(String),
    #[error("{0} is not a positive integer cardinality")]
    InvalidCount(String),
    #[error("{0} cannot be counted in this facet")]
    InvalidTerm(String),
}

/// An error raised while scanning the corpus of a dataset.
///
/// Any of these errors aborts the scan of the dataset it occurred in.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScanError {
    /// The file or directory could not be read.
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file is not valid RDF.
    #[error("Could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: RdfParseError,
    },
    /// The extension of the file does not belong to a known RDF serialization.
    #[error("Unknown file type: {}", path.display())]
    UnknownFileType { path: PathBuf },
}

impl From<ScanError> for io::Error {
    #[inline]
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Io { source, .. } => source,
            ScanError::Parse { source, .. } => source.into(),
            ScanError::UnknownFileType { .. } => {
                Self::new(io::ErrorKind::InvalidInput, error.to_string())
            }
        }
    }
}

/// An error raised while deriving the layout of a dataset from its corpus root.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The name of the dataset can not be derived from the corpus root.
    #[error("Could not derive a dataset name from {}", path.display())]
    NoName { path: PathBuf },
    /// An IRI derived from the dataset template is invalid.
    #[error("Invalid IRI '{iri}': {source}")]
    InvalidIri {
        iri: String,
        #[source]
        source: IriParseError,
    },
}

/// An error raised while publishing a statistics document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PublishError {
    /// The statistics document could not be written.
    #[error("Could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The output location has no extension naming an RDF serialization.
    #[error("Unknown RDF serialization for {}", path.display())]
    UnknownFormat { path: PathBuf },
    /// The statements can not be expressed in the serialization of the output location.
    #[error("Could not serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A document that has to be rewritten is not valid RDF.
    #[error("Could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: RdfParseError,
    },
    /// The statistics document has been written, but linking it from the profile failed.
    ///
    /// The document is valid and can be linked by retrying
    /// [`Publisher::link_profile`](crate::Publisher::link_profile).
    #[error("Wrote {} but could not link it from the profile: {source}", statistics.display())]
    Link {
        statistics: PathBuf,
        #[source]
        source: Box<PublishError>,
    },
}

impl PublishError {
    /// Returns `true` if the statistics document has been written and only the profile link is
    /// missing.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, PublishError::Link { .. })
    }
}
