use podstats_index::error::{DatasetError, IndexError, PublishError, ScanError};
use podstats_model::{IriParseError, RdfParseError};
use std::io;
use std::path::PathBuf;

/// An error raised while loading a configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Could not read the configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON or contains unknown settings.
    #[error("Invalid configuration {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The configured link predicate is not an IRI.
    #[error("Invalid link predicate '{iri}': {source}")]
    InvalidLinkPredicate {
        iri: String,
        #[source]
        source: IriParseError,
    },
    /// A configured discovery predicate is not an IRI.
    #[error("Invalid discovery predicate: {0}")]
    InvalidDiscoveryPredicate(#[source] IriParseError),
}

/// An error raised while generating the statistics of a corpus of pods.
///
/// Errors of a single pod are reported per pod and do not abort the generation of the others.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerateError {
    /// The pods directory could not be listed.
    #[error("Could not list the pods in {}: {source}", path.display())]
    Pods {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The output directory could not be prepared.
    #[error("Could not prepare the output directory {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// An error raised while loading faceted cardinalities.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: RdfParseError,
    },
    /// The file is not serialized in an RDF format supporting named graphs.
    #[error("Unknown RDF dataset serialization for {}", path.display())]
    UnknownFormat { path: PathBuf },
    #[error("Invalid faceted cardinalities in {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: IndexError,
    },
}
