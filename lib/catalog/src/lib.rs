//! Online side of the pod statistics: discovering the statistics documents of pods, caching their
//! predicate cardinalities per dataset and answering cardinality estimates for triple patterns.
//!
//! A [Catalog] is created once per query session. It asks a [StatisticsSource] for the statistics
//! of the datasets that are queried and answers lookups from the retrieved statistics:
//!
//! ```no_run
//! use podstats_catalog::{Catalog, DereferencingStatisticsSource, HttpDereferencer};
//! use podstats_model::NamedNodeRef;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DereferencingStatisticsSource::new(Arc::new(HttpDereferencer::default()));
//! let catalog = Catalog::new(Arc::new(source));
//! let knows = NamedNodeRef::new("http://xmlns.com/foaf/0.1/knows")?;
//! let cardinality = catalog
//!     .lookup("http://localhost:3000/pods/alice/profile/card", knows)
//!     .await?;
//! println!("{cardinality}");
//! # Ok(())
//! # }
//! ```

mod catalog;
mod dereference;
pub mod error;
mod estimate;
mod links;
mod source;

pub use catalog::{Cardinality, Catalog, CatalogConfig};
pub use dereference::{Dereferencer, Document, HttpDereferencer, LocalDereferencer};
pub use estimate::{
    CardinalityEstimate, EstimateKind, EstimateProvider, EstimateRequest, ExtractorChain,
    MetadataExtractor, OperationMetadata, StaticEstimateProvider,
};
pub use links::{DiscoveryConfig, LinkExtractor, Links};
pub use source::{
    partition_rows, DereferencingStatisticsSource, PartitionRow, Statistics, StatisticsSource,
};
