//! Cardinality statistics for [Solid](https://solidproject.org/) pods.
//!
//! The offline side scans the documents of every pod of a corpus and publishes a
//! [VoID](https://www.w3.org/TR/void/) statistics document per pod, linked from the pod's profile:
//!
//! ```no_run
//! use podstats::config::GeneratorConfig;
//! use podstats::Generator;
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig::from_file("config.json".as_ref())?;
//! let report = Generator::from_config(&config)?.generate(&config.pods)?;
//! for (pod, error) in &report.failed {
//!     eprintln!("{}: {error}", pod.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The online side, re-exported in [catalog], discovers these documents while a query traverses
//! the pods and answers cardinality estimates from them.

pub mod config;
pub mod error;
mod generator;

pub use generator::{load_static_estimates, GenerationReport, Generator};

pub mod model {
    pub use podstats_model::*;
}

pub mod index {
    pub use podstats_index::*;
}

pub mod catalog {
    pub use podstats_catalog::*;
}
