use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "podstats")]
/// Podstats command line tool to generate pod statistics and query cardinality estimates
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan every pod and publish its statistics document, linked from the pod profile
    Generate {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Write the faceted cardinalities of every pod to `{output}/{pod}.nq`
    Count {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Directory to write the cardinalities to
        ///
        /// The directory is emptied first.
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: PathBuf,
    },
    /// Estimate the number of statements with a predicate in the dataset of a source
    Estimate {
        /// URL of the queried source
        #[arg(value_hint = ValueHint::Url)]
        source: String,
        /// IRI of the predicate
        #[arg(value_hint = ValueHint::Url)]
        predicate: String,
        /// JSON file configuring the catalog and the discovery of statistics
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Base URL of the pods served from the --mirror directory instead of over HTTP
        #[arg(long, requires = "mirror", value_hint = ValueHint::Url)]
        base: Option<String>,
        /// Local directory mirroring the pods below --base
        #[arg(long, requires = "base", value_hint = ValueHint::DirPath)]
        mirror: Option<PathBuf>,
        /// Seconds after which the retrieval of statistics is given up
        #[arg(long)]
        timeout: Option<u64>,
        /// Answer from faceted cardinalities written by `count` instead of discovering statistics
        ///
        /// Either a single file or an output directory of `count`.
        #[arg(
            long = "static",
            conflicts_with_all = ["config", "base", "mirror", "timeout"],
            value_hint = ValueHint::AnyPath
        )]
        static_estimates: Option<PathBuf>,
    },
}

/// Selects the pods and how they are scanned.
#[derive(clap::Args)]
pub struct CorpusArgs {
    /// JSON file configuring the generator
    ///
    /// The other options override the settings of the file.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Directory containing one directory per pod
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub pods: Option<PathBuf>,
    /// URL of a pod, `{name}` is replaced with the name of the pod directory
    #[arg(long, value_hint = ValueHint::Url)]
    pub url_template: Option<String>,
    /// Ignore files that are not RDF documents instead of failing their pod
    #[arg(long)]
    pub skip_unknown_files: bool,
}
