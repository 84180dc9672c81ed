use crate::config::GeneratorConfig;
use crate::error::{ConfigError, GenerateError, LoadError};
use podstats_catalog::StaticEstimateProvider;
use podstats_index::{write_faceted, DatasetTemplate, Index, PublishReport, Publisher, Scanner};
use podstats_model::{rdf_format_for_path, RdfParser};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// The outcome of a batch over all pods of a corpus.
#[derive(Debug)]
pub struct GenerationReport<T> {
    /// The results of the pods that succeeded, in pod name order.
    pub succeeded: Vec<T>,
    /// The pods that failed, in pod name order.
    pub failed: Vec<(PathBuf, GenerateError)>,
}

impl<T> GenerationReport<T> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn collect(results: Vec<(PathBuf, Result<T, GenerateError>)>) -> Self {
        let mut report = Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for (pod, result) in results {
            match result {
                Ok(value) => report.succeeded.push(value),
                Err(error) => report.failed.push((pod, error)),
            }
        }
        report
    }
}

/// Scans and publishes the statistics of every pod of a corpus.
///
/// Every directory directly below the pods directory is a pod. Pods are processed in parallel and
/// independently: a pod that fails is reported and does not affect the others.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    template: DatasetTemplate,
    scanner: Scanner,
    publisher: Publisher,
}

impl Generator {
    pub fn new(template: DatasetTemplate, scanner: Scanner, publisher: Publisher) -> Self {
        Self {
            template,
            scanner,
            publisher,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.dataset_template(),
            config.scanner(),
            config.publisher()?,
        ))
    }

    /// The pod directories below `pods`, sorted by name.
    pub fn pods(&self, pods: &Path) -> Result<Vec<PathBuf>, GenerateError> {
        let list_error = |source| GenerateError::Pods {
            path: pods.to_path_buf(),
            source,
        };
        let mut directories = Vec::new();
        for entry in fs::read_dir(pods).map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            if entry.file_type().map_err(list_error)?.is_dir() {
                directories.push(entry.path());
            }
        }
        directories.sort();
        Ok(directories)
    }

    /// Publishes the statistics of every pod below `pods`.
    pub fn generate(&self, pods: &Path) -> Result<GenerationReport<PublishReport>, GenerateError> {
        info!(pods = %pods.display(), "Generating statistics");
        let report = self.for_each_pod(pods, |pod| self.generate_pod(pod))?;
        info!(
            published = report.succeeded.len(),
            failed = report.failed.len(),
            "Finished generating statistics"
        );
        Ok(report)
    }

    /// Scans the pod at `pod` and publishes its statistics.
    pub fn generate_pod(&self, pod: &Path) -> Result<PublishReport, GenerateError> {
        let dataset = self.template.dataset(pod)?;
        let index = self.scanner.scan_dataset(&dataset)?;
        let report = self.publisher.publish(&index, &dataset)?;
        info!(
            dataset = dataset.url(),
            triples = report.triples,
            properties = report.properties,
            "Published statistics"
        );
        Ok(report)
    }

    /// Writes the faceted cardinalities of every pod below `pods` to `{output}/{pod}.nq`.
    ///
    /// The output directory is emptied first.
    pub fn count(
        &self,
        pods: &Path,
        output: &Path,
    ) -> Result<GenerationReport<PathBuf>, GenerateError> {
        let output_error = |source| GenerateError::Output {
            path: output.to_path_buf(),
            source,
        };
        if output.exists() {
            info!(output = %output.display(), "Deleting previous cardinalities");
            fs::remove_dir_all(output).map_err(output_error)?;
        }
        fs::create_dir_all(output).map_err(output_error)?;

        let report = self.for_each_pod(pods, |pod| {
            let dataset = self.template.dataset(pod)?;
            let index = self.scanner.scan_dataset(&dataset)?;
            let path = output.join(format!("{}.nq", dataset.name()));
            write_faceted(&index, &path)?;
            info!(dataset = dataset.url(), path = %path.display(), "Wrote cardinalities");
            Ok(path)
        })?;
        Ok(report)
    }

    fn for_each_pod<T: Send>(
        &self,
        pods: &Path,
        process: impl Fn(&Path) -> Result<T, GenerateError> + Sync,
    ) -> Result<GenerationReport<T>, GenerateError> {
        let results = self
            .pods(pods)?
            .into_par_iter()
            .map(|pod| {
                let result = process(&pod);
                if let Err(error) = &result {
                    error!(pod = %pod.display(), %error, "Failed to process pod");
                }
                (pod, result)
            })
            .collect();
        Ok(GenerationReport::collect(results))
    }
}

/// Loads the predicate cardinalities of faceted cardinality files into a
/// [StaticEstimateProvider].
///
/// `path` is either a single file or a directory of files as written by [Generator::count], in
/// which case the cardinalities of all files are summed.
pub fn load_static_estimates(path: &Path) -> Result<StaticEstimateProvider, LoadError> {
    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let files = if path.is_dir() {
        let mut files = fs::read_dir(path)
            .map_err(io_error)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_error)?;
        files.retain(|file| file.is_file());
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut index = Index::default();
    for file in &files {
        index.merge(load_faceted(file)?);
    }
    info!(
        path = %path.display(),
        files = files.len(),
        predicates = index.predicates().len(),
        "Loaded static estimates"
    );
    Ok(StaticEstimateProvider::new(
        index
            .predicates()
            .iter()
            .map(|(predicate, count)| (predicate.clone(), *count)),
    ))
}

fn load_faceted(path: &Path) -> Result<Index, LoadError> {
    let format = rdf_format_for_path(path)
        .filter(|format| format.supports_datasets())
        .ok_or_else(|| LoadError::UnknownFormat {
            path: path.to_path_buf(),
        })?;
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let quads = RdfParser::from_format(format)
        .for_reader(BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Index::from_faceted_statements(quads).map_err(|source| LoadError::Index {
        path: path.to_path_buf(),
        source,
    })
}
