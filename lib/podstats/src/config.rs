use crate::error::ConfigError;
use podstats_catalog::{
    Catalog, CatalogConfig, DereferencingStatisticsSource, Dereferencer, DiscoveryConfig,
    HttpDereferencer, LocalDereferencer,
};
use podstats_index::{DatasetTemplate, Publisher, PublisherOptions, Scanner, UnknownFilePolicy};
use podstats_model::vocab::rdfs;
use podstats_model::NamedNode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings of the statistics generator, usually read from a JSON file.
///
/// ```
/// use podstats::config::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_json::from_str(r#"{ "pods": "data/pods" }"#)?;
/// assert_eq!(config.output, std::path::Path::new("profile/cardinalities.nq"));
/// # Ok::<_, serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// The directory containing one directory per pod.
    pub pods: PathBuf,
    /// The location of the statistics document, relative to a pod.
    pub output: PathBuf,
    /// The location of the profile document, relative to a pod.
    pub profile: PathBuf,
    pub profile_fragment: String,
    /// The URL of a pod, `{name}` is replaced with the name of the pod directory.
    pub dataset_url_template: String,
    pub link_predicate: String,
    pub strip_link_extension: bool,
    pub unknown_files: UnknownFiles,
    /// File names that are never counted, in addition to the statistics document.
    pub excluded_files: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let template = DatasetTemplate::default();
        Self {
            pods: PathBuf::from("pods"),
            output: template.statistics,
            profile: template.profile,
            profile_fragment: template.profile_fragment,
            dataset_url_template: template.url_template,
            link_predicate: rdfs::SEE_ALSO.as_str().to_owned(),
            strip_link_extension: template.strip_link_extension,
            unknown_files: UnknownFiles::default(),
            excluded_files: Vec::new(),
        }
    }
}

/// How files that are not RDF documents are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFiles {
    #[default]
    Fail,
    Skip,
}

impl From<UnknownFiles> for UnknownFilePolicy {
    fn from(value: UnknownFiles) -> Self {
        match value {
            UnknownFiles::Fail => Self::Fail,
            UnknownFiles::Skip => Self::Skip,
        }
    }
}

impl GeneratorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn dataset_template(&self) -> DatasetTemplate {
        DatasetTemplate {
            url_template: self.dataset_url_template.clone(),
            statistics: self.output.clone(),
            profile: self.profile.clone(),
            profile_fragment: self.profile_fragment.clone(),
            strip_link_extension: self.strip_link_extension,
        }
    }

    pub fn scanner(&self) -> Scanner {
        let excluded = self
            .dataset_template()
            .artifact_names()
            .into_iter()
            .chain(self.excluded_files.iter().cloned());
        Scanner::new()
            .with_unknown_file_policy(self.unknown_files.into())
            .with_excluded_file_names(excluded)
    }

    pub fn publisher(&self) -> Result<Publisher, ConfigError> {
        let link_predicate = NamedNode::new(self.link_predicate.as_str()).map_err(|source| {
            ConfigError::InvalidLinkPredicate {
                iri: self.link_predicate.clone(),
                source,
            }
        })?;
        Ok(Publisher::new(PublisherOptions { link_predicate }))
    }
}

/// Settings of the cardinality catalog of a query session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimateConfig {
    pub catalog: CatalogConfig,
    /// The predicates advertising statistics documents. Links added by the generator
    /// (`rdfs:seeAlso`) are always followed.
    pub discovery: DiscoveryConfig,
    /// Serves the documents below a base URL from a local directory instead of over HTTP.
    pub mirror: Option<MirrorConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    pub base: String,
    pub root: PathBuf,
}

impl EstimateConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn dereferencer(&self) -> Arc<dyn Dereferencer> {
        match &self.mirror {
            Some(mirror) => Arc::new(LocalDereferencer::new(
                mirror.base.clone(),
                mirror.root.clone(),
            )),
            None => Arc::new(HttpDereferencer::default()),
        }
    }

    pub fn statistics_source(&self) -> Result<DereferencingStatisticsSource, ConfigError> {
        let links = self
            .discovery
            .link_extractor()
            .map_err(ConfigError::InvalidDiscoveryPredicate)?
            .with_predicate(rdfs::SEE_ALSO.into_owned());
        Ok(DereferencingStatisticsSource::new(self.dereferencer()).with_link_extractor(links))
    }

    /// Creates an empty catalog for a new query session.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        Ok(Catalog::with_config(
            Arc::new(self.statistics_source()?),
            self.catalog,
        ))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
