use crate::error::DatasetError;
use podstats_model::NamedNode;
use std::path::{Component, Path, PathBuf};

/// Describes where the documents of a pod live and under which IRIs they are published.
///
/// The defaults follow the layout of a Solid pod served at `http://localhost:3000/pods/{name}`:
/// the profile is `profile/card.nq` (identified by `profile/card#me`) and the statistics document
/// is written next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetTemplate {
    /// The URL of a dataset, `{name}` is replaced with the name of the corpus root directory.
    pub url_template: String,
    /// The location of the statistics document, relative to the corpus root.
    pub statistics: PathBuf,
    /// The location of the profile document, relative to the corpus root.
    pub profile: PathBuf,
    /// The fragment identifying the profile within the profile document.
    pub profile_fragment: String,
    /// Whether links to the statistics document omit its file extension.
    ///
    /// Pod servers negotiate the serialization of a document, hence the document is usually
    /// referenced without its extension.
    pub strip_link_extension: bool,
}

impl Default for DatasetTemplate {
    fn default() -> Self {
        Self {
            url_template: "http://localhost:3000/pods/{name}".to_owned(),
            statistics: PathBuf::from("profile/cardinalities.nq"),
            profile: PathBuf::from("profile/card.nq"),
            profile_fragment: "me".to_owned(),
            strip_link_extension: true,
        }
    }
}

impl DatasetTemplate {
    /// Derives the [Dataset] whose corpus is located at `root`.
    pub fn dataset(&self, root: impl Into<PathBuf>) -> Result<Dataset, DatasetError> {
        let root = root.into();
        let name = root
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DatasetError::NoName { path: root.clone() })?
            .to_owned();
        let url = self
            .url_template
            .replace("{name}", &name)
            .trim_end_matches('/')
            .to_owned();

        let dataset_iri = parse_iri(url.clone())?;
        let profile_iri = parse_iri(format!(
            "{url}/{}#{}",
            relative_iri(&self.profile, true),
            self.profile_fragment
        ))?;
        let statistics_iri = parse_iri(format!(
            "{url}/{}",
            relative_iri(&self.statistics, self.strip_link_extension)
        ))?;

        Ok(Dataset {
            statistics_path: root.join(&self.statistics),
            profile_path: root.join(&self.profile),
            name,
            root,
            dataset_iri,
            profile_iri,
            statistics_iri,
        })
    }

    /// The file names that are never counted, as they are produced by publishing.
    pub fn artifact_names(&self) -> Vec<String> {
        self.statistics
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .into_iter()
            .collect()
    }
}

/// The location and identity of a single pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    root: PathBuf,
    statistics_path: PathBuf,
    profile_path: PathBuf,
    dataset_iri: NamedNode,
    profile_iri: NamedNode,
    statistics_iri: NamedNode,
}

impl Dataset {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The corpus root of the dataset.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The canonical URL of the dataset.
    pub fn url(&self) -> &str {
        self.dataset_iri.as_str()
    }

    pub fn iri(&self) -> &NamedNode {
        &self.dataset_iri
    }

    pub fn statistics_path(&self) -> &Path {
        &self.statistics_path
    }

    pub fn statistics_iri(&self) -> &NamedNode {
        &self.statistics_iri
    }

    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    pub fn profile_iri(&self) -> &NamedNode {
        &self.profile_iri
    }

    /// The IRI of the profile document itself, used to resolve relative IRIs within it.
    pub fn profile_document_iri(&self) -> &str {
        self.profile_iri
            .as_str()
            .split_once('#')
            .map_or(self.profile_iri.as_str(), |(document, _)| document)
    }
}

fn parse_iri(iri: String) -> Result<NamedNode, DatasetError> {
    NamedNode::new(iri.clone()).map_err(|source| DatasetError::InvalidIri { iri, source })
}

fn relative_iri(path: &Path, strip_extension: bool) -> String {
    let path = if strip_extension {
        path.with_extension("")
    } else {
        path.to_path_buf()
    };
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
