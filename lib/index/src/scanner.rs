use crate::dataset::{Dataset, DatasetTemplate};
use crate::error::ScanError;
use crate::index::Index;
use podstats_model::{
    rdf_format_for_path, BlankNode, GraphName, Quad, RdfFormat, RdfParser, Subject, Term,
};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do with files whose extension does not belong to a known RDF serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFilePolicy {
    /// Abort the scan with [ScanError::UnknownFileType].
    #[default]
    Fail,
    /// Ignore the file.
    Skip,
}

/// Builds the [Index] of a corpus by parsing every RDF document below a root directory.
///
/// Sibling entries of a directory are scanned in parallel and their indexes are merged once all of
/// them are done. Statistics artifacts are recognized by their file name and are never counted.
///
/// Blank nodes are relabelled per document in order of appearance, hence blank nodes of different
/// documents never collide and scanning the same corpus twice yields equal indexes.
#[derive(Debug, Clone)]
pub struct Scanner {
    unknown_files: UnknownFilePolicy,
    excluded_file_names: FxHashSet<String>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            unknown_files: UnknownFilePolicy::default(),
            excluded_file_names: DatasetTemplate::default()
                .artifact_names()
                .into_iter()
                .collect(),
        }
    }
}

impl Scanner {
    /// Creates a scanner that fails on unknown files and excludes the default statistics artifact.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unknown_file_policy(mut self, policy: UnknownFilePolicy) -> Self {
        self.unknown_files = policy;
        self
    }

    /// Replaces the file names that are never counted.
    #[must_use]
    pub fn with_excluded_file_names(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.excluded_file_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn unknown_file_policy(&self) -> UnknownFilePolicy {
        self.unknown_files
    }

    /// Scans the corpus below `root`.
    ///
    /// Relative IRIs can not be resolved as documents have no base IRI. Use [Scanner::scan_dataset]
    /// for corpora that contain relative IRIs.
    pub fn scan(&self, root: &Path) -> Result<Index, ScanError> {
        self.scan_entry(&Corpus { root, base: None }, root)
    }

    /// Scans the corpus of `dataset`, resolving relative IRIs against the published URL of each
    /// document.
    pub fn scan_dataset(&self, dataset: &Dataset) -> Result<Index, ScanError> {
        let corpus = Corpus {
            root: dataset.root(),
            base: Some(dataset.url()),
        };
        debug!(dataset = dataset.url(), "Scanning dataset");
        self.scan_entry(&corpus, dataset.root())
    }

    fn scan_entry(&self, corpus: &Corpus<'_>, path: &Path) -> Result<Index, ScanError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| io_error(path, e))?;
        if metadata.is_dir() {
            self.scan_directory(corpus, path)
        } else if metadata.is_file() {
            self.scan_file(corpus, path)
        } else {
            debug!(path = %path.display(), "Skipping entry that is neither a file nor a directory");
            Ok(Index::default())
        }
    }

    fn scan_directory(&self, corpus: &Corpus<'_>, path: &Path) -> Result<Index, ScanError> {
        let entries = fs::read_dir(path)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|entry| entry.path()))
                    .collect::<io::Result<Vec<PathBuf>>>()
            })
            .map_err(|e| io_error(path, e))?;
        entries
            .par_iter()
            .map(|entry| self.scan_entry(corpus, entry))
            .try_reduce(Index::default, |left, right| Ok(left.merged(right)))
    }

    fn scan_file(&self, corpus: &Corpus<'_>, path: &Path) -> Result<Index, ScanError> {
        let is_artifact = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.excluded_file_names.contains(name));
        if is_artifact {
            debug!(path = %path.display(), "Skipping statistics artifact");
            return Ok(Index::default());
        }

        let Some(format) = rdf_format_for_path(path) else {
            return match self.unknown_files {
                UnknownFilePolicy::Fail => Err(ScanError::UnknownFileType {
                    path: path.to_path_buf(),
                }),
                UnknownFilePolicy::Skip => {
                    warn!(path = %path.display(), "Skipping file of unknown type");
                    Ok(Index::default())
                }
            };
        };

        debug!(path = %path.display(), ?format, "Scanning file");
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let mut labels = BlankNodeLabels::for_document(&corpus.relative(path));
        let mut index = Index::default();
        for quad in corpus.parser(format, path).for_reader(BufReader::new(file)) {
            let quad = quad.map_err(|source| ScanError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
            index.add(labels.relabel(quad).as_ref());
        }
        Ok(index)
    }
}

struct Corpus<'a> {
    root: &'a Path,
    base: Option<&'a str>,
}

impl Corpus<'_> {
    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn parser(&self, format: RdfFormat, path: &Path) -> RdfParser {
        let parser = RdfParser::from_format(format);
        let Some(base) = self.base else {
            return parser;
        };
        let document = self.relative(&path.with_extension(""));
        let base_iri = format!("{base}/{document}");
        parser.with_base_iri(&base_iri).unwrap_or_else(|error| {
            warn!(base_iri, %error, "Invalid base IRI, relative IRIs will not be resolved");
            RdfParser::from_format(format)
        })
    }
}

/// Assigns deterministic labels to the blank nodes of a single document.
struct BlankNodeLabels {
    document: u64,
    labels: FxHashMap<BlankNode, BlankNode>,
}

impl BlankNodeLabels {
    fn for_document(relative_path: &str) -> Self {
        let mut hasher = FxHasher::default();
        relative_path.hash(&mut hasher);
        Self {
            document: hasher.finish(),
            labels: FxHashMap::default(),
        }
    }

    fn label(&mut self, node: BlankNode) -> BlankNode {
        let next = self.labels.len();
        let document = self.document;
        self.labels
            .entry(node)
            .or_insert_with(|| BlankNode::new_unchecked(format!("d{document:016x}b{next}")))
            .clone()
    }

    fn relabel(&mut self, mut quad: Quad) -> Quad {
        quad.subject = match quad.subject {
            Subject::BlankNode(node) => Subject::BlankNode(self.label(node)),
            subject => subject,
        };
        quad.object = match quad.object {
            Term::BlankNode(node) => Term::BlankNode(self.label(node)),
            object => object,
        };
        quad.graph_name = match quad.graph_name {
            GraphName::BlankNode(node) => GraphName::BlankNode(self.label(node)),
            graph_name => graph_name,
        };
        quad
    }
}

fn io_error(path: &Path, source: io::Error) -> ScanError {
    ScanError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podstats_model::NamedNode;

    #[test]
    fn relabels_blank_nodes_in_order_of_appearance() {
        let mut labels = BlankNodeLabels::for_document("a.ttl");
        let p = NamedNode::new_unchecked("http://example.com/p");
        let quad = Quad::new(
            BlankNode::new_unchecked("x"),
            p.clone(),
            BlankNode::new_unchecked("y"),
            GraphName::DefaultGraph,
        );
        let first = labels.relabel(quad.clone());
        let second = labels.relabel(quad);
        assert_eq!(first, second);
        let (Subject::BlankNode(subject), Term::BlankNode(object)) = (&first.subject, &first.object)
        else {
            panic!("blank nodes should stay blank nodes")
        };
        assert!(subject.as_str().ends_with("b0"));
        assert!(object.as_str().ends_with("b1"));
    }

    #[test]
    fn documents_have_distinct_labels() {
        let mut left = BlankNodeLabels::for_document("a.ttl");
        let mut right = BlankNodeLabels::for_document("b.ttl");
        let node = BlankNode::new_unchecked("x");
        assert_ne!(left.label(node.clone()), right.label(node));
    }
}
