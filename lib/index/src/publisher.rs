use crate::dataset::Dataset;
use crate::error::PublishError;
use crate::index::Index;
use itertools::Itertools;
use podstats_model::vocab::{rdf, rdfs, void, xsd};
use podstats_model::{
    rdf_format_for_path, BlankNode, GraphName, Literal, NamedNode, Quad, RdfFormat, RdfParser,
    RdfSerializer, Term,
};
use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherOptions {
    /// The predicate linking the profile to the statistics document.
    pub link_predicate: NamedNode,
}

impl Default for PublisherOptions {
    fn default() -> Self {
        Self {
            link_predicate: rdfs::SEE_ALSO.into_owned(),
        }
    }
}

/// Whether [Publisher::link_profile] had to change the profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link has been appended to the profile.
    Linked,
    /// The profile already contained the link and has been left untouched.
    AlreadyLinked,
}

/// Summary of a successful [Publisher::publish].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub dataset: NamedNode,
    pub statistics: NamedNode,
    pub triples: u64,
    pub properties: usize,
    pub link: LinkOutcome,
}

/// Persists the statistics document of a dataset and links it from the dataset's profile.
#[derive(Debug, Clone, Default)]
pub struct Publisher {
    options: PublisherOptions,
}

impl Publisher {
    pub fn new(options: PublisherOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PublisherOptions {
        &self.options
    }

    /// Writes the statistics document of `index` and links it from the profile of `dataset`.
    ///
    /// A previous statistics document is replaced. If the document has been written but the profile
    /// could not be updated, [PublishError::Link] is returned and the link can be added later with
    /// [Publisher::link_profile].
    pub fn publish(&self, index: &Index, dataset: &Dataset) -> Result<PublishReport, PublishError> {
        self.write_statistics(index, dataset)?;
        let link = self
            .link_profile(dataset)
            .map_err(|source| PublishError::Link {
                statistics: dataset.statistics_path().to_path_buf(),
                source: Box::new(source),
            })?;
        info!(
            dataset = dataset.url(),
            triples = index.triples(),
            properties = index.predicates().len(),
            "Published statistics"
        );
        Ok(PublishReport {
            dataset: dataset.iri().clone(),
            statistics: dataset.statistics_iri().clone(),
            triples: index.triples(),
            properties: index.predicates().len(),
            link,
        })
    }

    /// Replaces the statistics document of `dataset` with the statistics of `index`.
    pub fn write_statistics(&self, index: &Index, dataset: &Dataset) -> Result<(), PublishError> {
        let path = dataset.statistics_path();
        let format = output_format(path)?;
        remove_existing(path)?;
        let document = serialize(statistics_statements(index, dataset.iri()), format, path)?;
        write_document(path, &document)?;
        debug!(path = %path.display(), "Wrote statistics document");
        Ok(())
    }

    /// Adds `<profile> <link predicate> <statistics>` to the profile document of `dataset`, unless
    /// the profile already contains this statement.
    ///
    /// A missing profile document is created.
    pub fn link_profile(&self, dataset: &Dataset) -> Result<LinkOutcome, PublishError> {
        let path = dataset.profile_path();
        let format = output_format(path)?;
        let link = Quad::new(
            dataset.profile_iri().clone(),
            self.options.link_predicate.clone(),
            dataset.statistics_iri().clone(),
            GraphName::DefaultGraph,
        );

        let mut statements = read_profile(path, format, dataset.profile_document_iri())?;
        if statements.contains(&link) {
            debug!(path = %path.display(), "Profile already links the statistics document");
            return Ok(LinkOutcome::AlreadyLinked);
        }
        statements.push(link);
        let document = serialize(statements, format, path)?;
        write_document(path, &document)?;
        debug!(path = %path.display(), "Linked statistics document from profile");
        Ok(LinkOutcome::Linked)
    }
}

/// The VoID description of `index`, with one property partition per predicate.
///
/// Partitions are labelled `p0`, `p1`, ... in predicate order, hence an unchanged index always
/// yields the same statements.
fn statistics_statements(index: &Index, dataset: &NamedNode) -> Vec<Quad> {
    let summary = [
        (rdf::TYPE, Term::from(void::DATASET.into_owned())),
        (void::TRIPLES, integer(index.triples())),
        (void::DISTINCT_SUBJECTS, integer(len(index.subjects()))),
        (void::DISTINCT_OBJECTS, integer(len(index.objects()))),
        (void::PROPERTIES, integer(len(index.predicates()))),
    ]
    .into_iter()
    .map(|(predicate, object)| {
        Quad::new(
            dataset.clone(),
            predicate,
            object,
            GraphName::DefaultGraph,
        )
    });

    let partitions = index
        .predicates()
        .iter()
        .sorted_by(|(left, _), (right, _)| left.as_str().cmp(right.as_str()))
        .enumerate()
        .flat_map(|(i, (predicate, count))| {
            let partition = BlankNode::new_unchecked(format!("p{i}"));
            [
                Quad::new(
                    dataset.clone(),
                    void::PROPERTY_PARTITION,
                    partition.clone(),
                    GraphName::DefaultGraph,
                ),
                Quad::new(
                    partition,
                    predicate.clone(),
                    integer(*count),
                    GraphName::DefaultGraph,
                ),
            ]
        });

    summary.chain(partitions).collect()
}

fn integer(value: u64) -> Term {
    Literal::new_typed_literal(value.to_string(), xsd::INTEGER).into()
}

fn len<K, V>(map: &FxHashMap<K, V>) -> u64 {
    u64::try_from(map.len()).unwrap_or(u64::MAX)
}

fn output_format(path: &Path) -> Result<RdfFormat, PublishError> {
    rdf_format_for_path(path).ok_or_else(|| PublishError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

fn read_profile(path: &Path, format: RdfFormat, base_iri: &str) -> Result<Vec<Quad>, PublishError> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(PublishError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let parser = RdfParser::from_format(format)
        .with_base_iri(base_iri)
        .unwrap_or_else(|_| RdfParser::from_format(format));
    parser
        .for_reader(content.as_slice())
        .map(|quad| {
            quad.map_err(|source| PublishError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

fn serialize(
    statements: impl IntoIterator<Item = Quad>,
    format: RdfFormat,
    path: &Path,
) -> Result<Vec<u8>, PublishError> {
    let serialize_error = |source| PublishError::Serialize {
        path: path.to_path_buf(),
        source,
    };
    let mut serializer = RdfSerializer::from_format(format).for_writer(Vec::new());
    for quad in statements {
        serializer.serialize_quad(&quad).map_err(serialize_error)?;
    }
    serializer.finish().map_err(serialize_error)
}

fn remove_existing(path: &Path) -> Result<(), PublishError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(PublishError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_document(path: &Path, document: &[u8]) -> Result<(), PublishError> {
    let io_error = |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, document).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use podstats_model::{GraphNameRef, NamedNodeRef, QuadRef};

    const DATASET: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/pods/alice");
    const S: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/s");
    const P1: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/p1");
    const P2: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.com/p2");

    #[test]
    fn statistics_describe_partitions_in_predicate_order() {
        let mut index = Index::default();
        index.add(QuadRef::new(S, P2, S, GraphNameRef::DefaultGraph));
        index.add(QuadRef::new(S, P1, S, GraphNameRef::DefaultGraph));
        index.add(QuadRef::new(S, P2, S, GraphNameRef::DefaultGraph));

        let statements = statistics_statements(&index, &DATASET.into_owned());
        assert_eq!(statements.len(), 5 + 2 * 2);
        assert!(statements.contains(&Quad::new(
            DATASET.into_owned(),
            void::TRIPLES,
            integer(3),
            GraphName::DefaultGraph
        )));
        assert!(statements.contains(&Quad::new(
            BlankNode::new_unchecked("p0"),
            P1.into_owned(),
            integer(1),
            GraphName::DefaultGraph
        )));
        assert!(statements.contains(&Quad::new(
            BlankNode::new_unchecked("p1"),
            P2.into_owned(),
            integer(2),
            GraphName::DefaultGraph
        )));
    }

    #[test]
    fn empty_index_has_only_a_summary() {
        let statements = statistics_statements(&Index::default(), &DATASET.into_owned());
        assert_eq!(statements.len(), 5);
        assert!(statements
            .iter()
            .all(|quad| quad.predicate != void::PROPERTY_PARTITION));
        assert_eq!(statements[1].object, integer(0));
    }
}
