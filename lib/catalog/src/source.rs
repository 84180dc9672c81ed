use crate::dereference::{document_url, Dereferencer, Document};
use crate::error::{CatalogError, DereferenceError};
use crate::links::LinkExtractor;
use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use podstats_model::vocab::{rdf, rdfs, void};
use podstats_model::{Graph, NamedNode, Quad, SubjectRef, TermRef, TripleRef};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// One `(?dataset, ?predicate, ?cardinality)` solution of the partition query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRow {
    pub dataset: String,
    pub predicate: NamedNode,
    pub cardinality: u64,
}

/// The partition rows found in a single statistics document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub document: String,
    pub rows: Vec<PartitionRow>,
}

/// Retrieves the statistics that describe the dataset a URL belongs to.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Returns the statistics reachable from `hint`, one entry per statistics document.
    async fn statistics(&self, hint: &str) -> Result<Vec<Statistics>, CatalogError>;
}

/// Runs the partition query against `statements`:
///
/// ```sparql
/// SELECT ?dataset ?predicate ?cardinality WHERE {
///   ?dataset a void:Dataset ; void:propertyPartition [ ?predicate ?cardinality ] .
/// }
/// ```
///
/// Datasets identified by blank nodes can not be looked up and are ignored. A cardinality that is
/// not a non-negative integer fails the query.
pub fn partition_rows(
    document: &str,
    statements: &Graph,
) -> Result<Vec<PartitionRow>, CatalogError> {
    let mut rows = Vec::new();
    for dataset in statements.subjects_for_predicate_object(rdf::TYPE, void::DATASET) {
        let SubjectRef::NamedNode(dataset) = dataset else {
            debug!(document, "Ignoring dataset without IRI");
            continue;
        };
        for partition in
            statements.objects_for_subject_predicate(dataset, void::PROPERTY_PARTITION)
        {
            let partition = match partition {
                TermRef::NamedNode(node) => SubjectRef::from(node),
                TermRef::BlankNode(node) => SubjectRef::from(node),
                _ => continue,
            };
            for triple in statements.triples_for_subject(partition) {
                let TermRef::Literal(count) = triple.object else {
                    continue;
                };
                let cardinality =
                    count
                        .value()
                        .parse::<u64>()
                        .map_err(|error| CatalogError::Query {
                            document: document.to_owned(),
                            message: format!(
                                "invalid cardinality {count} for <{}>: {error}",
                                triple.predicate.as_str()
                            ),
                        })?;
                rows.push(PartitionRow {
                    dataset: dataset.as_str().to_owned(),
                    predicate: triple.predicate.into_owned(),
                    cardinality,
                });
            }
        }
    }
    Ok(rows)
}

/// Finds statistics by dereferencing the hint and following the statistics links of the
/// dereferenced documents.
///
/// The documents considered are the hint itself and, if configured, a profile document of the
/// hint (`{hint}/profile/card` by default). Documents that do not exist are ignored. Every
/// document whose links lead to further statistics contributes the statistics of the linked
/// documents, one hop deep. Linked documents that fail to load are skipped with a warning, while
/// a loaded document with invalid statistics fails the population.
pub struct DereferencingStatisticsSource {
    dereferencer: Arc<dyn Dereferencer>,
    links: LinkExtractor,
    profile: Option<String>,
}

impl DereferencingStatisticsSource {
    pub fn new(dereferencer: Arc<dyn Dereferencer>) -> Self {
        Self {
            dereferencer,
            links: LinkExtractor::default().with_predicate(rdfs::SEE_ALSO.into_owned()),
            profile: Some("profile/card".to_owned()),
        }
    }

    #[must_use]
    pub fn with_link_extractor(mut self, links: LinkExtractor) -> Self {
        self.links = links;
        self
    }

    /// Sets the location of the profile relative to a hint, [None] to only dereference the hint.
    #[must_use]
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    fn entry_points(&self, hint: &str) -> Vec<String> {
        let mut urls = vec![hint.to_owned()];
        if let Some(profile) = &self.profile {
            urls.push(format!("{}/{profile}", hint.trim_end_matches('/')));
        }
        urls
    }

    async fn dereference_existing(&self, url: &str) -> Result<Option<Document>, CatalogError> {
        match self.dereferencer.dereference(url).await {
            Ok(document) => Ok(Some(document)),
            Err(error) if error.is_not_found() => {
                debug!(url, "Document does not exist");
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Linked documents that can not be retrieved are not statistics documents.
    async fn dereference_linked(&self, url: &str) -> Option<Document> {
        match self.dereferencer.dereference(url).await {
            Ok(document) => Some(document),
            Err(error) => {
                warn!(url, %error, "Ignoring linked document");
                None
            }
        }
    }
}

#[async_trait]
impl StatisticsSource for DereferencingStatisticsSource {
    async fn statistics(&self, hint: &str) -> Result<Vec<Statistics>, CatalogError> {
        let entry_points = self.entry_points(hint);
        let documents: Vec<Document> = try_join_all(
            entry_points
                .iter()
                .map(|url| self.dereference_existing(url)),
        )
        .await?
        .into_iter()
        .flatten()
        .collect();
        if documents.is_empty() {
            return Err(DereferenceError::NotFound {
                url: hint.to_owned(),
            }
            .into());
        }

        let mut visited: Vec<String> = documents.iter().map(|d| d.url.clone()).collect();
        let mut linked = Vec::new();
        for document in &documents {
            let links = self
                .links
                .extract(document.quads.iter().cloned().map(Ok::<_, Infallible>));
            for link in links.flatten() {
                let url = document_url(link.as_str()).to_owned();
                if !visited.contains(&url) {
                    visited.push(url.clone());
                    linked.push(url);
                }
            }
        }
        debug!(hint, links = linked.len(), "Following statistics links");
        let linked = join_all(linked.iter().map(|url| self.dereference_linked(url))).await;

        let mut statistics = Vec::new();
        for document in documents.into_iter().chain(linked.into_iter().flatten()) {
            let graph = graph_of(&document.quads);
            let rows = partition_rows(&document.url, &graph)?;
            if !rows.is_empty() {
                statistics.push(Statistics {
                    document: document.url,
                    rows,
                });
            }
        }
        if statistics.is_empty() {
            warn!(hint, "No statistics found");
        }
        Ok(statistics)
    }
}

fn graph_of(quads: &[Quad]) -> Graph {
    let mut graph = Graph::new();
    for quad in quads {
        graph.insert(TripleRef::new(
            quad.subject.as_ref(),
            quad.predicate.as_ref(),
            quad.object.as_ref(),
        ));
    }
    graph
}
