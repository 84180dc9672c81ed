use podstats_model::vocab::discovery;
use podstats_model::{IriParseError, NamedNode, Term, Triple};
use serde::Deserialize;
use std::iter::FusedIterator;
use tracing::debug;

/// Finds links to statistics documents in the metadata of a dereferenced document.
///
/// A statement is a link if its predicate belongs to the allowlist of the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkExtractor {
    predicates: Vec<NamedNode>,
}

impl Default for LinkExtractor {
    /// Follows the public and the private cardinality index conventions.
    fn default() -> Self {
        Self::new([
            discovery::PUBLIC_CARDINALITY_INDEX.into_owned(),
            discovery::PRIVATE_CARDINALITY_INDEX.into_owned(),
        ])
    }
}

impl LinkExtractor {
    pub fn new(predicates: impl IntoIterator<Item = NamedNode>) -> Self {
        let mut extractor = Self {
            predicates: Vec::new(),
        };
        for predicate in predicates {
            extractor = extractor.with_predicate(predicate);
        }
        extractor
    }

    /// Adds `predicate` to the allowlist.
    #[must_use]
    pub fn with_predicate(mut self, predicate: NamedNode) -> Self {
        if !self.predicates.contains(&predicate) {
            self.predicates.push(predicate);
        }
        self
    }

    pub fn predicates(&self) -> &[NamedNode] {
        &self.predicates
    }

    /// Yields the object of every allowlisted statement of `metadata`, in the order of `metadata`.
    ///
    /// The first error of `metadata` is yielded and ends the extraction.
    pub fn extract<I, S, E>(&self, metadata: I) -> Links<'_, I::IntoIter>
    where
        I: IntoIterator<Item = Result<S, E>>,
        S: Into<Triple>,
    {
        Links {
            predicates: &self.predicates,
            metadata: Some(metadata.into_iter()),
        }
    }
}

/// The predicates advertising statistics documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub predicates: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            predicates: LinkExtractor::default()
                .predicates()
                .iter()
                .map(|predicate| predicate.as_str().to_owned())
                .collect(),
        }
    }
}

impl DiscoveryConfig {
    pub fn link_extractor(&self) -> Result<LinkExtractor, IriParseError> {
        Ok(LinkExtractor::new(
            self.predicates
                .iter()
                .map(NamedNode::new)
                .collect::<Result<Vec<_>, _>>()?,
        ))
    }
}

/// Iterator returned by [LinkExtractor::extract].
#[must_use]
pub struct Links<'a, I> {
    predicates: &'a [NamedNode],
    metadata: Option<I>,
}

impl<I, S, E> Iterator for Links<'_, I>
where
    I: Iterator<Item = Result<S, E>>,
    S: Into<Triple>,
{
    type Item = Result<NamedNode, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let triple: Triple = match self.metadata.as_mut()?.next() {
                Some(Ok(statement)) => statement.into(),
                Some(Err(error)) => {
                    self.metadata = None;
                    return Some(Err(error));
                }
                None => {
                    self.metadata = None;
                    return None;
                }
            };
            if !self.predicates.contains(&triple.predicate) {
                continue;
            }
            match triple.object {
                Term::NamedNode(link) => return Some(Ok(link)),
                object => {
                    debug!(
                        predicate = %triple.predicate,
                        %object,
                        "Ignoring link that is not an IRI"
                    );
                }
            }
        }
    }
}

impl<I, S, E> FusedIterator for Links<'_, I>
where
    I: Iterator<Item = Result<S, E>>,
    S: Into<Triple>,
{
}
