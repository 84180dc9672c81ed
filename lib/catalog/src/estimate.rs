use crate::catalog::{Cardinality, Catalog};
use crate::error::EstimateError;
use async_trait::async_trait;
use podstats_model::pattern::{NamedNodePattern, TriplePattern};
use podstats_model::{NamedNode, NamedNodeRef};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A triple pattern evaluated against a source, as handed in by the query planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateRequest {
    /// The URL of the source the pattern is evaluated against.
    pub source: String,
    pub pattern: TriplePattern,
}

impl EstimateRequest {
    pub fn new(source: impl Into<String>, pattern: TriplePattern) -> Self {
        Self {
            source: source.into(),
            pattern,
        }
    }

    /// The predicate of the pattern if it is an IRI.
    pub fn predicate(&self) -> Result<&NamedNode, EstimateError> {
        match &self.pattern.predicate {
            NamedNodePattern::NamedNode(predicate) => Ok(predicate),
            NamedNodePattern::Variable(variable) => Err(EstimateError::UnsupportedPattern {
                pattern: self.pattern.to_string(),
                reason: format!("the predicate {variable} is a variable"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimateKind {
    Estimate,
}

impl EstimateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
        }
    }
}

impl fmt::Display for EstimateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An estimated number of solutions of a pattern. `+∞` if nothing is known about the pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardinalityEstimate {
    pub kind: EstimateKind,
    pub value: f64,
}

impl CardinalityEstimate {
    pub fn estimate(value: f64) -> Self {
        Self {
            kind: EstimateKind::Estimate,
            value,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.value == f64::INFINITY
    }
}

impl From<Cardinality> for CardinalityEstimate {
    fn from(cardinality: Cardinality) -> Self {
        Self::estimate(cardinality.value())
    }
}

/// The metadata attached to a query operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationMetadata {
    pub cardinality: CardinalityEstimate,
}

/// Produces the metadata of a query operation.
///
/// [MetadataExtractor::test] tells whether the extractor can handle a request at all, without doing
/// any work. Only requests that passed the test are handed to [MetadataExtractor::run].
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn test(&self, request: &EstimateRequest) -> Result<(), EstimateError>;

    async fn run(&self, request: &EstimateRequest) -> Result<OperationMetadata, EstimateError>;
}

/// Estimates the cardinality of a pattern from the predicate cardinalities in a [Catalog].
#[derive(Debug, Clone)]
pub struct EstimateProvider {
    catalog: Catalog,
}

impl EstimateProvider {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Looks up the cardinality of the predicate of the pattern in the dataset of the source.
    ///
    /// Patterns with a variable predicate are not supported.
    pub async fn estimate(
        &self,
        request: &EstimateRequest,
    ) -> Result<CardinalityEstimate, EstimateError> {
        let predicate = request.predicate()?;
        let cardinality = self
            .catalog
            .lookup(&request.source, predicate.as_ref())
            .await?;
        debug!(
            source = request.source.as_str(),
            %predicate,
            %cardinality,
            "Estimated pattern"
        );
        Ok(cardinality.into())
    }
}

#[async_trait]
impl MetadataExtractor for EstimateProvider {
    fn name(&self) -> &str {
        "catalog"
    }

    fn test(&self, request: &EstimateRequest) -> Result<(), EstimateError> {
        request.predicate().map(|_| ())
    }

    async fn run(&self, request: &EstimateRequest) -> Result<OperationMetadata, EstimateError> {
        Ok(OperationMetadata {
            cardinality: self.estimate(request).await?,
        })
    }
}

/// Estimates the cardinality of a pattern from a fixed predicate table, regardless of the source.
///
/// The table is typically loaded from the faceted cardinalities of a corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticEstimateProvider {
    cardinalities: FxHashMap<NamedNode, u64>,
}

impl StaticEstimateProvider {
    /// Counts of the same predicate are summed.
    pub fn new(cardinalities: impl IntoIterator<Item = (NamedNode, u64)>) -> Self {
        let mut provider = Self::default();
        for (predicate, count) in cardinalities {
            let total = provider.cardinalities.entry(predicate).or_insert(0);
            *total = total.saturating_add(count);
        }
        provider
    }

    pub fn len(&self) -> usize {
        self.cardinalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cardinalities.is_empty()
    }

    pub fn cardinality(&self, predicate: NamedNodeRef<'_>) -> Cardinality {
        self.cardinalities
            .get(&predicate.into_owned())
            .map_or(Cardinality::Unknown, |count| Cardinality::Known(*count))
    }

    pub fn estimate(&self, request: &EstimateRequest) -> Result<CardinalityEstimate, EstimateError> {
        Ok(self.cardinality(request.predicate()?.as_ref()).into())
    }
}

#[async_trait]
impl MetadataExtractor for StaticEstimateProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn test(&self, request: &EstimateRequest) -> Result<(), EstimateError> {
        request.predicate().map(|_| ())
    }

    async fn run(&self, request: &EstimateRequest) -> Result<OperationMetadata, EstimateError> {
        Ok(OperationMetadata {
            cardinality: self.estimate(request)?,
        })
    }
}

/// Runs the first registered extractor that accepts a request.
#[derive(Clone, Default)]
pub struct ExtractorChain {
    extractors: Vec<Arc<dyn MetadataExtractor>>,
}

impl ExtractorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extractor` after the already registered extractors.
    #[must_use]
    pub fn with(mut self, extractor: Arc<dyn MetadataExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Runs the first extractor whose test passes.
    ///
    /// Fails with [EstimateError::NoExtractor], listing the reason of every extractor, if no
    /// extractor accepts the request.
    pub async fn run(&self, request: &EstimateRequest) -> Result<OperationMetadata, EstimateError> {
        let mut reasons = Vec::new();
        for extractor in &self.extractors {
            match extractor.test(request) {
                Ok(()) => {
                    debug!(extractor = extractor.name(), "Running metadata extractor");
                    return extractor.run(request).await;
                }
                Err(reason) => reasons.push(format!("{}: {reason}", extractor.name())),
            }
        }
        Err(EstimateError::NoExtractor {
            pattern: request.pattern.to_string(),
            reasons,
        })
    }
}

impl fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.extractors.iter().map(|extractor| extractor.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podstats_model::pattern::TermPattern;
    use podstats_model::Variable;

    const P1: &str = "http://example.com/p1";

    fn pattern(predicate: NamedNodePattern) -> TriplePattern {
        TriplePattern {
            subject: TermPattern::Variable(Variable::new_unchecked("s")),
            predicate,
            object: TermPattern::Variable(Variable::new_unchecked("o")),
        }
    }

    fn request(predicate: &str) -> EstimateRequest {
        EstimateRequest::new(
            "http://example.com/pods/alice/posts/1",
            pattern(NamedNode::new_unchecked(predicate).into()),
        )
    }

    fn variable_request() -> EstimateRequest {
        EstimateRequest::new(
            "http://example.com/pods/alice/posts/1",
            pattern(Variable::new_unchecked("p").into()),
        )
    }

    #[test]
    fn static_estimates() -> Result<(), EstimateError> {
        let provider = StaticEstimateProvider::new([
            (NamedNode::new_unchecked(P1), 2),
            (NamedNode::new_unchecked(P1), 3),
        ]);
        assert_eq!(provider.estimate(&request(P1))?.value, 5.0);
        assert!(provider
            .estimate(&request("http://example.com/p2"))?
            .is_unknown());
        Ok(())
    }

    #[test]
    fn static_estimates_saturate() {
        let provider = StaticEstimateProvider::new([
            (NamedNode::new_unchecked(P1), u64::MAX),
            (NamedNode::new_unchecked(P1), u64::MAX),
        ]);
        assert_eq!(
            provider.cardinality(NamedNodeRef::new_unchecked(P1)),
            Cardinality::Known(u64::MAX)
        );
    }

    #[test]
    fn variable_predicates_are_unsupported() {
        let provider = StaticEstimateProvider::default();
        assert!(matches!(
            provider.estimate(&variable_request()),
            Err(EstimateError::UnsupportedPattern { .. })
        ));
    }

    #[tokio::test]
    async fn chain_runs_first_accepting_extractor() -> Result<(), EstimateError> {
        let chain = ExtractorChain::new()
            .with(Arc::new(StaticEstimateProvider::new([(
                NamedNode::new_unchecked(P1),
                7,
            )])))
            .with(Arc::new(StaticEstimateProvider::new([(
                NamedNode::new_unchecked(P1),
                9,
            )])));
        let metadata = chain.run(&request(P1)).await?;
        assert_eq!(metadata.cardinality, CardinalityEstimate::estimate(7.0));
        assert_eq!(metadata.cardinality.kind.as_str(), "estimate");
        Ok(())
    }

    #[tokio::test]
    async fn chain_without_accepting_extractor() {
        let chain = ExtractorChain::new().with(Arc::new(StaticEstimateProvider::default()));
        let result = chain.run(&variable_request()).await;
        let Err(EstimateError::NoExtractor { reasons, .. }) = result else {
            panic!("expected no extractor to accept a variable predicate");
        };
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].starts_with("static: "));
    }
}
