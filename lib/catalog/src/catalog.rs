use crate::error::CatalogError;
use crate::source::{Statistics, StatisticsSource};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use podstats_model::{NamedNode, NamedNodeRef};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The cardinality of a predicate within a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Known(u64),
    /// The statistics of the dataset have been retrieved but do not mention the predicate, or no
    /// statistics exist for the dataset.
    Unknown,
}

impl Cardinality {
    /// The cardinality as estimate value, `+∞` if it is unknown.
    pub fn value(self) -> f64 {
        match self {
            Self::Known(count) => count as f64,
            Self::Unknown => f64::INFINITY,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(count) => write!(f, "{count}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Configures a [Catalog].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// How long a population may take before all its waiters fail with [CatalogError::Timeout].
    #[serde(rename = "population_timeout_secs", with = "seconds")]
    pub population_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            population_timeout: Duration::from_secs(30),
        }
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

type Population = Shared<BoxFuture<'static, Result<(), CatalogError>>>;

/// Predicate cardinalities of the datasets seen during a query session.
///
/// Entries are keyed by dataset URL. A lookup is answered by the entry whose key is the longest
/// prefix of the hint, with ties going to the entry registered first. A hint without entry causes
/// a population: the [StatisticsSource] is asked for the statistics reachable from the hint and the
/// result is added to the entries of the described datasets.
///
/// Populations are single-flight per hint: concurrent lookups share one population, which runs on
/// its own task and completes even if all of its waiters are dropped. Failed populations are not
/// remembered, the next lookup tries again.
///
/// Cloning a catalog is cheap and the clones share their entries.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    source: Arc<dyn StatisticsSource>,
    config: CatalogConfig,
    state: Mutex<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    /// In registration order.
    entries: Vec<CatalogEntry>,
    in_flight: FxHashMap<String, Population>,
}

struct CatalogEntry {
    key: String,
    cardinalities: FxHashMap<NamedNode, u64>,
    /// The statistics documents whose counts have been added to this entry.
    documents: FxHashSet<String>,
    /// Registered for a hint whose population found no statistics.
    negative: bool,
}

impl CatalogEntry {
    fn new(key: String) -> Self {
        Self {
            key,
            cardinalities: FxHashMap::default(),
            documents: FxHashSet::default(),
            negative: false,
        }
    }

    fn negative(key: String) -> Self {
        Self {
            negative: true,
            ..Self::new(key)
        }
    }
}

impl Catalog {
    pub fn new(source: Arc<dyn StatisticsSource>) -> Self {
        Self::with_config(source, CatalogConfig::default())
    }

    pub fn with_config(source: Arc<dyn StatisticsSource>, config: CatalogConfig) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                source,
                config,
                state: Mutex::default(),
            }),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    /// The cardinality of `predicate` in the dataset `hint` belongs to.
    ///
    /// Populates the catalog if no entry matches `hint`. Returns [Cardinality::Unknown] only if the
    /// population succeeded; errors of the population are returned as is.
    pub async fn lookup(
        &self,
        hint: &str,
        predicate: NamedNodeRef<'_>,
    ) -> Result<Cardinality, CatalogError> {
        if let Some(cardinality) = self.inner.state().cardinality(hint, predicate) {
            return Ok(cardinality);
        }
        let population = {
            let mut state = self.inner.state();
            if let Some(cardinality) = state.cardinality(hint, predicate) {
                return Ok(cardinality);
            }
            self.population(&mut state, hint)
        };
        population.await?;
        Ok(self
            .inner
            .state()
            .cardinality(hint, predicate)
            .unwrap_or(Cardinality::Unknown))
    }

    /// Retrieves the statistics reachable from `hint` and adds them to the catalog, joining the
    /// population of `hint` that is already running if any.
    ///
    /// Statistics documents that have already been added to an entry are not added again.
    pub async fn populate(&self, hint: &str) -> Result<(), CatalogError> {
        let population = {
            let mut state = self.inner.state();
            self.population(&mut state, hint)
        };
        population.await
    }

    /// The key of the entry answering lookups for `hint`.
    pub fn entry_key(&self, hint: &str) -> Option<String> {
        self.inner
            .state()
            .entry(hint)
            .map(|entry| entry.key.clone())
    }

    /// The number of entries, including the entries of hints without statistics.
    pub fn len(&self) -> usize {
        self.inner.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn population(&self, state: &mut CatalogState, hint: &str) -> Population {
        if let Some(population) = state.in_flight.get(hint) {
            debug!(hint, "Joining running population");
            return population.clone();
        }

        debug!(hint, "Starting population");
        let inner = Arc::clone(&self.inner);
        let task_hint = hint.to_owned();
        let handle = tokio::spawn(async move { inner.populate(task_hint).await });
        let cleanup = Arc::clone(&self.inner);
        let aborted_hint = hint.to_owned();
        let population = async move {
            handle.await.unwrap_or_else(|error| {
                cleanup.state().in_flight.remove(&aborted_hint);
                Err(CatalogError::Aborted {
                    hint: aborted_hint,
                    message: error.to_string(),
                })
            })
        }
        .boxed()
        .shared();
        state
            .in_flight
            .insert(hint.to_owned(), population.clone());
        population
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("Catalog")
            .field(
                "entries",
                &state.entries.iter().map(|e| &e.key).collect::<Vec<_>>(),
            )
            .field("in_flight", &state.in_flight.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl CatalogInner {
    fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn populate(&self, hint: String) -> Result<(), CatalogError> {
        let timeout = self.config.population_timeout;
        let result = match tokio::time::timeout(timeout, self.source.statistics(&hint)).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::Timeout {
                hint: hint.clone(),
                timeout,
            }),
        };

        let mut state = self.state();
        state.in_flight.remove(&hint);
        match result {
            Ok(statistics) => {
                let merged = state.merge(statistics);
                if state.entry(&hint).is_none() {
                    debug!(hint = hint.as_str(), "No statistics describe the hint");
                    state.entries.push(CatalogEntry::negative(hint.clone()));
                }
                info!(hint = hint.as_str(), documents = merged, "Populated catalog");
                Ok(())
            }
            Err(error) => {
                warn!(hint = hint.as_str(), %error, "Population failed");
                Err(error)
            }
        }
    }
}

impl CatalogState {
    fn entry(&self, hint: &str) -> Option<&CatalogEntry> {
        // Ties keep the first maximum, i.e. the entry registered first.
        self.entries
            .iter()
            .filter(|entry| hint.starts_with(entry.key.as_str()))
            .fold(None, |best: Option<&CatalogEntry>, entry| match best {
                Some(best) if best.key.len() >= entry.key.len() => Some(best),
                _ => Some(entry),
            })
    }

    fn cardinality(&self, hint: &str, predicate: NamedNodeRef<'_>) -> Option<Cardinality> {
        self.entry(hint).map(|entry| {
            entry
                .cardinalities
                .get(&predicate.into_owned())
                .map_or(Cardinality::Unknown, |count| Cardinality::Known(*count))
        })
    }

    fn entry_mut(&mut self, key: &str) -> &mut CatalogEntry {
        let position = match self.entries.iter().position(|entry| entry.key == key) {
            Some(position) => position,
            None => {
                self.entries.push(CatalogEntry::new(key.to_owned()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[position]
    }

    /// Sums the rows of `statistics` into the entries of their datasets and returns the number of
    /// documents that contributed.
    ///
    /// A document is added at most once to the entry of a dataset. Negative entries below a
    /// dataset that received statistics are dropped, so that the dataset answers their hints.
    fn merge(&mut self, statistics: Vec<Statistics>) -> usize {
        let mut merged = 0;
        let mut datasets = FxHashSet::default();
        for Statistics { document, rows } in statistics {
            let mut accepted = FxHashMap::<String, bool>::default();
            let mut contributed = false;
            for row in rows {
                let accept = match accepted.get(&row.dataset) {
                    Some(accept) => *accept,
                    None => {
                        let accept = self
                            .entry_mut(&row.dataset)
                            .documents
                            .insert(document.clone());
                        if !accept {
                            debug!(
                                document = document.as_str(),
                                dataset = row.dataset.as_str(),
                                "Statistics already merged"
                            );
                        }
                        accepted.insert(row.dataset.clone(), accept);
                        accept
                    }
                };
                if accept {
                    let entry = self.entry_mut(&row.dataset);
                    entry.negative = false;
                    let count = entry.cardinalities.entry(row.predicate).or_insert(0);
                    *count = count.saturating_add(row.cardinality);
                    datasets.insert(row.dataset);
                    contributed = true;
                }
            }
            if contributed {
                merged += 1;
            }
        }
        self.entries.retain(|entry| {
            let shadowed = entry.negative
                && datasets
                    .iter()
                    .any(|dataset| entry.key.starts_with(dataset.as_str()));
            if shadowed {
                debug!(hint = entry.key.as_str(), "Dropping negative entry");
            }
            !shadowed
        });
        merged
    }
}
