use crate::error::IndexError;
use podstats_model::vocab::{facet, owl, xsd};
use podstats_model::{
    GraphName, GraphNameRef, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode,
    NamedOrBlankNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef,
};
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// The role a term plays in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Subject,
    Predicate,
    Object,
    Graph,
}

impl Role {
    /// All roles in the order in which they are serialized.
    pub const ALL: [Role; 4] = [Role::Subject, Role::Predicate, Role::Object, Role::Graph];

    /// The graph name that tags faceted statements of this role.
    pub fn facet(self) -> NamedNodeRef<'static> {
        match self {
            Role::Subject => facet::SUBJECT,
            Role::Predicate => facet::PREDICATE,
            Role::Object => facet::OBJECT,
            Role::Graph => facet::GRAPH,
        }
    }

    /// Inverse of [Role::facet].
    pub fn from_facet(facet: NamedNodeRef<'_>) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.facet() == facet)
    }
}

/// Cardinalities of the terms of a statement multiset, separated by the role of the term.
///
/// Subjects and objects count IRIs and blank nodes, predicates count IRIs, and graphs count named
/// graphs. Literals and the default graph are never counted. Every key has a count of at least 1.
///
/// As [Index::merge] only adds counts, indexes built from disjoint parts of a corpus can be merged
/// in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    triples: u64,
    subjects: FxHashMap<NamedOrBlankNode, u64>,
    predicates: FxHashMap<NamedNode, u64>,
    objects: FxHashMap<NamedOrBlankNode, u64>,
    graphs: FxHashMap<NamedOrBlankNode, u64>,
}

impl Index {
    /// Counts the terms of `quad`.
    pub fn add(&mut self, quad: QuadRef<'_>) {
        self.triples += 1;
        if let Some(subject) = subject_node(quad.subject) {
            increment(&mut self.subjects, subject, 1);
        }
        increment(&mut self.predicates, quad.predicate.into_owned(), 1);
        if let Some(object) = object_node(quad.object) {
            increment(&mut self.objects, object, 1);
        }
        match quad.graph_name {
            GraphNameRef::NamedNode(node) => {
                increment(&mut self.graphs, node.into_owned().into(), 1);
            }
            GraphNameRef::BlankNode(node) => {
                increment(&mut self.graphs, node.into_owned().into(), 1);
            }
            GraphNameRef::DefaultGraph => {}
        }
    }

    /// Adds the counts of `other` to this index.
    pub fn merge(&mut self, other: Index) {
        self.triples += other.triples;
        merge_counts(&mut self.subjects, other.subjects);
        merge_counts(&mut self.predicates, other.predicates);
        merge_counts(&mut self.objects, other.objects);
        merge_counts(&mut self.graphs, other.graphs);
    }

    /// Consuming version of [Index::merge].
    #[must_use]
    pub fn merged(mut self, other: Index) -> Self {
        self.merge(other);
        self
    }

    /// The number of distinct terms, summed over all roles.
    pub fn size(&self) -> usize {
        self.subjects.len() + self.predicates.len() + self.objects.len() + self.graphs.len()
    }

    /// Returns `true` if no statement has been counted.
    pub fn is_empty(&self) -> bool {
        self.triples == 0
    }

    /// The number of statements that have been counted.
    pub fn triples(&self) -> u64 {
        self.triples
    }

    pub fn subjects(&self) -> &FxHashMap<NamedOrBlankNode, u64> {
        &self.subjects
    }

    pub fn predicates(&self) -> &FxHashMap<NamedNode, u64> {
        &self.predicates
    }

    pub fn objects(&self) -> &FxHashMap<NamedOrBlankNode, u64> {
        &self.objects
    }

    pub fn graphs(&self) -> &FxHashMap<NamedOrBlankNode, u64> {
        &self.graphs
    }

    /// The cardinality of `term` in `role`, 0 if the term has not been seen in that role.
    pub fn count<'a>(&self, role: Role, term: impl Into<NamedOrBlankNodeRef<'a>>) -> u64 {
        let term = term.into();
        let count = match role {
            Role::Subject => self.subjects.get(&term.into_owned()),
            Role::Object => self.objects.get(&term.into_owned()),
            Role::Graph => self.graphs.get(&term.into_owned()),
            Role::Predicate => match term {
                NamedOrBlankNodeRef::NamedNode(node) => self.predicates.get(&node.into_owned()),
                NamedOrBlankNodeRef::BlankNode(_) => None,
            },
        };
        count.copied().unwrap_or(0)
    }

    /// Describes the index as `term owl:cardinality count` statements, one per distinct term and
    /// role, in the graph given by [Role::facet].
    ///
    /// Roles are emitted in the order of [Role::ALL], terms of a role in lexical order. A role is only
    /// materialized once the iterator reaches it.
    pub fn as_faceted_statements(&self) -> impl Iterator<Item = Quad> + '_ {
        Role::ALL.into_iter().flat_map(move |role| {
            self.sorted_entries(role)
                .into_iter()
                .map(move |(term, count)| faceted_quad(term, count, role))
        })
    }

    /// Rebuilds an index from statements produced by [Index::as_faceted_statements].
    ///
    /// The statement count is restored from the predicate cardinalities, as every counted statement
    /// has exactly one predicate.
    pub fn from_faceted_statements(
        statements: impl IntoIterator<Item = Quad>,
    ) -> Result<Self, IndexError> {
        let mut index = Index::default();
        for quad in statements {
            let role = match &quad.graph_name {
                GraphName::NamedNode(node) => Role::from_facet(node.as_ref()),
                GraphName::BlankNode(_) | GraphName::DefaultGraph => None,
            }
            .ok_or_else(|| IndexError::UnknownFacet(quad.graph_name.to_string()))?;
            if quad.predicate != owl::CARDINALITY {
                return Err(IndexError::UnexpectedPredicate(quad.predicate.into_string()));
            }
            let count = parse_count(&quad.object)?;
            let term = subject_node(quad.subject.as_ref())
                .ok_or_else(|| IndexError::InvalidTerm(quad.subject.to_string()))?;
            match (role, term) {
                (Role::Subject, term) => increment(&mut index.subjects, term, count),
                (Role::Object, term) => increment(&mut index.objects, term, count),
                (Role::Graph, term) => increment(&mut index.graphs, term, count),
                (Role::Predicate, NamedOrBlankNode::NamedNode(node)) => {
                    index.triples = index.triples.saturating_add(count);
                    increment(&mut index.predicates, node, count);
                }
                (Role::Predicate, NamedOrBlankNode::BlankNode(node)) => {
                    return Err(IndexError::InvalidTerm(node.to_string()));
                }
            }
        }
        Ok(index)
    }

    fn sorted_entries(&self, role: Role) -> Vec<(Subject, u64)> {
        let mut entries: Vec<(Subject, u64)> = match role {
            Role::Predicate => self
                .predicates
                .iter()
                .map(|(term, count)| (term.clone().into(), *count))
                .collect(),
            Role::Subject => node_entries(&self.subjects),
            Role::Object => node_entries(&self.objects),
            Role::Graph => node_entries(&self.graphs),
        };
        entries.sort_by_cached_key(|(term, _)| term.to_string());
        entries
    }
}

fn node_entries(counts: &FxHashMap<NamedOrBlankNode, u64>) -> Vec<(Subject, u64)> {
    counts
        .iter()
        .map(|(term, count)| (term.clone().into(), *count))
        .collect()
}

fn faceted_quad(term: Subject, count: u64, role: Role) -> Quad {
    Quad::new(
        term,
        owl::CARDINALITY,
        Literal::new_typed_literal(count.to_string(), xsd::INTEGER),
        role.facet().into_owned(),
    )
}

fn parse_count(object: &Term) -> Result<u64, IndexError> {
    let invalid = || IndexError::InvalidCount(object.to_string());
    let Term::Literal(literal) = object else {
        return Err(invalid());
    };
    match literal.value().parse::<u64>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(invalid()),
    }
}

fn increment<K: Eq + Hash>(counts: &mut FxHashMap<K, u64>, key: K, by: u64) {
    let count = counts.entry(key).or_insert(0);
    *count = count.saturating_add(by);
}

fn merge_counts<K: Eq + Hash>(into: &mut FxHashMap<K, u64>, from: FxHashMap<K, u64>) {
    for (key, count) in from {
        increment(into, key, count);
    }
}

#[allow(
    unreachable_patterns,
    reason = "Quoted triples only exist with the rdf-star feature of oxrdf"
)]
fn subject_node(subject: SubjectRef<'_>) -> Option<NamedOrBlankNode> {
    match subject {
        SubjectRef::NamedNode(node) => Some(node.into_owned().into()),
        SubjectRef::BlankNode(node) => Some(node.into_owned().into()),
        _ => None,
    }
}

#[allow(
    unreachable_patterns,
    reason = "Quoted triples only exist with the rdf-star feature of oxrdf"
)]
fn object_node(object: TermRef<'_>) -> Option<NamedOrBlankNode> {
    match object {
        TermRef::NamedNode(node) => Some(node.into_owned().into()),
        TermRef::BlankNode(node) => Some(node.into_owned().into()),
        _ => None,
    }
}
