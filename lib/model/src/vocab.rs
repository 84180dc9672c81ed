//! Vocabularies used by the statistics documents and the discovery of statistics documents.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

/// [VoID](https://www.w3.org/TR/void/) vocabulary.
pub mod void {
    use oxrdf::NamedNodeRef;

    /// The class of datasets.
    pub const DATASET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#Dataset");
    /// The total number of triples contained in a dataset.
    pub const TRIPLES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#triples");
    /// The total number of distinct subjects in a dataset.
    pub const DISTINCT_SUBJECTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#distinctSubjects");
    /// The total number of distinct objects in a dataset.
    pub const DISTINCT_OBJECTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#distinctObjects");
    /// The total number of distinct properties in a dataset.
    pub const PROPERTIES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#properties");
    /// Links a dataset to one of its property-based partitions.
    pub const PROPERTY_PARTITION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#propertyPartition");
}

/// [OWL](https://www.w3.org/TR/owl2-overview/) terms.
pub mod owl {
    use oxrdf::NamedNodeRef;

    /// Used to attach a term's cardinality in faceted cardinality exports.
    pub const CARDINALITY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#cardinality");
}

/// Graph names tagging the statement role of a faceted cardinality statement.
pub mod facet {
    use oxrdf::NamedNodeRef;

    pub const SUBJECT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("urn:podstats:facet:subject");
    pub const PREDICATE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("urn:podstats:facet:predicate");
    pub const OBJECT: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("urn:podstats:facet:object");
    pub const GRAPH: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("urn:podstats:facet:graph");
}

/// Convention predicates advertising statistics documents of a pod.
pub mod discovery {
    use oxrdf::NamedNodeRef;

    /// Advertises a publicly readable cardinality index.
    pub const PUBLIC_CARDINALITY_INDEX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://example.org/terms#publicCardinalityIndex");
    /// Advertises a cardinality index that requires authentication.
    pub const PRIVATE_CARDINALITY_INDEX: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://example.org/terms#privateCardinalityIndex");
}
