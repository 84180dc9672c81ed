mod format;
pub mod vocab;

pub use format::{rdf_format_for_path, RDF_MEDIA_TYPES};

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject,
    SubjectRef, Term, TermRef, Triple, TripleRef, Variable,
};
pub use oxrdfio::{RdfFormat, RdfParseError, RdfParser, RdfSerializer, RdfSyntaxError};

/// Triple patterns as produced by the SPARQL parser of the query engine.
pub mod pattern {
    pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
}
