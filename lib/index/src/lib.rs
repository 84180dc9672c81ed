//! Offline side of the pod statistics: counting term cardinalities of a pod and publishing them as
//! a discoverable [VoID](https://www.w3.org/TR/void/) document.
//!
//! ```
//! use podstats_index::{Index, Role};
//! use podstats_model::{GraphNameRef, NamedNodeRef, QuadRef};
//!
//! let ex = NamedNodeRef::new_unchecked("http://example.com/s");
//! let p = NamedNodeRef::new_unchecked("http://example.com/p");
//!
//! let mut index = Index::default();
//! index.add(QuadRef::new(ex, p, ex, GraphNameRef::DefaultGraph));
//! index.add(QuadRef::new(ex, p, ex, GraphNameRef::DefaultGraph));
//!
//! assert_eq!(index.triples(), 2);
//! assert_eq!(index.count(Role::Predicate, p), 2);
//! ```

mod dataset;
pub mod error;
mod export;
mod index;
mod publisher;
mod scanner;

pub use dataset::{Dataset, DatasetTemplate};
pub use export::write_faceted;
pub use index::{Index, Role};
pub use publisher::{LinkOutcome, PublishReport, Publisher, PublisherOptions};
pub use scanner::{Scanner, UnknownFilePolicy};
