use oxrdfio::RdfFormat;
use std::ffi::OsStr;
use std::path::Path;

/// The media types sent in `Accept` headers when dereferencing RDF documents, most preferred first.
pub const RDF_MEDIA_TYPES: &str = "application/n-quads,text/turtle;q=0.9,application/trig;q=0.9,application/n-triples;q=0.8,application/rdf+xml;q=0.5,text/n3;q=0.5";

/// Guesses the [RdfFormat] of a document from the extension of its `path`.
///
/// Returns [None] if the path has no extension or if the extension does not belong to a known RDF
/// serialization.
pub fn rdf_format_for_path(path: &Path) -> Option<RdfFormat> {
    let ext = path.extension().and_then(OsStr::to_str)?;
    RdfFormat::from_extension(&ext.to_ascii_lowercase())
}
