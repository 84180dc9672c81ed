use crate::error::PublishError;
use crate::index::Index;
use podstats_model::{rdf_format_for_path, RdfSerializer};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Writes [Index::as_faceted_statements] to `path`.
///
/// The serialization is chosen from the extension of `path` and has to support named graphs, as
/// the role of each statement is encoded as its graph name.
pub fn write_faceted(index: &Index, path: &Path) -> Result<(), PublishError> {
    let format = rdf_format_for_path(path)
        .filter(|format| format.supports_datasets())
        .ok_or_else(|| PublishError::UnknownFormat {
            path: path.to_path_buf(),
        })?;
    let io_error = |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let file = File::create(path).map_err(io_error)?;
    let mut serializer = RdfSerializer::from_format(format).for_writer(BufWriter::new(file));
    for quad in index.as_faceted_statements() {
        serializer.serialize_quad(&quad).map_err(io_error)?;
    }
    serializer
        .finish()
        .and_then(|writer| writer.into_inner().map_err(|e| e.into_error()))
        .map_err(io_error)?;
    debug!(path = %path.display(), terms = index.size(), "Wrote faceted cardinalities");
    Ok(())
}
