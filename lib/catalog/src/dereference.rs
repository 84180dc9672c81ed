use crate::error::DereferenceError;
use async_trait::async_trait;
use podstats_model::{rdf_format_for_path, Quad, RdfFormat, RdfParser, RDF_MEDIA_TYPES};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// The statements of a dereferenced document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// The URL the document has been retrieved from, after redirects and without fragment.
    pub url: String,
    pub quads: Vec<Quad>,
}

/// Retrieves and parses the RDF document identified by a URL.
#[async_trait]
pub trait Dereferencer: Send + Sync {
    async fn dereference(&self, url: &str) -> Result<Document, DereferenceError>;
}

/// Serves documents from a local mirror of the pods published below a base URL.
///
/// Pod servers negotiate the serialization of a document, hence `{base}/profile/card` is served from
/// `profile/card` if it exists, and otherwise from the first of `profile/card.nq`,
/// `profile/card.ttl`, ... that exists.
#[derive(Debug, Clone)]
pub struct LocalDereferencer {
    base: String,
    root: PathBuf,
}

impl LocalDereferencer {
    const EXTENSIONS: [&'static str; 6] = ["nq", "ttl", "trig", "nt", "n3", "rdf"];

    /// Mirrors the documents below `base` with the files below `root`.
    pub fn new(base: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_owned(),
            root: root.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn locate(&self, url: &str) -> Result<(PathBuf, RdfFormat), DereferenceError> {
        let outside = || DereferenceError::OutsideMirror {
            url: url.to_owned(),
            base: self.base.clone(),
        };
        let relative = url
            .strip_prefix(&self.base)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(outside)?
            .trim_start_matches('/');
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            return Err(outside());
        }

        let path = self.root.join(relative);
        if path.is_file() {
            return rdf_format_for_path(&path)
                .map(|format| (path, format))
                .ok_or_else(|| DereferenceError::UnsupportedFormat {
                    url: url.to_owned(),
                });
        }
        Self::EXTENSIONS
            .into_iter()
            .find_map(|extension| {
                let mut candidate = OsString::from(path.as_os_str());
                candidate.push(".");
                candidate.push(extension);
                let candidate = PathBuf::from(candidate);
                let format = rdf_format_for_path(&candidate)?;
                candidate.is_file().then_some((candidate, format))
            })
            .ok_or_else(|| DereferenceError::NotFound {
                url: url.to_owned(),
            })
    }

    fn load(&self, url: &str) -> Result<Document, DereferenceError> {
        let (path, format) = self.locate(url)?;
        debug!(url, path = %path.display(), "Dereferencing from local mirror");
        let file = File::open(&path).map_err(|source| DereferenceError::Io {
            path: path.clone(),
            source,
        })?;
        parse_document(url, format, BufReader::new(file))
    }
}

#[async_trait]
impl Dereferencer for LocalDereferencer {
    async fn dereference(&self, url: &str) -> Result<Document, DereferenceError> {
        let url = document_url(url).to_owned();
        let mirror = self.clone();
        tokio::task::spawn_blocking(move || mirror.load(&url))
            .await
            .map_err(|error| DereferenceError::Io {
                path: self.root.clone(),
                source: io::Error::other(error),
            })?
    }
}

/// Retrieves documents over HTTP, asking for any RDF serialization.
#[derive(Debug, Clone, Default)]
pub struct HttpDereferencer {
    client: Client,
}

impl HttpDereferencer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Dereferencer for HttpDereferencer {
    async fn dereference(&self, url: &str) -> Result<Document, DereferenceError> {
        let url = document_url(url);
        let http_error = |source| DereferenceError::Http {
            url: url.to_owned(),
            source,
        };
        debug!(url, "Dereferencing over HTTP");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, RDF_MEDIA_TYPES)
            .send()
            .await
            .map_err(http_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DereferenceError::NotFound {
                url: url.to_owned(),
            });
        }
        let response = response.error_for_status().map_err(http_error)?;

        let location = response.url().clone();
        let format = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .and_then(|media_type| RdfFormat::from_media_type(media_type.trim()))
            .or_else(|| rdf_format_for_path(Path::new(location.path())))
            .ok_or_else(|| DereferenceError::UnsupportedFormat {
                url: location.to_string(),
            })?;
        let body = response.bytes().await.map_err(http_error)?;
        parse_document(document_url(location.as_str()), format, body.as_ref())
    }
}

pub(crate) fn document_url(url: &str) -> &str {
    url.split_once('#').map_or(url, |(document, _)| document)
}

fn parse_document(
    url: &str,
    format: RdfFormat,
    reader: impl Read,
) -> Result<Document, DereferenceError> {
    let parser = RdfParser::from_format(format)
        .with_base_iri(url)
        .map_err(|_| DereferenceError::InvalidUrl(url.to_owned()))?;
    let quads = parser
        .for_reader(reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DereferenceError::Parse {
            url: url.to_owned(),
            source,
        })?;
    Ok(Document {
        url: url.to_owned(),
        quads,
    })
}
