//! regdash-client - REST access to the registration backend
//!
//! Every resource lives under `{base_url}/{path}`:
//!
//! ```text
//! GET    {path}        → [record, ...]   (or {"data": [...]})
//! POST   {path}        → created record
//! PUT    {path}/{id}   → updated record
//! DELETE {path}/{id}   → empty or any JSON
//! ```
//!
//! Failures are never retried here; the caller decides what to surface.

pub mod error;

use std::time::Duration;

use async_trait::async_trait;
use regdash_core::config::ApiConfig;
use regdash_core::{DataSource, Record};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

pub use error::{ClientError, Result};

/// List bodies come either bare or wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<Record>),
    Wrapped { data: Vec<Record> },
}

impl ListBody {
    fn into_records(self) -> Vec<Record> {
        match self {
            Self::Bare(records) | Self::Wrapped { data: records } => records,
        }
    }
}

/// HTTP implementation of [`DataSource`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    /// Client with the default timeout and certificate checks on
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, ApiConfig::default().timeout(), false)
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::with_options(&config.base_url, config.timeout(), config.insecure)
    }

    pub fn with_options(base_url: &str, timeout: Duration, insecure: bool) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|source| ClientError::Url {
            url: base_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::CannotBeBase(base_url.to_string()));
        }

        let mut builder = Client::builder().timeout(timeout);
        if insecure {
            warn!("TLS certificate verification disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(ClientError::Build)?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/{path}[/{id}]` with every segment percent-encoded
    pub fn endpoint(&self, path: &str, id: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::CannotBeBase(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Record>) -> Result<String> {
        debug!(%method, %url, "request");
        let mut request = self.client.request(method, url.clone());
        if let Some(record) = body {
            request = request.json(record);
        }

        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        handle_response(response).await
    }

    pub async fn list(&self, path: &str) -> Result<Vec<Record>> {
        let url = self.endpoint(path, None)?;
        let text = self.send(Method::GET, url.clone(), None).await?;
        let body: ListBody = decode(&url, &text)?;
        let records = body.into_records();
        debug!(path, count = records.len(), "fetched records");
        Ok(records)
    }

    pub async fn post(&self, path: &str, record: &Record) -> Result<Record> {
        let url = self.endpoint(path, None)?;
        let text = self.send(Method::POST, url.clone(), Some(record)).await?;
        returned_record(&url, &text)
    }

    pub async fn put(&self, path: &str, id: &str, record: &Record) -> Result<Record> {
        let url = self.endpoint(path, Some(id))?;
        let text = self.send(Method::PUT, url.clone(), Some(record)).await?;
        returned_record(&url, &text)
    }

    pub async fn remove(&self, path: &str, id: &str) -> Result<()> {
        let url = self.endpoint(path, Some(id))?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }
}

/// Success bodies come back as text; anything else becomes `ClientError::Http`
/// carrying the server's `error`/`message` field when there is one.
async fn handle_response(response: Response) -> Result<String> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response
        .text()
        .await
        .map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;

    if status.is_success() {
        return Ok(text);
    }

    let body = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or(text),
        Err(_) if text.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        Err(_) => text,
    };

    Err(ClientError::Http {
        status: status.as_u16(),
        url,
        body,
    })
}

fn decode<T: DeserializeOwned>(url: &Url, text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|source| ClientError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Some endpoints answer writes with a status message instead of the row;
/// those come back as an empty record.
fn returned_record(url: &Url, text: &str) -> Result<Record> {
    if text.trim().is_empty() {
        return Ok(Record::new());
    }
    match decode::<serde_json::Value>(url, text)? {
        json @ serde_json::Value::Object(_) => {
            serde_json::from_value(json).map_err(|source| ClientError::Decode {
                url: url.to_string(),
                source,
            })
        }
        _ => Ok(Record::new()),
    }
}

#[async_trait]
impl DataSource for ApiClient {
    async fn fetch_records(&self, path: &str) -> regdash_core::Result<Vec<Record>> {
        Ok(self.list(path).await?)
    }

    async fn create(&self, path: &str, record: &Record) -> regdash_core::Result<Record> {
        Ok(self.post(path, record).await?)
    }

    async fn update(&self, path: &str, id: &str, record: &Record) -> regdash_core::Result<Record> {
        Ok(self.put(path, id, record).await?)
    }

    async fn delete(&self, path: &str, id: &str) -> regdash_core::Result<()> {
        Ok(self.remove(path, id).await?)
    }
}
