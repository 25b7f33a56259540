use std::fmt::{self, Debug, Display, Formatter};
use std::time::Duration;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

const AGENT_STRING: &str = concat!("dreamhost-dns/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const DREAMHOST_BASE_URL: &str = "https://api.dreamhost.com/";

/// `data` value the API answers with when a `unique_id` has already been
/// processed. The earlier request carrying that id already made the change.
pub const UNIQUE_ID_ALREADY_USED: &str = "unique_id_already_used";

const CMD_ADD_RECORD: &str = "dns-add_record";
const CMD_REMOVE_RECORD: &str = "dns-remove_record";
const RESULT_SUCCESS: &str = "success";

/// Client for creating and deleting records with the DreamHost DNS API.
///
/// References:
/// - <https://help.dreamhost.com/hc/en-us/articles/4407354972692-Connecting-to-the-DreamHost-API>
/// - <https://help.dreamhost.com/hc/en-us/articles/217555707-DNS-API-commands>
#[derive(Clone)]
pub struct DreamhostClient {
    api_key: String,
    client: Client,
    base_url: Url,
}

impl DreamhostClient {
    /// Creates a client.
    ///
    /// Without an HTTP client a default one with a 15 second timeout is built.
    /// A missing or empty `base_url` falls back to [`DREAMHOST_BASE_URL`].
    pub fn new(
        api_key: impl Into<String>,
        client: Option<Client>,
        base_url: Option<&str>,
    ) -> Result<Self, DreamhostError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(DreamhostError::EmptyApiKey);
        }

        let client = match client {
            Some(client) => client,
            None => Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .map_err(DreamhostError::BuildClient)?,
        };

        let base_url = base_url
            .filter(|u| !u.is_empty())
            .unwrap_or(DREAMHOST_BASE_URL);
        // The URL parser strips or percent-encodes these instead of failing.
        if base_url.chars().any(char::is_control) {
            return Err(DreamhostError::ControlCharInUrl);
        }
        let base_url = Url::parse(base_url).map_err(DreamhostError::BadBaseUrl)?;
        if base_url.cannot_be_a_base() {
            return Err(DreamhostError::CannotBeABase);
        }

        Ok(Self {
            api_key,
            client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Creates a DNS record. A `unique_id` may be given to make retries idempotent.
    ///
    /// Example request:
    /// `https://api.dreamhost.com/?key=1A2B3C4D5E6F7G8H&cmd=dns-add_record&format=json&unique_id=123456&record=example.com&type=TXT&value=test123`
    #[tracing::instrument(skip(self))]
    pub async fn create_record(
        &self,
        record: &DnsRecordValue,
        unique_id: Option<&str>,
    ) -> Result<(), DreamhostError> {
        let result = self.send_request(record, CMD_ADD_RECORD, unique_id).await;
        suppress_unique_id_used(result)
    }

    /// Deletes a DNS record. A `unique_id` may be given to make retries idempotent.
    ///
    /// Example request:
    /// `https://api.dreamhost.com/?key=1A2B3C4D5E6F7G8H&cmd=dns-remove_record&format=json&unique_id=123456&record=example.com&type=TXT&value=test123`
    #[tracing::instrument(skip(self))]
    pub async fn delete_record(
        &self,
        record: &DnsRecordValue,
        unique_id: Option<&str>,
    ) -> Result<(), DreamhostError> {
        let result = self.send_request(record, CMD_REMOVE_RECORD, unique_id).await;
        suppress_unique_id_used(result)
    }

    async fn send_request(
        &self,
        record: &DnsRecordValue,
        cmd: &str,
        unique_id: Option<&str>,
    ) -> Result<DreamhostResponse, DreamhostError> {
        record.validate()?;
        let url = self.endpoint(record, cmd, unique_id);

        // The key travels in the query string, so urls are stripped from transport errors.
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, AGENT_STRING)
            .send()
            .await
            .map_err(|e| DreamhostError::Request(e.without_url()))?;

        // The API reports most failures with a 200 and an error result.
        let status = resp.status();
        if !status.is_success() {
            return Err(DreamhostError::UnexpectedStatus(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| DreamhostError::ReadBody(e.without_url()))?;
        // A `null` body decodes to an empty, and so non-successful, response.
        let api_resp = serde_json::from_str::<Option<DreamhostResponse>>(&body)
            .map_err(DreamhostError::Parse)?
            .unwrap_or_default();

        debug!(response = %api_resp, "got response from DreamHost");

        if api_resp.result != RESULT_SUCCESS {
            return Err(DreamhostError::Unsuccessful(api_resp));
        }

        Ok(api_resp)
    }

    fn endpoint(&self, record: &DnsRecordValue, cmd: &str, unique_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();

        let path = format!("{}/", url.path().trim_end_matches('/'));
        url.set_path(&path);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("key", &self.api_key)
                .append_pair("cmd", cmd)
                .append_pair("format", "json");
            if let Some(unique_id) = unique_id.filter(|id| !id.is_empty()) {
                query.append_pair("unique_id", unique_id);
            }
            for (name, value) in record.query_pairs() {
                query.append_pair(name, value);
            }
        }

        url
    }
}

impl Debug for DreamhostClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DreamhostClient")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

/// Treats an already used `unique_id` as success: the caller's intent was
/// fulfilled by an earlier request.
fn suppress_unique_id_used(
    result: Result<DreamhostResponse, DreamhostError>,
) -> Result<(), DreamhostError> {
    match result {
        Ok(_) => Ok(()),
        Err(DreamhostError::Unsuccessful(resp)) if resp.data == UNIQUE_ID_ALREADY_USED => {
            info!(reason = %resp.reason, "unique_id already used, request was already fulfilled");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// A single record name/type/value triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsRecordValue {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

impl DnsRecordValue {
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
        }
    }

    fn validate(&self) -> Result<(), DreamhostError> {
        if self.name.is_empty() {
            return Err(DreamhostError::EmptyField(RecordField::Name));
        }
        // Whether the type is one DreamHost supports is left to the API.
        if self.record_type.is_empty() {
            return Err(DreamhostError::EmptyField(RecordField::RecordType));
        }
        if self.value.is_empty() {
            return Err(DreamhostError::EmptyField(RecordField::Value));
        }
        Ok(())
    }

    fn query_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("record", &self.name),
            ("type", &self.record_type),
            ("value", &self.value),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Name,
    RecordType,
    Value,
}

impl Display for RecordField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RecordField::Name => f.write_str("name"),
            RecordField::RecordType => f.write_str("record type"),
            RecordField::Value => f.write_str("value"),
        }
    }
}

/// Decoded DreamHost API response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DreamhostResponse {
    pub result: String,
    pub data: String,
    pub reason: String,
}

impl Display for DreamhostResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "result={} data={} reason={}",
            self.result, self.data, self.reason
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client construction failed.
    Configuration,
    /// A record field was empty; nothing was sent.
    Validation,
    /// The request never got a response.
    Transport,
    /// Unexpected status code or unreadable body.
    Protocol,
    /// The API answered with a non-successful result.
    Application,
}

#[derive(Debug, Error)]
pub enum DreamhostError {
    #[error("empty api key")]
    EmptyApiKey,
    #[error("failed to parse URL: {0}")]
    BadBaseUrl(#[source] url::ParseError),
    #[error("base url contains a control character")]
    ControlCharInUrl,
    #[error("bad base url")]
    CannotBeABase,
    #[error("failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),
    #[error("DNS record {0} must not be empty")]
    EmptyField(RecordField),
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("dreamhost API returned unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("failed to read HTTP body: {0}")]
    ReadBody(#[source] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("dreamhost API returned non-successful result: {0}")]
    Unsuccessful(DreamhostResponse),
}

impl DreamhostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DreamhostError::EmptyApiKey
            | DreamhostError::BadBaseUrl(_)
            | DreamhostError::ControlCharInUrl
            | DreamhostError::CannotBeABase
            | DreamhostError::BuildClient(_) => ErrorKind::Configuration,
            DreamhostError::EmptyField(_) => ErrorKind::Validation,
            DreamhostError::Request(_) => ErrorKind::Transport,
            DreamhostError::UnexpectedStatus(_)
            | DreamhostError::ReadBody(_)
            | DreamhostError::Parse(_) => ErrorKind::Protocol,
            DreamhostError::Unsuccessful(_) => ErrorKind::Application,
        }
    }
}
