use std::time::Duration;

use async_trait::async_trait;
use flowwatch_protocol::{
    parse_action_response, parse_blocked, parse_flows, ActionKind, ActionRequest, ActionResponse,
    BlockedEntry, FlowRecord, SchemaError, BLOCKED_PATH, DEFAULT_ORIGIN,
    DEFAULT_REQUEST_TIMEOUT_SECS, FLOWS_PATH,
};
use reqwest::Url;
use serde::Serialize;

use crate::api::MonitorApi;
use crate::base_url::BaseUrl;
use crate::error::ClientError;

/// Settings fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Used when the base URL input is empty.
    pub origin: String,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for the monitoring backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: BaseUrl,
    origin: String,
}

impl ApiClient {
    pub fn new(base_url: BaseUrl, settings: ClientSettings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            origin: settings.origin,
        })
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Resolve `path` against the base URL as it reads right now.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base_url.current();
        let root = if base.is_empty() {
            self.origin.trim()
        } else {
            base.as_str()
        };
        let joined = format!("{}{}", root.trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl(format!("{joined}: {e}")))
    }

    /// GET `path` and parse the body as JSON. Non-2xx statuses fail with the body text.
    pub async fn fetch_json(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        let url = self.url(path)?;
        self.get_json(url).await
    }

    /// POST a JSON body to `path` and parse the JSON reply, whatever the status.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<serde_json::Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        tracing::debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "Action endpoint returned non-success status");
        }
        parse_body(&text)
    }

    async fn get_json(&self, url: Url) -> Result<serde_json::Value, ClientError> {
        tracing::debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        parse_body(&text)
    }
}

fn parse_body(text: &str) -> Result<serde_json::Value, ClientError> {
    serde_json::from_str(text).map_err(|e| SchemaError::MalformedJson(e.to_string()).into())
}

#[async_trait]
impl MonitorApi for ApiClient {
    async fn fetch_flows(&self, limit: Option<usize>) -> Result<Vec<FlowRecord>, ClientError> {
        let mut url = self.url(FLOWS_PATH)?;
        if let Some(limit) = limit {
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
        }
        let value = self.get_json(url).await?;
        Ok(parse_flows(value)?)
    }

    async fn fetch_blocked(&self) -> Result<Vec<BlockedEntry>, ClientError> {
        let value = self.fetch_json(BLOCKED_PATH).await?;
        Ok(parse_blocked(value)?)
    }

    async fn post_action(&self, kind: ActionKind, ip: &str) -> Result<ActionResponse, ClientError> {
        let body = ActionRequest { ip: ip.to_string() };
        let value = self.post_json(kind.path(), &body).await?;
        Ok(parse_action_response(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(BaseUrl::new(base), ClientSettings::default()).unwrap()
    }

    #[test]
    fn empty_base_falls_back_to_origin() {
        let c = client("   ");
        assert_eq!(c.url("/flows").unwrap().as_str(), "http://127.0.0.1:5001/flows");
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let c = client("http://monitor.lan:8080/");
        assert_eq!(c.url("/blocked").unwrap().as_str(), "http://monitor.lan:8080/blocked");
    }

    #[test]
    fn base_with_prefix_path_is_kept() {
        let c = client("http://monitor.lan/netmon");
        assert_eq!(
            c.url("/api/block").unwrap().as_str(),
            "http://monitor.lan/netmon/api/block"
        );
    }

    #[test]
    fn base_is_read_at_call_time() {
        let base = BaseUrl::new("http://a:1");
        let c = ApiClient::new(base.clone(), ClientSettings::default()).unwrap();
        assert_eq!(c.url("/flows").unwrap().host_str(), Some("a"));
        base.set("http://b:2");
        assert_eq!(c.url("/flows").unwrap().host_str(), Some("b"));
    }

    #[test]
    fn garbage_base_is_invalid_url() {
        let c = client("not a url");
        assert!(matches!(c.url("/flows"), Err(ClientError::InvalidUrl(_))));
    }
}
