use std::sync::RwLock;

use reqwest::blocking::{RequestBuilder, Response};
use serde_json::Value;

use super::{unwrap_data, unwrap_list, Backend, BackendError, Resource, STATS_PATH};
use crate::config::ClientConfig;
use crate::models::DashboardStats;

/// REST client for the hospital backend.
///
/// The session token, when set, is sent as a bearer token on every call.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs: config.timeout.as_secs(),
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: &str) -> Self {
        Backend::set_token(&self, Some(token.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Collection URL plus the id as one percent-encoded path segment.
    fn record_url(&self, resource: Resource, id: &str) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.url(resource.path()))
            .map_err(|e| BackendError::HttpClient(format!("invalid backend URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::HttpClient(format!("{} cannot take a path", self.base_url)))?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorize(request).send().map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                BackendError::Connection(self.base_url.clone())
            } else {
                BackendError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            let url = response.url().to_string();
            return Err(BackendError::NotFound(url));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a JSON body; an empty body yields `None`.
    fn read_json(&self, response: Response) -> Result<Option<Value>, BackendError> {
        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::ResponseParsing(e.to_string())
            }
        })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }

    /// Write responses may be empty or enveloped; fall back to what was sent.
    fn written(&self, response: Response, sent: &Value) -> Result<Value, BackendError> {
        match self.read_json(response)?.map(unwrap_data) {
            Some(Value::Object(map)) => Ok(Value::Object(map)),
            _ => Ok(sent.clone()),
        }
    }
}

impl Backend for HttpBackend {
    fn list(&self, resource: Resource) -> Result<Vec<Value>, BackendError> {
        let response = self.send(self.client.get(self.url(resource.path())))?;
        let body = self.read_json(response)?.unwrap_or(Value::Array(Vec::new()));
        let items = unwrap_list(body)?;
        tracing::debug!(path = resource.path(), count = items.len(), "Fetched records");
        Ok(items)
    }

    fn create(&self, resource: Resource, body: &Value) -> Result<Value, BackendError> {
        let response = self.send(self.client.post(self.url(resource.path())).json(body))?;
        self.written(response, body)
    }

    fn update(&self, resource: Resource, id: &str, body: &Value) -> Result<Value, BackendError> {
        let response = self.send(self.client.put(self.record_url(resource, id)?).json(body))?;
        self.written(response, body)
    }

    fn patch(&self, resource: Resource, id: &str, changes: &Value) -> Result<Value, BackendError> {
        let response = self.send(self.client.patch(self.record_url(resource, id)?).json(changes))?;
        self.written(response, changes)
    }

    fn delete(&self, resource: Resource, id: &str) -> Result<(), BackendError> {
        self.send(self.client.delete(self.record_url(resource, id)?))?;
        Ok(())
    }

    fn stats(&self) -> Result<DashboardStats, BackendError> {
        let response = self.send(self.client.get(self.url(STATS_PATH)))?;
        match self.read_json(response)? {
            Some(body) => super::decode(unwrap_data(body)),
            None => Ok(DashboardStats::default()),
        }
    }

    fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}
