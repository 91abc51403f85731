//! HTTP API call tool body — validates a request description, performs it,
//! and renders the outcome as text.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::types::{ToolsError, ToolsResult};

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// HTTP verbs the tool accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Validated arguments of one API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCallRequest {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ApiCallRequest {
    /// Parse and validate raw tool arguments.
    pub fn from_value(args: Value) -> ToolsResult<Self> {
        let request: ApiCallRequest = serde_json::from_value(args)
            .map_err(|e| ToolsError::InvalidArguments(e.to_string()))?;
        request.parsed_url()?;
        Ok(request)
    }

    pub fn parsed_url(&self) -> ToolsResult<Url> {
        Url::parse(&self.url).map_err(|e| ToolsError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }

    fn header_map(&self) -> ToolsResult<HeaderMap> {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in self.headers.iter().flatten() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ToolsError::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| ToolsError::InvalidHeader(name.clone()))?;
            map.insert(header_name, header_value);
        }

        Ok(map)
    }
}

/// Outcome of a completed HTTP exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub reason: String,
    /// Parsed JSON body, or the raw text as a JSON string when it is not JSON.
    pub body: Value,
}

/// Build the HTTP client used for API calls.
pub fn http_client() -> ToolsResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .build()?;
    Ok(client)
}

/// Perform the HTTP call described by `request`.
pub async fn call_api(
    client: &reqwest::Client,
    request: &ApiCallRequest,
) -> ToolsResult<ApiResponse> {
    if request.method == HttpMethod::Get && request.body.is_some() {
        return Err(ToolsError::BodyNotAllowed(request.method));
    }

    let url = request.parsed_url()?;
    let mut builder = client
        .request(request.method.as_reqwest(), url)
        .headers(request.header_map()?);
    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    tracing::debug!("api_call {} {}", request.method, request.url);

    let response = builder.send().await?;
    let status = response.status();
    let text = response.text().await?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

    Ok(ApiResponse {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        body,
    })
}

/// Render a completed call the way callers see it.
pub fn render_response(response: &ApiResponse) -> String {
    let pretty = serde_json::to_string_pretty(&response.body).unwrap_or_else(|e| e.to_string());
    format!(
        "API Call Result:\nStatus: {} {}\nResponse: {pretty}",
        response.status, response.reason
    )
}

/// Render a call that never produced a response.
pub fn render_failure(error: &ToolsError) -> String {
    format!("API Call Failed: {error}")
}
