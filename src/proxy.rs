//! Fetch-and-relay for the interactive "try it" playground.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use health_checker::parse_target;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::PROXY_USER_AGENT;
use crate::error::ApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
    pub response_time: u64,
}

pub async fn proxy(
    State(state): State<AppState>,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> Result<Json<ProxyResponse>, ApiError> {
    let Query(query) = query?;
    let raw_url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing 'url' parameter".to_string()))?;

    let url = parse_target(&raw_url).map_err(|_| {
        ApiError::BadRequest("Invalid URL. Must start with http:// or https://".to_string())
    })?;

    debug!(%url, "proxying request");
    let start = Instant::now();

    let response = state
        .proxy_client
        .get(url.clone())
        .header(USER_AGENT, PROXY_USER_AGENT)
        .header(ACCEPT, "application/json, text/plain, */*")
        .timeout(state.proxy_timeout)
        .send()
        .await
        .map_err(|e| upstream_error(&e, &url, state.proxy_timeout))?;

    let response_time = start.elapsed().as_millis() as u64;
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = response
        .text()
        .await
        .map_err(|e| upstream_error(&e, &url, state.proxy_timeout))?;

    // Many APIs mislabel their content type, so try JSON first regardless.
    let data = match serde_json::from_str::<Value>(&body) {
        Ok(json) => json,
        Err(_) => Value::String(body),
    };

    // hyper does not expose the upstream reason phrase; use the canonical one.
    Ok(Json(ProxyResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        data,
        response_time,
    }))
}

fn upstream_error(err: &reqwest::Error, url: &reqwest::Url, timeout: Duration) -> ApiError {
    warn!(%url, error = %err, "proxy request failed");

    if err.is_timeout() {
        return ApiError::Upstream {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: format!("Request timed out after {}ms", timeout.as_millis()),
        };
    }

    if err.is_connect() {
        let host = url.host_str().unwrap_or_default();
        let message = if is_dns_failure(err) {
            format!("Could not resolve host: {host}")
        } else {
            "Connection refused by target server".to_string()
        };
        return ApiError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message,
        };
    }

    ApiError::Upstream {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Failed to fetch from target API".to_string(),
    }
}

fn is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let message = e.to_string().to_lowercase();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = e.source();
    }
    false
}
