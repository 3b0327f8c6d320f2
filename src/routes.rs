use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use health_checker::{parse_target, HealthCheckResult, HealthMonitor, HealthStatus, RegistryStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, FieldIssue};
use crate::proxy;

pub const MAX_BULK_IDS: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub monitor: HealthMonitor,
    pub registry: Arc<dyn RegistryStore>,
    pub proxy_client: reqwest::Client,
    pub proxy_timeout: Duration,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/validate", post(validate))
        .route("/validate-bulk", post(validate_bulk))
        .route("/proxy", get(proxy::proxy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub api_id: String,
    #[serde(default)]
    pub base_url: String,
}

impl ValidateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut issues = Vec::new();
        if self.api_id.trim().is_empty() {
            issues.push(FieldIssue::new("apiId", "must not be empty"));
        }
        if parse_target(&self.base_url).is_err() {
            issues.push(FieldIssue::new("baseUrl", "must be a valid http or https URL"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(issues))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: HealthCheckResult,
}

async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let result = state
        .monitor
        .check_target(&request.base_url, None)
        .await
        .map_err(|e| ApiError::Validation(vec![FieldIssue::new("baseUrl", e.to_string())]))?;

    info!(
        api_id = %request.api_id,
        status = %result.status,
        status_code = result.status_code,
        response_time_ms = result.response_time,
        "validated API"
    );

    Ok(Json(ValidateResponse { success: true, result }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkValidateRequest {
    #[serde(default)]
    pub api_ids: Vec<String>,
}

impl BulkValidateRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut issues = Vec::new();
        if self.api_ids.is_empty() {
            issues.push(FieldIssue::new("apiIds", "must contain at least 1 item"));
        }
        if self.api_ids.len() > MAX_BULK_IDS {
            issues.push(FieldIssue::new(
                "apiIds",
                format!("must contain at most {MAX_BULK_IDS} items"),
            ));
        }
        for (i, id) in self.api_ids.iter().enumerate() {
            if id.is_empty() {
                issues.push(FieldIssue::new(format!("apiIds.{i}"), "must not be empty"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(issues))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResultItem {
    pub api_id: String,
    pub status: HealthStatus,
    pub response_time: u64,
}

#[derive(Debug, Serialize)]
pub struct BulkValidateResponse {
    pub success: bool,
    pub results: Vec<BulkResultItem>,
    pub timestamp: DateTime<Utc>,
}

async fn validate_bulk(
    State(state): State<AppState>,
    payload: Result<Json<BulkValidateRequest>, JsonRejection>,
) -> Result<Json<BulkValidateResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let mut targets = Vec::with_capacity(request.api_ids.len());
    for id in &request.api_ids {
        if let Some(entry) = state.registry.get(id).await? {
            targets.push(entry.target());
        }
    }

    if targets.is_empty() {
        return Err(ApiError::BadRequest("No valid APIs found".to_string()));
    }

    let results = state.monitor.check_bulk(&targets).await;
    info!(
        requested = request.api_ids.len(),
        checked = results.len(),
        "bulk validation finished"
    );

    Ok(Json(BulkValidateResponse {
        success: true,
        results: results
            .into_iter()
            .map(|r| BulkResultItem {
                api_id: r.api_id,
                status: r.result.status,
                response_time: r.result.response_time,
            })
            .collect(),
        timestamp: Utc::now(),
    }))
}
