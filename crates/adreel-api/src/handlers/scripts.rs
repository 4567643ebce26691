//! Script generation handlers.

use adreel_models::{Script, ScriptRecord, ScriptResolution};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Request body for the generation endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 2000))]
    pub campaign_idea: String,
}

/// A stored script.
#[derive(Debug, Serialize)]
pub struct ScriptResponse {
    pub id: Uuid,
    pub campaign_idea: String,
    pub script: Script,
}

impl From<ScriptRecord> for ScriptResponse {
    fn from(record: ScriptRecord) -> Self {
        Self {
            id: record.id,
            campaign_idea: record.campaign_idea,
            script: record.script,
        }
    }
}

/// A script with a stock clip mapped to every scene.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub id: Uuid,
    pub campaign_idea: String,
    pub script: Script,
    pub clips: ScriptResolution,
    pub found: usize,
    pub not_found: usize,
}

/// Generate a script and persist it.
pub async fn generate_script(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<ScriptResponse>> {
    let record = create_script(&state, request).await?;
    Ok(Json(record.into()))
}

/// Generate a script and resolve a clip for each scene.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let record = create_script(&state, request).await?;
    let clips = state.resolver.resolve(&record.script).await;

    info!(
        script_id = %record.id,
        found = clips.found_count(),
        not_found = clips.not_found_count(),
        "Resolved clips for script"
    );

    Ok(Json(GenerateResponse {
        found: clips.found_count(),
        not_found: clips.not_found_count(),
        id: record.id,
        campaign_idea: record.campaign_idea,
        script: record.script,
        clips,
    }))
}

/// Fetch a previously generated script.
pub async fn get_script(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ScriptResponse>> {
    let record = state
        .store
        .get(id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found(format!("script {}", id)))?;

    Ok(Json(record.into()))
}

async fn create_script(state: &AppState, request: GenerateRequest) -> ApiResult<ScriptRecord> {
    request.validate()?;

    let idea = request.campaign_idea.trim();
    if idea.is_empty() {
        return Err(ApiError::bad_request("campaign_idea must not be blank"));
    }

    let script = match state.scripts.generate(idea).await {
        Ok(script) => script,
        Err(e) => {
            metrics::record_script_generated("failed");
            warn!(error = %e, "Script generation failed");
            return Err(e.into());
        }
    };
    metrics::record_script_generated("ok");

    let record = ScriptRecord::new(idea, script);
    // A store outage must not lose the generated script for the caller
    if let Err(e) = state.store.save(&record).await {
        warn!(script_id = %record.id, error = %e, "Failed to persist script");
    }

    info!(script_id = %record.id, scenes = record.script.len(), "Generated script");
    Ok(record)
}
