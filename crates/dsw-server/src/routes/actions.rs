use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dsw_core::{Action, ApiResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub actions: BTreeMap<String, Action>,
}

/// GET /actions: the action snapshot loaded at startup.
pub async fn list_actions(State(app): State<AppState>) -> Json<ActionsResponse> {
    Json(ActionsResponse {
        actions: app.actions.as_ref().clone(),
    })
}

/// POST /execute/{name}: run an action and report the outcome.
///
/// 200 when the command succeeded, 500 for any execution failure (timeout,
/// non-zero exit, spawn error); the body tells them apart. The run happens
/// in its own task, so a client that hangs up does not cancel it.
pub async fn execute_action(
    State(app): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse>), AppError> {
    let action = app
        .actions
        .get(&name)
        .cloned()
        .ok_or_else(|| AppError::action_not_found(&name))?;

    tracing::info!(name = %name, command = %action.command, "executing action");

    let executor = app.executor.clone();
    let result = tokio::spawn(async move { executor.execute(&action).await })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;

    tracing::info!(
        name = %name,
        success = result.success,
        duration_ms = result.duration_ms,
        "action completed"
    );

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(result)))
}
