//! Live session inspection handler

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::SharedSessionRouter;
use crate::domain::LiveSession;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionsResponse {
    pub live_sessions: Vec<LiveSession>,
}

#[utoipa::path(
    get,
    path = "/live-sessions",
    tag = "Sessions",
    responses(
        (status = 200, description = "Active sessions in announcement order", body = LiveSessionsResponse)
    )
)]
pub async fn list_live_sessions(
    State(router): State<SharedSessionRouter>,
) -> Json<LiveSessionsResponse> {
    Json(LiveSessionsResponse {
        live_sessions: router.live_sessions().await,
    })
}
