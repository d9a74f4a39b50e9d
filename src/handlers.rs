// region:    --- Imports
use crate::dashboard::Dashboard;
use crate::error::ScoringError;
use crate::job::RecalculationJob;
use crate::scheduler::RunGate;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- App State
#[derive(Clone)]
pub struct AppState {
    pub job: Arc<RecalculationJob>,
    pub dashboard: Arc<Dashboard>,
    pub gate: RunGate,
}

/// 라우터 설정
pub fn router(state: AppState) -> Router {
    // 어드민 포털을 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/cron/update-performance",
            get(handle_update_performance).post(handle_update_performance),
        )
        .route("/leagues/:league_id/stats", get(handle_league_stats))
        .route(
            "/leagues/:league_id/members/:user_id/score",
            get(handle_member_score),
        )
        .route(
            "/leagues/:league_id/market-average",
            get(handle_market_average),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// endregion: --- App State

// region:    --- Error Response
fn error_response(e: ScoringError) -> Response {
    let status = match &e {
        ScoringError::LeagueNotFound(_) | ScoringError::MemberNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        ScoringError::Authorization => StatusCode::UNAUTHORIZED,
        ScoringError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

// endregion: --- Error Response

// region:    --- Job Handlers
#[derive(Debug, Deserialize)]
pub struct CronParams {
    pub secret: Option<String>,
}

/// Authorization: Bearer 헤더 값
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// 헤더와 ?secret= 파라미터 중 하나라도 일치하면 인증 통과
fn authorize(
    job: &RecalculationJob,
    headers: &HeaderMap,
    params: &CronParams,
) -> Result<(), ScoringError> {
    [bearer(headers), params.secret.as_deref()]
        .into_iter()
        .find_map(|credential| job.authorize(credential).ok())
        .ok_or(ScoringError::Authorization)
}

/// 성과 재계산 수동 트리거
pub async fn handle_update_performance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CronParams>,
) -> impl IntoResponse {
    info!("{:<12} --> 성과 재계산 요청", "Handler");

    // 인증 실패 시 계산 전에 거부
    if let Err(e) = authorize(&state.job, &headers, &params) {
        warn!("{:<12} --> 재계산 요청 인증 실패", "Handler");
        return error_response(e);
    }

    let _guard = state.gate.lock().await;
    match state.job.run(Utc::now()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Job Handlers

// region:    --- Dashboard Handlers

/// 리그 순위표 조회 (실시간 계산)
pub async fn handle_league_stats(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 리그 순위표 조회 id: {}", "Handler", league_id);
    match state
        .dashboard
        .league_standings(league_id, Utc::now().timestamp())
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

/// 사용자 점수 조회 (실시간 계산)
pub async fn handle_member_score(
    State(state): State<AppState>,
    Path((league_id, user_id)): Path<(i64, i64)>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 사용자 점수 조회 league: {}, user: {}",
        "Handler", league_id, user_id
    );
    match state
        .dashboard
        .user_score(league_id, user_id, Utc::now().timestamp())
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

/// 리그 시장 평균 조회
pub async fn handle_market_average(
    State(state): State<AppState>,
    Path(league_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 시장 평균 조회 id: {}", "Handler", league_id);
    match state
        .dashboard
        .market_average(league_id, Utc::now().timestamp())
        .await
    {
        Ok(market) => Json(market).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Dashboard Handlers
