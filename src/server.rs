use std::collections::BTreeMap;
use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::allocation::engine::AllocationEngine;
use crate::allocation::{AllocationResult, AllocationState};
use crate::catalog::{Site, SiteCatalog};
use crate::config::{AllocationMode, Config};
use crate::hazard::ej::{ej_index, EjScore, EjSiteMeasure, EjWeights};
use crate::hazard::fractions::hazard_report;
use crate::hazard::{HazardReport, LayerMeasure};
use crate::phases::planner::{auto_durations, phase_reports, plan};
use crate::phases::{PhasePlan, PhaseReport};
use crate::scoring::cost::{cost_index, CostScore, CostWeights};
use crate::scoring::feasibility::{rank_dynamic, rank_static};
use crate::scoring::weights::WeightVector;
use crate::scoring::SiteScore;

#[derive(Clone)]
struct ApiState {
    config: Config,
    catalog: SiteCatalog,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Domain validation failures: structurally valid requests the scoring
    /// core refuses.
    fn unprocessable(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: error.to_string(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Deserialize, Default)]
struct RankRequest {
    weights: Option<WeightVector>,
    threshold: Option<f64>,
    /// With assignments present the capacity criterion turns dynamic and
    /// only assigned sites are ranked.
    assignments: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    threshold: f64,
    scores: Vec<SiteScore>,
}

#[derive(Debug, Clone, Deserialize)]
struct PolicyRequest {
    mode: AllocationMode,
    total_tpd: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct AllocateRequest {
    weights: Option<WeightVector>,
    threshold: Option<f64>,
    policy: Option<PolicyRequest>,
    /// Prior state; defaults to an empty version-0 state.
    state: Option<AllocationState>,
    assignments: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct PhasesRequest {
    assignments: BTreeMap<String, u32>,
    horizon: u32,
    /// Explicit durations win over auto-generation.
    durations: Option<Vec<u32>>,
    n_phases: Option<usize>,
}

#[derive(Debug, Serialize)]
struct PhasesResponse {
    plan: PhasePlan,
    reports: Vec<PhaseReport>,
}

#[derive(Debug, Clone, Deserialize)]
struct HazardRequest {
    layers: Vec<LayerMeasure>,
}

#[derive(Debug, Clone, Deserialize)]
struct EjRequest {
    measures: Vec<EjSiteMeasure>,
    weights: Option<EjWeights>,
}

#[derive(Debug, Serialize)]
struct EjResponse {
    scores: Vec<EjScore>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct CostRequest {
    weights: Option<CostWeights>,
}

#[derive(Debug, Serialize)]
struct CostResponse {
    scores: Vec<CostScore>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct CatalogResponse {
    sites: Vec<Site>,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let catalog = config.load_catalog()?;
    let state = ApiState { config, catalog };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/catalog", get(show_catalog))
        .route("/v1/rank", post(rank))
        .route("/v1/allocate", post(allocate))
        .route("/v1/phases", post(phases))
        .route("/v1/hazard", post(hazard))
        .route("/v1/ej", post(ej))
        .route("/v1/cost", post(cost))
        .route("/v1/config", get(show_config))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn show_catalog(State(state): State<ApiState>) -> Json<ApiResponse<CatalogResponse>> {
    ok(CatalogResponse {
        sites: state.catalog.sites().to_vec(),
    })
}

async fn rank(
    State(state): State<ApiState>,
    Json(request): Json<RankRequest>,
) -> ApiResult<RankResponse> {
    let weights = request.weights.unwrap_or(state.config.weights);
    let threshold = request
        .threshold
        .unwrap_or(state.config.analysis.feasibility_threshold);
    let scores = match &request.assignments {
        Some(assignments) => {
            rank_dynamic(&state.catalog, &weights, assignments).map_err(ApiError::unprocessable)?
        }
        None => rank_static(&state.catalog, &weights).map_err(ApiError::unprocessable)?,
    };
    Ok(ok(RankResponse { threshold, scores }))
}

async fn allocate(
    State(state): State<ApiState>,
    Json(request): Json<AllocateRequest>,
) -> ApiResult<AllocationResult> {
    let weights = request.weights.unwrap_or(state.config.weights);
    let threshold = request
        .threshold
        .unwrap_or(state.config.analysis.feasibility_threshold);
    let policy = match request.policy {
        Some(policy) => crate::config::AllocationConfig {
            mode: policy.mode,
            total_tpd: policy.total_tpd,
        }
        .policy(),
        None => state.config.allocation.policy(),
    };
    let engine = AllocationEngine::new(&state.catalog, &weights, threshold, policy)
        .map_err(ApiError::unprocessable)?;
    let prior = request.state.unwrap_or_default();
    let result = engine
        .allocate(&prior, &request.assignments)
        .map_err(ApiError::unprocessable)?;
    Ok(ok(result))
}

async fn phases(
    State(state): State<ApiState>,
    Json(request): Json<PhasesRequest>,
) -> ApiResult<PhasesResponse> {
    let alloc_state = AllocationState::with_assignments(request.assignments);
    let min_horizon = state
        .catalog
        .min_service_horizon_of(alloc_state.selected_sites())
        .unwrap_or_else(|| state.catalog.min_service_horizon());

    let durations = match (&request.durations, request.n_phases) {
        (Some(durations), _) => durations.clone(),
        (None, Some(n_phases)) => auto_durations(request.horizon, n_phases, min_horizon)
            .map_err(ApiError::unprocessable)?,
        (None, None) => {
            return Err(ApiError::bad_request(
                "either durations or n_phases is required",
            ));
        }
    };
    let plan = plan(request.horizon, &durations, min_horizon).map_err(ApiError::unprocessable)?;
    let reports =
        phase_reports(&state.catalog, &alloc_state, &plan).map_err(ApiError::unprocessable)?;
    Ok(ok(PhasesResponse { plan, reports }))
}

async fn hazard(
    State(_state): State<ApiState>,
    Json(request): Json<HazardRequest>,
) -> ApiResult<HazardReport> {
    let report = hazard_report(&request.layers).map_err(ApiError::unprocessable)?;
    Ok(ok(report))
}

async fn ej(State(state): State<ApiState>, Json(request): Json<EjRequest>) -> ApiResult<EjResponse> {
    let weights = request.weights.unwrap_or(state.config.ej);
    let scores = ej_index(&request.measures, &weights).map_err(ApiError::unprocessable)?;
    Ok(ok(EjResponse { scores }))
}

async fn cost(
    State(state): State<ApiState>,
    Json(request): Json<CostRequest>,
) -> ApiResult<CostResponse> {
    let weights = request.weights.unwrap_or(state.config.cost);
    let scores = cost_index(&state.catalog, &weights).map_err(ApiError::unprocessable)?;
    Ok(ok(CostResponse { scores }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ApiState {
        ApiState {
            config: Config::default(),
            catalog: SiteCatalog::builtin(),
        }
    }

    #[test]
    fn allocate_rejects_over_capacity_requests() {
        let state = test_state();
        let mut assignments = BTreeMap::new();
        assignments.insert("danc".to_string(), 500u32);
        let request = AllocateRequest {
            weights: None,
            threshold: None,
            policy: None,
            state: None,
            assignments,
        };
        let err = tokio_test::block_on(allocate(State(state), Json(request))).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("danc"));
    }

    #[test]
    fn phases_requires_durations_or_count() {
        let state = test_state();
        let mut assignments = BTreeMap::new();
        assignments.insert("seneca-meadows".to_string(), 1250u32);
        let request = PhasesRequest {
            assignments,
            horizon: 20,
            durations: None,
            n_phases: None,
        };
        let err = tokio_test::block_on(phases(State(state), Json(request))).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn phases_auto_generates_a_valid_plan() {
        let state = test_state();
        let mut assignments = BTreeMap::new();
        assignments.insert("seneca-meadows".to_string(), 1250u32);
        let request = PhasesRequest {
            assignments,
            horizon: 20,
            durations: None,
            n_phases: Some(2),
        };
        let response = tokio_test::block_on(phases(State(state), Json(request))).unwrap();
        let plan = &response.0.data.plan;
        assert_eq!(
            plan.phases.iter().map(|p| p.duration_years).sum::<u32>(),
            20
        );
        assert_eq!(response.0.data.reports.len(), 2);
    }
}
