use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use weekly_planner::audit::audit_plan;
use weekly_planner::planner::compactness_score;
use weekly_planner::request::checked_plan;
use weekly_planner::{
    InputShapeError, Method, Plan, PlannerConfig, PlannerRequest, SolveOptions, build_config,
    solve, validate_config,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn api_error(status: StatusCode, message: impl Into<String>, errors: Vec<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            message: message.into(),
            errors,
        }),
    )
}

fn shape_error(e: InputShapeError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e.to_string(), Vec::new())
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    ok: bool,
    method: Method,
    best_score: f64,
    plan: Plan,
    days: usize,
    daily_hours: usize,
    num_professors: usize,
    num_classes: usize,
    class_names: Vec<String>,
    professor_names: Vec<String>,
    hour_names: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    ok: bool,
    score: f64,
    violations: Vec<String>,
}

// shape check then validation, shared by both endpoints
fn checked_config(req: &PlannerRequest) -> Result<PlannerConfig, ApiError> {
    let config = build_config(req).map_err(shape_error)?;
    let errors = validate_config(&config);
    if !errors.is_empty() {
        warn!("Rejected configuration with {} validation errors", errors.len());
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid parameters.",
            errors,
        ));
    }
    Ok(config)
}

async fn generate_plan_handler(
    State(defaults): State<Arc<SolveOptions>>,
    Json(req): Json<PlannerRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let config = checked_config(&req)?;

    let method = req.method;
    let mut options = (*defaults).clone();
    if let Some(secs) = req.time_limit_secs {
        let limit = Duration::try_from_secs_f64(secs).map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, format!("invalid time_limit_secs: {}", e), Vec::new())
        })?;
        options = options.with_time_limit(method, limit);
    }

    // planning is CPU bound and blocking
    let (config, result) = tokio::task::spawn_blocking(move || {
        let result = solve(&config, method, &options);
        (config, result)
    })
    .await
    .map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("planner task failed: {}", e), Vec::new())
    })?;

    let Some((plan, best_score)) = result.best() else {
        return Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No valid plan found with these parameters.",
            Vec::new(),
        ));
    };

    Ok(Json(GenerateResponse {
        ok: true,
        method,
        best_score,
        plan: plan.clone(),
        days: config.days,
        daily_hours: config.daily_hours,
        num_professors: config.num_professors,
        num_classes: config.num_classes,
        class_names: (0..config.num_classes).map(|c| config.class_label(c)).collect(),
        professor_names: (0..config.num_professors)
            .map(|p| config.professor_label(p))
            .collect(),
        hour_names: (0..config.daily_hours).map(|h| config.hour_label(h)).collect(),
    }))
}

async fn check_plan_handler(Json(req): Json<PlannerRequest>) -> Result<Json<CheckResponse>, ApiError> {
    let config = checked_config(&req)?;
    let Some(plan) = &req.plan else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "The request carries no plan to check.",
            Vec::new(),
        ));
    };
    checked_plan(&config, plan).map_err(shape_error)?;

    let violations = audit_plan(&config, plan);
    Ok(Json(CheckResponse {
        ok: violations.is_empty(),
        score: compactness_score(&config, plan),
        violations,
    }))
}

pub fn router(defaults: SolveOptions) -> Router {
    Router::new()
        .route("/api/generate-plan", post(generate_plan_handler))
        .route("/api/check-plan", post(check_plan_handler))
        .with_state(Arc::new(defaults))
}

pub async fn run_server(addr: &str, defaults: SolveOptions) -> std::io::Result<()> {
    let app = router(defaults);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
