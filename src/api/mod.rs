use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::artifacts::ArtifactPaths;
use crate::error::PredictorError;
use crate::models::{ApiResponse, KnownTeams, PredictRequest, PredictResponse, TeamRole};
use crate::services::MatchupPredictor;

type AppState = Arc<MatchupPredictor>;
type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub async fn serve(port: u16, paths: &ArtifactPaths) -> anyhow::Result<()> {
    let predictor = MatchupPredictor::load(paths)?;

    let app = create_router().with_state(Arc::new(predictor));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("NHL predictor API listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/predict", post(predict_handler))
        .route("/teams", get(teams_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("NHL predictor API is running"))
}

// POST /predict - Predict the winner of a visitor/home matchup
async fn predict_handler(
    State(predictor): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<ApiResponse<PredictResponse>>, ApiError> {
    match predictor.predict_matchup(&request.visitor_team, &request.home_team) {
        Ok(result) => Ok(Json(ApiResponse::success(result.into()))),
        Err(e) => Err(error_response(e)),
    }
}

// GET /teams - Teams with history, per role
async fn teams_handler(State(predictor): State<AppState>) -> Json<ApiResponse<KnownTeams>> {
    let repository = predictor.repository();
    let owned = |role: TeamRole| -> Vec<String> {
        repository
            .teams(role)
            .into_iter()
            .map(str::to_string)
            .collect()
    };
    Json(ApiResponse::success(KnownTeams {
        visitor: owned(TeamRole::Visitor),
        home: owned(TeamRole::Home),
    }))
}

fn error_response(error: PredictorError) -> ApiError {
    let status = match &error {
        PredictorError::UnknownTeam { .. } => StatusCode::NOT_FOUND,
        PredictorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!("Prediction failed: {}", error);
    } else {
        tracing::warn!("Prediction rejected: {}", error);
    }

    (status, Json(ApiResponse::error(error.to_string())))
}
