//! REST API for the stowage planner.
//!
//! Exposes placement validation, drag previews, layer numbering and load
//! metrics as HTTP endpoints for the 3D planning frontend.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::catalog::{container_or_default, find_container, standard_containers};
use crate::config::{ApiConfig, PlannerConfig};
use crate::error::{InputIssue, ValidationError};
use crate::geometry::{snap_position, snap_to_grid};
use crate::layering::{
    Layer, LayerAssignment, LayerStrategy, LayerSummary, assign_layers, layer_summary_with,
};
use crate::metrics::{LoadMetrics, UtilizationLevel, load_metrics, placed_load_metrics};
use crate::model::{CargoItem, ContainerType, Unit, normalize};
use crate::placement::{PreviewStep, evaluate_placement, preview_path};
use crate::types::{Dimensions, Position3D};

#[derive(Clone)]
struct ApiState {
    planner: PlannerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stowage-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the normalize endpoint.
#[derive(Deserialize, ToSchema)]
pub struct NormalizeRequest {
    pub item: CargoItem,
}

/// Request structure for the snap endpoint.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "value": 1.234, "pitch": 0.1 }))]
pub struct SnapRequest {
    pub value: f64,
    /// Grid pitch in meters; the configured pitch is used when omitted
    #[serde(default)]
    #[schema(nullable = true)]
    pub pitch: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct SnapResponse {
    pub value: f64,
}

/// Request structure for validating one candidate placement.
///
/// The container is either named by `containerId` or sent inline as
/// `container`. The configured default container is used when both are
/// missing.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "item": {
            "id": "cargo-2",
            "name": "Crate",
            "length": 100.0,
            "width": 100.0,
            "height": 100.0,
            "unit": "cm",
            "weight": 40.0
        },
        "position": { "x": 1.0, "y": 0.0, "z": 0.0 },
        "containerId": "20ft",
        "placedItems": []
    })
)]
pub struct ValidatePlacementRequest {
    pub item: CargoItem,
    pub position: Position3D,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container_id: Option<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container: Option<ContainerType>,
    #[serde(default)]
    pub placed_items: Vec<CargoItem>,
    /// Overrides the configured snapping of the candidate position
    #[serde(default)]
    #[schema(nullable = true)]
    pub snap: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    pub valid: bool,
    pub code: String,
    pub reason: String,
    /// Position that was evaluated, after snapping
    pub position: Position3D,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_item_id: Option<String>,
}

/// Request structure for streaming a drag preview.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStreamRequest {
    pub item: CargoItem,
    /// Raw pointer positions in gesture order
    pub positions: Vec<Position3D>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container_id: Option<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container: Option<ContainerType>,
    #[serde(default)]
    pub placed_items: Vec<CargoItem>,
}

#[derive(Deserialize, ToSchema)]
pub struct LayerAssignRequest {
    pub items: Vec<CargoItem>,
    /// Overrides the configured layer strategy
    #[serde(default)]
    #[schema(nullable = true)]
    pub strategy: Option<LayerStrategy>,
}

#[derive(Deserialize, ToSchema)]
pub struct LayerSummaryRequest {
    pub items: Vec<CargoItem>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRequest {
    pub items: Vec<CargoItem>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container_id: Option<String>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub container: Option<ContainerType>,
    /// Aggregate only items placed in the container
    #[serde(default)]
    #[schema(nullable = true)]
    pub placed_only: Option<bool>,
}

/// Load metrics plus the input problems that were tolerated.
#[derive(Serialize, ToSchema)]
pub struct MetricsResponse {
    pub metrics: LoadMetrics,
    pub issues: Vec<InputIssue>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

/// Picks the container a request refers to.
///
/// An inline container wins over an id; both missing selects the
/// configured default. Inline containers are taken as sent: a container
/// without volume is not an error here, the core degrades on it.
fn resolve_container(
    container_id: Option<&str>,
    inline: Option<ContainerType>,
    default_id: &str,
) -> Result<ContainerType, ValidationError> {
    if let Some(custom) = inline {
        for (axis, value) in [
            ("length", custom.length),
            ("width", custom.width),
            ("height", custom.height),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidDimension(format!(
                    "Container {} must be a finite number, got: {}",
                    axis, value
                )));
            }
        }
        return Ok(custom);
    }
    match container_id {
        Some(id) => {
            find_container(id).ok_or_else(|| ValidationError::UnknownContainer(id.to_string()))
        }
        None => Ok(container_or_default(default_id)),
    }
}

fn resolve_container_or_error(
    container_id: Option<&str>,
    inline: Option<ContainerType>,
    default_id: &str,
) -> Result<ContainerType, Response> {
    resolve_container(container_id, inline, default_id)
        .map_err(|err| container_config_error(err.to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handle_list_containers,
        handle_normalize,
        handle_snap,
        handle_validate_placement,
        handle_preview_stream,
        handle_assign_layers,
        handle_layer_summary,
        handle_metrics
    ),
    components(
        schemas(
            CargoItem,
            ContainerType,
            Unit,
            Position3D,
            Dimensions,
            NormalizeRequest,
            SnapRequest,
            SnapResponse,
            ValidatePlacementRequest,
            PlacementResponse,
            PreviewStreamRequest,
            PreviewStep,
            LayerAssignRequest,
            LayerAssignment,
            Layer,
            LayerStrategy,
            LayerSummaryRequest,
            LayerSummary,
            MetricsRequest,
            MetricsResponse,
            LoadMetrics,
            UtilizationLevel,
            InputIssue,
            ErrorResponse
        )
    ),
    tags(
        (name = "placement", description = "Placement validation and drag previews"),
        (name = "layers", description = "Layer detection and box numbering"),
        (name = "load", description = "Containers, dimensions and load metrics")
    )
)]
struct ApiDoc;

fn router(planner: PlannerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { planner };

    Router::new()
        // API endpoints
        .route("/containers", get(handle_list_containers))
        .route("/normalize", post(handle_normalize))
        .route("/snap", post(handle_snap))
        .route("/placement/validate", post(handle_validate_placement))
        .route("/placement/preview_stream", post(handle_preview_stream))
        .route("/layers/assign", post(handle_assign_layers))
        .route("/layers/summary", post(handle_layer_summary))
        .route("/metrics", post(handle_metrics))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server on the configured address.
///
/// Configures CORS for cross-origin requests from the frontend.
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, planner: PlannerConfig) -> std::io::Result<()> {
    let app = router(planner);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
        tracing::error!("❌ Could not bind API server to {}: {}", addr, err);
        err
    })?;

    let display_host = config.display_host().to_string();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API Endpoints:");
    tracing::info!("   - GET  /containers");
    tracing::info!("   - POST /normalize");
    tracing::info!("   - POST /snap");
    tracing::info!("   - POST /placement/validate");
    tracing::info!("   - POST /placement/preview_stream");
    tracing::info!("   - POST /layers/assign");
    tracing::info!("   - POST /layers/summary");
    tracing::info!("   - POST /metrics");
    tracing::info!("📑 Documentation:");
    tracing::info!("   - GET /docs");
    tracing::info!("   - GET /docs/openapi.json");

    axum::serve(listener, app).await.map_err(|err| {
        tracing::error!("❌ API server terminated with an error: {err}");
        err
    })
}

/// Handler for GET /containers.
///
/// Lists the standard container types.
#[utoipa::path(
    get,
    path = "/containers",
    responses(
        (status = 200, description = "Standard container types", body = [ContainerType])
    ),
    tag = "load"
)]
async fn handle_list_containers() -> impl IntoResponse {
    Json(standard_containers())
}

/// Handler for POST /normalize.
///
/// Converts the declared dimensions of an item to meters.
#[utoipa::path(
    post,
    path = "/normalize",
    request_body = NormalizeRequest,
    responses(
        (status = 200, description = "Dimensions in meters", body = Dimensions),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or unconvertible item",
            body = ErrorResponse
        )
    ),
    tag = "load"
)]
async fn handle_normalize(payload: Result<Json<NormalizeRequest>, JsonRejection>) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match normalize(&request.item) {
        Ok(dims) => (StatusCode::OK, Json(dims)).into_response(),
        Err(issue) => {
            tracing::warn!("⚠️ Normalization rejected: {}", issue);
            validation_error(issue.to_string())
        }
    }
}

/// Handler for POST /snap.
#[utoipa::path(
    post,
    path = "/snap",
    request_body = SnapRequest,
    responses(
        (status = 200, description = "Snapped value", body = SnapResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "placement"
)]
async fn handle_snap(
    State(state): State<ApiState>,
    payload: Result<Json<SnapRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let pitch = request.pitch.unwrap_or(state.planner.grid_pitch);
    let value = snap_to_grid(request.value, pitch);
    (StatusCode::OK, Json(SnapResponse { value })).into_response()
}

/// Handler for POST /placement/validate.
///
/// Decides whether a candidate position may be committed and explains why
/// not when it is rejected.
#[utoipa::path(
    post,
    path = "/placement/validate",
    request_body = ValidatePlacementRequest,
    responses(
        (status = 200, description = "Placement verdict", body = PlacementResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_validate_placement(
    State(state): State<ApiState>,
    payload: Result<Json<ValidatePlacementRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let container = match resolve_container_or_error(
        request.container_id.as_deref(),
        request.container,
        &state.planner.default_container_id,
    ) {
        Ok(container) => container,
        Err(response) => return response,
    };

    let position = if request.snap.unwrap_or(state.planner.snap_placements) {
        snap_position(request.position, state.planner.grid_pitch)
    } else {
        request.position
    };

    let verdict = evaluate_placement(&request.item, position, &container, &request.placed_items);
    tracing::debug!(
        "Placement of '{}' in {} at ({:.2}, {:.2}, {:.2}): {}",
        request.item.id,
        container.id,
        position.x,
        position.y,
        position.z,
        verdict.code()
    );

    let response = PlacementResponse {
        valid: verdict.is_valid(),
        code: verdict.code().to_string(),
        reason: verdict.to_string(),
        position,
        blocking_item_id: verdict.blocking_item_id().map(str::to_string),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// Handler for POST /placement/preview_stream (SSE).
///
/// Streams one verdict per pointer position as Server-Sent Events so the
/// frontend can tint the dragged item while the gesture is evaluated.
#[utoipa::path(
    post,
    path = "/placement/preview_stream",
    request_body = PreviewStreamRequest,
    responses(
        (
            status = 200,
            description = "Streams preview steps in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "placement"
)]
async fn handle_preview_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PreviewStreamRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let container = match resolve_container_or_error(
        request.container_id.as_deref(),
        request.container,
        &state.planner.default_container_id,
    ) {
        Ok(container) => container,
        Err(response) => return response,
    };

    tracing::info!(
        "📥 New drag preview: '{}' over {} positions",
        request.item.id,
        request.positions.len()
    );

    let (tx, rx) = mpsc::channel::<String>(32);
    let pitch = state.planner.grid_pitch;
    let PreviewStreamRequest {
        item,
        positions,
        placed_items,
        ..
    } = request;

    tokio::task::spawn_blocking(move || {
        preview_path(&item, &positions, &container, &placed_items, pitch, |step| {
            match serde_json::to_string(step) {
                // Receiver has closed the stream; stop evaluating.
                Ok(json) => tx.blocking_send(json).is_ok(),
                Err(err) => {
                    tracing::warn!("⚠️ Could not serialize preview step: {}", err);
                    true
                }
            }
        });
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /layers/assign.
///
/// Returns an annotated copy of the items together with the detected layers.
#[utoipa::path(
    post,
    path = "/layers/assign",
    request_body = LayerAssignRequest,
    responses(
        (status = 200, description = "Annotated items and layers", body = LayerAssignment),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "layers"
)]
async fn handle_assign_layers(
    State(state): State<ApiState>,
    payload: Result<Json<LayerAssignRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let mut layering = state.planner.layering;
    if let Some(strategy) = request.strategy {
        layering.strategy = strategy;
    }

    let assignment = assign_layers(&request.items, &layering);
    tracing::info!(
        "📦 Layers assigned: {} items in {} layers ({})",
        request.items.len(),
        assignment.layers.len(),
        layering.strategy.as_str()
    );
    (StatusCode::OK, Json(assignment)).into_response()
}

/// Handler for POST /layers/summary.
#[utoipa::path(
    post,
    path = "/layers/summary",
    request_body = LayerSummaryRequest,
    responses(
        (status = 200, description = "Box count per layer", body = [LayerSummary]),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "layers"
)]
async fn handle_layer_summary(
    State(state): State<ApiState>,
    payload: Result<Json<LayerSummaryRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let summary = layer_summary_with(&request.items, &state.planner.layering);
    (StatusCode::OK, Json(summary)).into_response()
}

/// Handler for POST /metrics.
///
/// Aggregates volume, weight and utilization. Malformed items are counted
/// as zero and listed in `issues`.
#[utoipa::path(
    post,
    path = "/metrics",
    request_body = MetricsRequest,
    responses(
        (status = 200, description = "Load metrics", body = MetricsResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "load"
)]
async fn handle_metrics(
    State(state): State<ApiState>,
    payload: Result<Json<MetricsRequest>, JsonRejection>,
) -> Response {
    let request = match parse_json(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let container = match resolve_container_or_error(
        request.container_id.as_deref(),
        request.container,
        &state.planner.default_container_id,
    ) {
        Ok(container) => container,
        Err(response) => return response,
    };

    let outcome = if request.placed_only.unwrap_or(false) {
        placed_load_metrics(&request.items, &container)
    } else {
        load_metrics(&request.items, &container)
    };

    let response = MetricsResponse {
        metrics: outcome.value,
        issues: outcome.issues,
    };
    (StatusCode::OK, Json(response)).into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
