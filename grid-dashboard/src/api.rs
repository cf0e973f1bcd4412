use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use grid_client::{
    analytics::{CorrelationMatrix, Describe},
    domain::{parse_sources, timestamp::parse_date, DailyAverage, ForecastPoint, Reading, ReadingTable},
    AnalyticsError, AnalyticsResult,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime};

use crate::{
    collaborators::{Assistant, AssistantError, NewsClient, NewsFeed},
    prometheus,
    report::{write_forecast_report, ReportError},
    session::{DashboardSession, SessionParams},
};

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ReadingTable>,
    /// `None` when no assistant API key is configured.
    pub assistant: Option<Arc<dyn Assistant>>,
    pub news: NewsClient,
    pub report_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error("assistant is not configured")]
    AssistantDisabled,
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// `Query` whose rejections render as `{ "error": ... }`.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Json` whose rejections render as `{ "error": ... }`.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Analytics(_) | Self::Report(ReportError::EmptyForecast) => StatusCode::BAD_REQUEST,
            Self::Assistant(_) => StatusCode::BAD_GATEWAY,
            Self::AssistantDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Report(ReportError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected { status, .. } => *status,
        };

        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Filter and session parameters shared by every analytics endpoint.
///
/// `sources` is a comma-separated tag list; absent means `Grid`, present but
/// blank means no sources at all.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub sources: Option<String>,
    pub household_kwh: Option<u32>,
    pub horizon: Option<u32>,
}

fn parse_bound(name: &str, raw: Option<&str>) -> AnalyticsResult<Option<Date>> {
    raw.map(|s| {
        parse_date(s).ok_or_else(|| AnalyticsError::InvalidRange(format!("invalid {name} date '{s}'")))
    })
    .transpose()
}

impl FilterQuery {
    pub fn to_params(&self) -> AnalyticsResult<SessionParams> {
        Ok(SessionParams {
            start: parse_bound("start", self.start.as_deref())?,
            end: parse_bound("end", self.end.as_deref())?,
            sources: self.sources.as_deref().map(parse_sources).transpose()?,
            household_usage_kwh: self.household_kwh,
            horizon_days: self.horizon,
        })
    }
}

impl AppState {
    fn session(&self, q: &FilterQuery) -> AnalyticsResult<DashboardSession> {
        DashboardSession::new(self.table.clone(), q.to_params()?)
    }

    fn assistant(&self) -> Result<&dyn Assistant, ApiError> {
        self.assistant.as_deref().ok_or(ApiError::AssistantDisabled)
    }
}

fn count_request(endpoint: &'static str) {
    metrics::counter!("dashboard_requests_total", "endpoint" => endpoint).increment(1);
}

#[derive(Serialize)]
struct SummaryResponse {
    mean_load: f64,
    mean_price: f64,
    rows: usize,
    household_usage_kwh: u32,
}

#[derive(Serialize)]
struct DemandPoint {
    timestamp: PrimitiveDateTime,
    power_consumption_kw: f64,
}

#[derive(Serialize)]
struct GenerationPoint {
    timestamp: PrimitiveDateTime,
    solar_power_kw: f64,
    wind_power_kw: f64,
}

#[derive(Serialize)]
struct DescribeResponse {
    #[serde(flatten)]
    stats: Describe,
    text: String,
}

#[derive(Serialize)]
struct AssistantReply {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    question: String,
}

async fn summary(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    count_request("summary");
    let session = state.session(&q)?;
    let s = session.summary()?;

    Ok(Json(SummaryResponse {
        mean_load: s.mean_load,
        mean_price: s.mean_price,
        rows: s.rows,
        household_usage_kwh: session.household_usage_kwh(),
    }))
}

async fn demand(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<DemandPoint>>, ApiError> {
    count_request("demand");
    let session = state.session(&q)?;
    let points = session
        .view()
        .iter()
        .map(|r| DemandPoint {
            timestamp: r.timestamp,
            power_consumption_kw: r.power_consumption_kw,
        })
        .collect();
    Ok(Json(points))
}

async fn generation(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<GenerationPoint>>, ApiError> {
    count_request("generation");
    let session = state.session(&q)?;
    let points = session
        .view()
        .iter()
        .map(|r| GenerationPoint {
            timestamp: r.timestamp,
            solar_power_kw: r.solar_power_kw,
            wind_power_kw: r.wind_power_kw,
        })
        .collect();
    Ok(Json(points))
}

async fn readings(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    count_request("readings");
    let session = state.session(&q)?;
    let rows = session.view().iter().cloned().collect();
    Ok(Json(rows))
}

async fn daily_average(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<DailyAverage>>, ApiError> {
    count_request("daily_average");
    Ok(Json(state.session(&q)?.daily_average()))
}

async fn forecast(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<Vec<ForecastPoint>>, ApiError> {
    count_request("forecast");
    Ok(Json(state.session(&q)?.forecast()?))
}

async fn describe(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<DescribeResponse>, ApiError> {
    count_request("describe");
    let stats = state.session(&q)?.describe()?;
    let text = stats.to_text();
    Ok(Json(DescribeResponse { stats, text }))
}

async fn correlation(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<CorrelationMatrix>, ApiError> {
    count_request("correlation");
    Ok(Json(state.session(&q)?.correlation()))
}

async fn recommendations(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Json<AssistantReply>, ApiError> {
    count_request("recommendations");
    let assistant = state.assistant()?;
    let prompt = state.session(&q)?.recommendation_prompt()?;
    let reply = assistant.reply(&prompt).await?;
    Ok(Json(AssistantReply { reply }))
}

async fn chat(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<AssistantReply>, ApiError> {
    count_request("chat");
    let assistant = state.assistant()?;
    let prompt = state.session(&q)?.chat_prompt(&req.question)?;
    let reply = assistant.reply(&prompt).await?;
    Ok(Json(AssistantReply { reply }))
}

async fn news(State(state): State<AppState>) -> Json<NewsFeed> {
    count_request("news");
    Json(state.news.latest_news().await)
}

async fn report(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FilterQuery>,
) -> Result<Response, ApiError> {
    count_request("report");
    let points = state.session(&q)?.forecast()?;

    let path = state.report_path.clone();
    let bytes = tokio::task::spawn_blocking(move || write_forecast_report(&path, &points))
        .await
        .map_err(|e| ReportError::Io(std::io::Error::other(e)))??;

    let filename = state
        .report_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("forecast_report.pdf")
        .to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}

async fn healthz() -> &'static str {
    "ok"
}

pub fn router(state: AppState, metrics: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/summary", get(summary))
        .route("/api/demand", get(demand))
        .route("/api/generation", get(generation))
        .route("/api/readings", get(readings))
        .route("/api/daily-average", get(daily_average))
        .route("/api/forecast", get(forecast))
        .route("/api/describe", get(describe))
        .route("/api/correlation", get(correlation))
        .route("/api/recommendations", post(recommendations))
        .route("/api/chat", post(chat))
        .route("/api/news", get(news))
        .route("/api/report", post(report));

    if let Some(handle) = metrics {
        app = app.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { prometheus::render(&handle) }
            }),
        );
    }

    app.with_state(state)
}
