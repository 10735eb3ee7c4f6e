mod error;

pub use error::RequestError;

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    CashFlowEvent, Clock, ContributionSuggestion, EventKind, FixedClock, PortfolioMetrics,
    ProjectionParameters, ProjectionPoint, Recurrence, SystemClock, calculate_metrics,
    generate_suggestions, project_with_metrics,
};

pub const MAX_PROJECTION_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ApiEventKind {
    #[serde(alias = "income")]
    Income,
    #[serde(alias = "expense")]
    Expense,
    #[serde(alias = "investment")]
    Investment,
    #[serde(alias = "withdrawal")]
    Withdrawal,
    #[serde(alias = "bonus")]
    Bonus,
    #[serde(alias = "inheritance")]
    Inheritance,
    #[serde(alias = "loan")]
    Loan,
}

impl From<ApiEventKind> for EventKind {
    fn from(value: ApiEventKind) -> Self {
        match value {
            ApiEventKind::Income => EventKind::Income,
            ApiEventKind::Expense => EventKind::Expense,
            ApiEventKind::Investment => EventKind::Investment,
            ApiEventKind::Withdrawal => EventKind::Withdrawal,
            ApiEventKind::Bonus => EventKind::Bonus,
            ApiEventKind::Inheritance => EventKind::Inheritance,
            ApiEventKind::Loan => EventKind::Loan,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ApiRecurrence {
    #[serde(alias = "once", alias = "ONE_TIME", alias = "one-time")]
    Once,
    #[serde(alias = "monthly")]
    Monthly,
    #[serde(alias = "quarterly")]
    Quarterly,
    #[serde(alias = "annually", alias = "YEARLY", alias = "yearly")]
    Annually,
}

impl From<ApiRecurrence> for Recurrence {
    fn from(value: ApiRecurrence) -> Self {
        match value {
            ApiRecurrence::Once => Recurrence::Once,
            ApiRecurrence::Monthly => Recurrence::Monthly,
            ApiRecurrence::Quarterly => Recurrence::Quarterly,
            ApiRecurrence::Annually => Recurrence::Annually,
        }
    }
}

/// Monetary input as a JSON number or a decimal string such as `"1500.00"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum DecimalInput {
    Number(f64),
    Text(String),
}

impl DecimalInput {
    fn parse(&self, field: &str) -> Result<f64, RequestError> {
        let value = match self {
            DecimalInput::Number(v) => *v,
            DecimalInput::Text(raw) => {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|_| RequestError::InvalidDecimal {
                        field: field.to_string(),
                        value: raw.clone(),
                    })?
            }
        };
        if !value.is_finite() {
            return Err(RequestError::not_finite(field));
        }
        Ok(value)
    }

    fn non_negative(&self, field: &str) -> Result<f64, RequestError> {
        let value = self.parse(field)?;
        if value < 0.0 {
            return Err(RequestError::negative(field));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPayload {
    #[serde(alias = "type")]
    kind: ApiEventKind,
    amount: DecimalInput,
    #[serde(alias = "frequency")]
    recurrence: ApiRecurrence,
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    client_id: Option<String>,
    initial_value: Option<DecimalInput>,
    interest_rate: Option<DecimalInput>,
    projection_years: Option<u32>,
    events: Vec<EventPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionsPayload {
    current_patrimony: DecimalInput,
    target_patrimony: DecimalInput,
    time_horizon_years: u32,
    #[serde(default)]
    current_monthly_contribution: Option<DecimalInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsPayload {
    #[serde(default)]
    projection_data: Vec<ProjectionPoint>,
    initial_value: DecimalInput,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "wealth-projection",
    about = "Monthly compounding wealth projection with recurring and one-off cash-flow events"
)]
pub struct Cli {
    #[arg(long, help = "Starting portfolio value")]
    initial_value: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Expected annual interest rate in percent, e.g. 4"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 10, help = "Number of future years to project")]
    projection_years: u32,
    #[arg(long, help = "JSON file holding a list of cash-flow events")]
    events_file: Option<PathBuf>,
    #[arg(long, help = "Projection anchor year; defaults to the current calendar year")]
    anchor_year: Option<i32>,
    #[arg(long, help = "Target patrimony; enables contribution suggestions")]
    target: Option<f64>,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Current monthly contribution used when sizing suggestions"
    )]
    monthly_contribution: f64,
    #[arg(skip)]
    client_id: Option<String>,
    #[arg(skip)]
    events: Vec<CashFlowEvent>,
}

#[derive(Debug, Clone)]
struct ProjectionRequest {
    client_id: Option<String>,
    interest_rate_percent: f64,
    params: ProjectionParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ParametersEcho {
    client_id: Option<String>,
    initial_value: f64,
    interest_rate: f64,
    annual_interest_rate: f64,
    projection_years: u32,
    anchor_year: i32,
    event_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    projection_data: Vec<ProjectionPoint>,
    parameters: ParametersEcho,
    metrics: Option<PortfolioMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<ContributionSuggestion>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionsResponse {
    gap: f64,
    suggestions: Vec<ContributionSuggestion>,
}

#[derive(Debug, Serialize)]
struct MetricsResponse {
    metrics: Option<PortfolioMetrics>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    clock: Arc<dyn Clock + Send + Sync>,
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, RequestError> {
    let trimmed = raw.trim();
    // Accept full timestamps from the store by keeping the date part.
    let date_part = match trimmed.get(..10) {
        Some(prefix) if trimmed.len() > 10 && trimmed.as_bytes()[10] == b'T' => prefix,
        _ => trimmed,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn build_event(index: usize, payload: EventPayload) -> Result<CashFlowEvent, RequestError> {
    let field = format!("events[{index}]");
    let amount = payload.amount.non_negative(&format!("{field}.amount"))?;
    let start_date = parse_date(&format!("{field}.startDate"), &payload.start_date)?;
    let end_date = payload
        .end_date
        .as_deref()
        .map(|raw| parse_date(&format!("{field}.endDate"), raw))
        .transpose()?;
    if let Some(end) = end_date {
        if end < start_date {
            return Err(RequestError::EndBeforeStart {
                field,
                start: start_date.to_string(),
                end: end.to_string(),
            });
        }
    }

    Ok(CashFlowEvent {
        kind: payload.kind.into(),
        amount,
        recurrence: payload.recurrence.into(),
        start_date,
        end_date,
        description: payload.description,
    })
}

fn build_events(payloads: Vec<EventPayload>) -> Result<Vec<CashFlowEvent>, RequestError> {
    payloads
        .into_iter()
        .enumerate()
        .map(|(idx, payload)| build_event(idx, payload))
        .collect()
}

fn events_from_json(json: &str) -> Result<Vec<CashFlowEvent>, RequestError> {
    let payloads = serde_json::from_str::<Vec<EventPayload>>(json)
        .map_err(|e| RequestError::InvalidJson(e.to_string()))?;
    build_events(payloads)
}

fn load_events_file(path: &Path) -> Result<Vec<CashFlowEvent>, RequestError> {
    let json = std::fs::read_to_string(path).map_err(|e| RequestError::EventsFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    events_from_json(&json)
}

fn build_request(cli: Cli) -> Result<ProjectionRequest, RequestError> {
    if !cli.initial_value.is_finite() || cli.initial_value < 0.0 {
        return Err(RequestError::negative("initialValue"));
    }
    if !cli.interest_rate.is_finite() {
        return Err(RequestError::not_finite("interestRate"));
    }
    if cli.interest_rate <= -100.0 {
        return Err(RequestError::RateTooLow);
    }
    if cli.projection_years > MAX_PROJECTION_YEARS {
        return Err(RequestError::HorizonTooLong {
            max: MAX_PROJECTION_YEARS,
        });
    }
    if !cli.monthly_contribution.is_finite() || cli.monthly_contribution < 0.0 {
        return Err(RequestError::negative("monthlyContribution"));
    }
    if let Some(target) = cli.target {
        if !target.is_finite() || target < 0.0 {
            return Err(RequestError::negative("target"));
        }
    }

    Ok(ProjectionRequest {
        client_id: cli.client_id,
        interest_rate_percent: cli.interest_rate,
        params: ProjectionParameters {
            initial_value: cli.initial_value,
            annual_interest_rate: cli.interest_rate / 100.0,
            events: cli.events,
            projection_years: cli.projection_years,
        },
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_value: 0.0,
        interest_rate: 4.0,
        projection_years: 10,
        events_file: None,
        anchor_year: None,
        target: None,
        monthly_contribution: 0.0,
        client_id: None,
        events: Vec::new(),
    }
}

fn projection_request_from_payload(
    payload: ProjectionPayload,
) -> Result<ProjectionRequest, RequestError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.client_id {
        cli.client_id = Some(v);
    }
    if let Some(v) = payload.initial_value {
        cli.initial_value = v.parse("initialValue")?;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v.parse("interestRate")?;
    }
    if let Some(v) = payload.projection_years {
        cli.projection_years = v;
    }
    cli.events = build_events(payload.events)?;

    build_request(cli)
}

fn build_projection_response(
    request: ProjectionRequest,
    clock: &(impl Clock + ?Sized),
    goal: Option<(f64, f64)>,
) -> ProjectionResponse {
    let report = project_with_metrics(&request.params, clock);
    let params = &request.params;
    let suggestions = goal.map(|(target, monthly_contribution)| {
        generate_suggestions(
            params.initial_value,
            target,
            params.projection_years,
            monthly_contribution,
        )
    });

    ProjectionResponse {
        parameters: ParametersEcho {
            client_id: request.client_id,
            initial_value: params.initial_value,
            interest_rate: request.interest_rate_percent,
            annual_interest_rate: params.annual_interest_rate,
            projection_years: params.projection_years,
            anchor_year: report.anchor_year,
            event_count: params.events.len(),
        },
        projection_data: report.points,
        metrics: report.metrics,
        suggestions,
    }
}

fn build_suggestions_response(
    payload: SuggestionsPayload,
) -> Result<SuggestionsResponse, RequestError> {
    let current = payload.current_patrimony.non_negative("currentPatrimony")?;
    let target = payload.target_patrimony.non_negative("targetPatrimony")?;
    if payload.time_horizon_years > MAX_PROJECTION_YEARS {
        return Err(RequestError::GoalHorizonTooLong {
            max: MAX_PROJECTION_YEARS,
        });
    }
    let contribution = match &payload.current_monthly_contribution {
        Some(v) => v.non_negative("currentMonthlyContribution")?,
        None => 0.0,
    };

    Ok(SuggestionsResponse {
        gap: target - current,
        suggestions: generate_suggestions(
            current,
            target,
            payload.time_horizon_years,
            contribution,
        ),
    })
}

fn build_metrics_response(payload: MetricsPayload) -> Result<MetricsResponse, RequestError> {
    let initial_value = payload.initial_value.non_negative("initialValue")?;
    Ok(MetricsResponse {
        metrics: calculate_metrics(&payload.projection_data, initial_value),
    })
}

/// Runs the `project` command and returns the report as pretty JSON.
pub fn run_project_command<I, T>(args: I) -> Result<String, RequestError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let mut cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    if let Some(path) = &cli.events_file {
        cli.events = load_events_file(path)?;
    }
    let anchor_year = cli.anchor_year;
    let goal = cli.target.map(|target| (target, cli.monthly_contribution));
    let request = build_request(cli)?;
    log::info!(
        "projecting {} years over {} events",
        request.params.projection_years,
        request.params.events.len()
    );

    let response = match anchor_year {
        Some(year) => build_projection_response(request, &FixedClock(year), goal),
        None => build_projection_response(request, &SystemClock, goal),
    };
    serde_json::to_string_pretty(&response)
        .map_err(|e| RequestError::Encode(e.to_string()))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState {
        clock: Arc::new(SystemClock),
    };
    let listener = TcpListener::bind(addr).await?;
    log::info!("wealth projection API listening on http://{addr}");
    axum::serve(listener, router(state)).await
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/projections", post(projection_handler))
        .route("/api/suggestions", post(suggestions_handler))
        .route("/api/metrics", post(metrics_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProjectionPayload>,
) -> Response {
    let request = match projection_request_from_payload(payload) {
        Ok(request) => request,
        Err(e) => return bad_request(e),
    };
    log::debug!(
        "projection request client={:?} years={} events={}",
        request.client_id,
        request.params.projection_years,
        request.params.events.len()
    );
    json_response(
        StatusCode::OK,
        build_projection_response(request, state.clock.as_ref(), None),
    )
}

async fn suggestions_handler(Json(payload): Json<SuggestionsPayload>) -> Response {
    match build_suggestions_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => bad_request(e),
    }
}

async fn metrics_handler(Json(payload): Json<MetricsPayload>) -> Response {
    match build_metrics_response(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => bad_request(e),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn bad_request(err: RequestError) -> Response {
    log::warn!("rejected request: {err}");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn projection_request_from_json(json: &str) -> Result<ProjectionRequest, RequestError> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| RequestError::InvalidJson(e.to_string()))?;
    projection_request_from_payload(payload)
}
