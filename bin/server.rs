// Finora Web Server - JSON API over the hosted table backend
//
// Every handler is a thin request/response step: extract the caller's bearer
// token, call the table API (row-level security scopes the rows remotely),
// run the pure aggregation/scoring functions, reply. Failures from external
// services surface as message strings; there is no retry or circuit breaking.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use finora::aggregates::{
    monthly_aggregates, recent_transactions, spending_by_category, MonthKey,
};
use finora::ai::{
    build_followup_messages, build_summary_messages, AiClient, AiError, FollowupRequest,
    SummaryRequest, SUMMARY_SYSTEM_PROMPT,
};
use finora::alerts::evaluate_alerts;
use finora::auth::{bearer_token, subject_claim};
use finora::config::Config;
use finora::entities::{total_monthly_cost, upcoming_renewals, Asset, Category, Subscription, Transaction};
use finora::export::{render_html_report, transactions_to_csv, ReportBundle};
use finora::health::{health_score, ScoreOptions};
use finora::ratelimit::{quota_key, DailyQuota};
use finora::store::{tables, Store, StoreError, TableQuery};

// ============================================================================
// STATE & RESPONSE ENVELOPE
// ============================================================================

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    quota: Arc<DailyQuota>,
    ai: Option<Arc<AiClient>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    fn fail(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.into()),
        })
    }
}

fn store_failure(context: &str, err: StoreError) -> axum::response::Response {
    error!("{}: {}", context, err);
    let status = match err {
        StoreError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, ApiResponse::<Value>::fail(err.to_string())).into_response()
}

fn ai_failure(context: &str, err: AiError) -> axum::response::Response {
    error!("{}: {}", context, err);
    let status = match err {
        AiError::Payload(_) => StatusCode::BAD_REQUEST,
        AiError::MissingApiKey { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, ApiResponse::<Value>::fail(err.to_string())).into_response()
}

// ============================================================================
// REQUEST HELPERS
// ============================================================================

/// Caller's bearer token, forwarded to the table API untouched
fn caller_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(|t| t.to_string())
}

/// Client address for rate-limit keying: first X-Forwarded-For hop when
/// present (the usual reverse-proxy setup), socket address otherwise
fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// `month` query param, defaulting to the current UTC month
fn month_param(params: &HashMap<String, String>) -> Result<MonthKey, axum::response::Response> {
    match params.get("month") {
        Some(raw) => MonthKey::parse_label(raw).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                ApiResponse::<Value>::fail(format!("month not recognized: {:?} (want YYYY-MM)", raw)),
            )
                .into_response()
        }),
        None => {
            let today = Utc::now().date_naive();
            Ok(MonthKey::from_date(today))
        }
    }
}

/// First and first-of-next-month dates for a month filter
fn month_bounds(month: MonthKey) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(month.year, month.month, 1)
        .unwrap_or_else(|| Utc::now().date_naive());
    let next = if month.month == 12 {
        NaiveDate::from_ymd_opt(month.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(month.year, month.month + 1, 1)
    }
    .unwrap_or(start);
    (start, next)
}

fn score_options(params: &HashMap<String, String>) -> ScoreOptions {
    let mut options = ScoreOptions::default();
    if let Some(fund) = params.get("emergency_fund").and_then(|v| finora::money::parse_lenient(v)) {
        options.emergency_fund_amount = fund;
    }
    if let Some(lookback) = params.get("lookback").and_then(|v| v.parse().ok()) {
        options.lookback_months = lookback;
    }
    options
}

// ============================================================================
// GENERIC TABLE PASSTHROUGH
// ============================================================================

/// List rows of one table, newest-id-agnostic; per-table routes pin the sort
fn list_table(
    state: &AppState,
    table: &str,
    query: TableQuery,
    token: Option<&str>,
) -> axum::response::Response {
    match state.store.select::<Value>(table, &query, token) {
        Ok(rows) => ApiResponse::ok(rows).into_response(),
        Err(e) => store_failure(table, e),
    }
}

fn insert_table(
    state: &AppState,
    table: &str,
    row: &Value,
    token: Option<&str>,
) -> axum::response::Response {
    match state.store.insert::<Value, Value>(table, row, token) {
        Ok(stored) => (StatusCode::CREATED, ApiResponse::ok(stored)).into_response(),
        Err(e) => store_failure(table, e),
    }
}

fn update_table(
    state: &AppState,
    table: &str,
    id: &str,
    patch: &Value,
    token: Option<&str>,
) -> axum::response::Response {
    match state.store.update::<Value, Value>(table, id, patch, token) {
        Ok(stored) => ApiResponse::ok(stored).into_response(),
        Err(e) => store_failure(table, e),
    }
}

fn delete_table(
    state: &AppState,
    table: &str,
    id: &str,
    token: Option<&str>,
) -> axum::response::Response {
    match state.store.delete(table, id, token) {
        Ok(()) => ApiResponse::ok(json!({"deleted": id})).into_response(),
        Err(e) => store_failure(table, e),
    }
}

/// Stamp the caller's user id onto an insert payload when the token carries
/// one; the hosted database defaults the column otherwise
fn stamp_user(mut row: Value, token: Option<&str>) -> Value {
    if let (Some(obj), Some(token)) = (row.as_object_mut(), token) {
        if !obj.contains_key("user_id") {
            if let Some(sub) = subject_claim(token) {
                obj.insert("user_id".to_string(), json!(sub));
            }
        }
    }
    row
}

// ============================================================================
// BASIC & CRUD HANDLERS
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    ApiResponse::ok(json!({"status": "ok", "version": finora::VERSION}))
}

/// GET /api/transactions?month=YYYY-MM - transactions, newest first
async fn get_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);

    let mut query = TableQuery::new().order_desc("date");
    if params.contains_key("month") {
        let month = match month_param(&params) {
            Ok(m) => m,
            Err(response) => return response,
        };
        let (start, next) = month_bounds(month);
        query = query
            .gte("date", &start.to_string())
            .lt("date", &next.to_string());
    }
    if let Some(limit) = params.get("limit").and_then(|v| v.parse().ok()) {
        query = query.limit(limit);
    }

    list_table(&state, tables::TRANSACTIONS, query, token.as_deref())
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);

    // Local validation stops at "amount is numeric" and "kind is
    // income|expense"; the database enforces the rest
    let amount = body.get("amount").and_then(Value::as_f64);
    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => {}
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                ApiResponse::<Value>::fail("amount must be a non-negative number"),
            )
                .into_response()
        }
    }
    let kind_ok = body
        .get("kind")
        .and_then(Value::as_str)
        .and_then(finora::entities::TransactionKind::parse)
        .is_some();
    if !kind_ok {
        return (
            StatusCode::BAD_REQUEST,
            ApiResponse::<Value>::fail("kind must be income or expense"),
        )
            .into_response();
    }

    let row = stamp_user(body, token.as_deref());
    insert_table(&state, tables::TRANSACTIONS, &row, token.as_deref())
}

/// PUT /api/transactions/:id
async fn update_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    update_table(&state, tables::TRANSACTIONS, &id, &patch, token.as_deref())
}

/// DELETE /api/transactions/:id
async fn delete_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    delete_table(&state, tables::TRANSACTIONS, &id, token.as_deref())
}

/// GET /api/categories
async fn get_categories(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = caller_token(&headers);
    list_table(
        &state,
        tables::CATEGORIES,
        TableQuery::new().order_asc("name"),
        token.as_deref(),
    )
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let row = stamp_user(body, token.as_deref());
    insert_table(&state, tables::CATEGORIES, &row, token.as_deref())
}

/// PUT /api/categories/:id
async fn update_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    update_table(&state, tables::CATEGORIES, &id, &patch, token.as_deref())
}

/// DELETE /api/categories/:id
async fn delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    delete_table(&state, tables::CATEGORIES, &id, token.as_deref())
}

/// GET /api/subscriptions
async fn get_subscriptions(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = caller_token(&headers);
    list_table(
        &state,
        tables::SUBSCRIPTIONS,
        TableQuery::new().order_asc("next_billing_date"),
        token.as_deref(),
    )
}

/// POST /api/subscriptions
async fn create_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let row = stamp_user(body, token.as_deref());
    insert_table(&state, tables::SUBSCRIPTIONS, &row, token.as_deref())
}

/// DELETE /api/subscriptions/:id
async fn delete_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    delete_table(&state, tables::SUBSCRIPTIONS, &id, token.as_deref())
}

/// GET /api/subscriptions/upcoming?days=30 - renewals due soon
async fn get_upcoming_renewals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let days: i64 = params.get("days").and_then(|v| v.parse().ok()).unwrap_or(30);

    let subscriptions: Vec<Subscription> = match state.store.select(
        tables::SUBSCRIPTIONS,
        &TableQuery::new().order_asc("next_billing_date"),
        token.as_deref(),
    ) {
        Ok(rows) => rows,
        Err(e) => return store_failure(tables::SUBSCRIPTIONS, e),
    };

    let today = Utc::now().date_naive();
    let due = upcoming_renewals(&subscriptions, today, days);
    ApiResponse::ok(json!({
        "days": days,
        "total_monthly_cost": total_monthly_cost(&subscriptions),
        "renewals": due,
    }))
    .into_response()
}

/// GET /api/goals
async fn get_goals(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = caller_token(&headers);
    list_table(
        &state,
        tables::SAVINGS_GOALS,
        TableQuery::new().order_asc("name"),
        token.as_deref(),
    )
}

/// POST /api/goals
async fn create_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let row = stamp_user(body, token.as_deref());
    insert_table(&state, tables::SAVINGS_GOALS, &row, token.as_deref())
}

/// PUT /api/goals/:id
async fn update_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    update_table(&state, tables::SAVINGS_GOALS, &id, &patch, token.as_deref())
}

/// DELETE /api/goals/:id
async fn delete_goal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    delete_table(&state, tables::SAVINGS_GOALS, &id, token.as_deref())
}

/// GET /api/assets
async fn get_assets(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = caller_token(&headers);
    list_table(
        &state,
        tables::ASSETS,
        TableQuery::new().order_asc("purchase_date"),
        token.as_deref(),
    )
}

/// POST /api/assets
async fn create_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let row = stamp_user(body, token.as_deref());
    insert_table(&state, tables::ASSETS, &row, token.as_deref())
}

/// DELETE /api/assets/:id
async fn delete_asset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    delete_table(&state, tables::ASSETS, &id, token.as_deref())
}

/// GET /api/assets/:id/depreciation - straight-line schedule + current NBV
async fn get_depreciation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let token = caller_token(&headers);

    let assets: Vec<Asset> = match state.store.select(
        tables::ASSETS,
        &TableQuery::new().eq("id", &id),
        token.as_deref(),
    ) {
        Ok(rows) => rows,
        Err(e) => return store_failure(tables::ASSETS, e),
    };

    let Some(asset) = assets.into_iter().next() else {
        return (
            StatusCode::NOT_FOUND,
            ApiResponse::<Value>::fail("asset not found"),
        )
            .into_response();
    };

    let today = Utc::now().date_naive();
    let current_nbv = asset.current_nbv(today);
    let schedule = asset.depreciation_schedule();
    ApiResponse::ok(json!({
        "asset": asset,
        "current_nbv": current_nbv,
        "schedule": schedule,
    }))
    .into_response()
}

// ============================================================================
// DASHBOARD / SCORE / ALERTS
// ============================================================================

/// Fetch the caller's transactions and categories in one shot
fn load_finances(
    state: &AppState,
    token: Option<&str>,
) -> Result<(Vec<Transaction>, Vec<Category>), StoreError> {
    let transactions: Vec<Transaction> = state.store.select(
        tables::TRANSACTIONS,
        &TableQuery::new().order_asc("date"),
        token,
    )?;
    let categories: Vec<Category> =
        state
            .store
            .select(tables::CATEGORIES, &TableQuery::new(), token)?;
    Ok((transactions, categories))
}

/// GET /api/dashboard - everything the landing page renders
async fn get_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);

    let (transactions, categories) = match load_finances(&state, token.as_deref()) {
        Ok(data) => data,
        Err(e) => return store_failure("dashboard", e),
    };
    let subscriptions: Vec<Subscription> = match state.store.select(
        tables::SUBSCRIPTIONS,
        &TableQuery::new(),
        token.as_deref(),
    ) {
        Ok(rows) => rows,
        Err(e) => return store_failure(tables::SUBSCRIPTIONS, e),
    };

    let months = monthly_aggregates(&transactions);
    let options = score_options(&params);
    let health = health_score(&months, &options);
    let current_month = MonthKey::from_date(Utc::now().date_naive());
    let alerts = evaluate_alerts(&transactions, &categories, current_month);
    let today = Utc::now().date_naive();

    ApiResponse::ok(json!({
        "months": months,
        "spending_by_category": spending_by_category(&transactions, &categories),
        "recent_transactions": recent_transactions(&transactions, 10),
        "health": health,
        "alerts": alerts,
        "subscriptions_monthly_total": total_monthly_cost(&subscriptions),
        "upcoming_renewals": upcoming_renewals(&subscriptions, today, 30),
    }))
    .into_response()
}

/// GET /api/score?emergency_fund=..&lookback=..
async fn get_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);

    let transactions: Vec<Transaction> = match state.store.select(
        tables::TRANSACTIONS,
        &TableQuery::new().order_asc("date"),
        token.as_deref(),
    ) {
        Ok(rows) => rows,
        Err(e) => return store_failure(tables::TRANSACTIONS, e),
    };

    let months = monthly_aggregates(&transactions);
    let report = health_score(&months, &score_options(&params));
    ApiResponse::ok(report).into_response()
}

/// GET /api/alerts?month=YYYY-MM
async fn get_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let month = match month_param(&params) {
        Ok(m) => m,
        Err(response) => return response,
    };

    let (transactions, categories) = match load_finances(&state, token.as_deref()) {
        Ok(data) => data,
        Err(e) => return store_failure("alerts", e),
    };

    ApiResponse::ok(evaluate_alerts(&transactions, &categories, month)).into_response()
}

// ============================================================================
// EXPORTS
// ============================================================================

/// GET /api/export/csv - transactions as a CSV attachment
async fn export_csv(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = caller_token(&headers);

    let (transactions, categories) = match load_finances(&state, token.as_deref()) {
        Ok(data) => data,
        Err(e) => return store_failure("export", e),
    };

    match transactions_to_csv(&transactions, &categories) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"finora-transactions.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("csv export failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::<Value>::fail(e.to_string()),
            )
                .into_response()
        }
    }
}

/// GET /api/export/report?month=YYYY-MM - printable HTML report
async fn export_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let token = caller_token(&headers);
    let month = match month_param(&params) {
        Ok(m) => m,
        Err(response) => return response,
    };

    let (transactions, categories) = match load_finances(&state, token.as_deref()) {
        Ok(data) => data,
        Err(e) => return store_failure("report", e),
    };

    let months = monthly_aggregates(&transactions);
    let health = health_score(&months, &score_options(&params));
    let alerts = evaluate_alerts(&transactions, &categories, month);
    let month_transactions = finora::aggregates::transactions_in_month(&transactions, month);

    let bundle = ReportBundle {
        title: format!("Finora Report - {}", month.label()),
        transactions: &month_transactions,
        categories: &categories,
        months: &months,
        health: &health,
        alerts: &alerts,
    };

    Html(render_html_report(&bundle)).into_response()
}

// ============================================================================
// AI PROXY
// ============================================================================

/// Run the shared daily quota; `None` means the request may proceed
fn check_ai_quota(
    state: &AppState,
    headers: &HeaderMap,
    addr: &SocketAddr,
) -> Option<axum::response::Response> {
    let user = caller_token(headers).and_then(|t| subject_claim(&t));
    let ip = client_ip(headers, addr);
    let key = quota_key(user.as_deref(), &ip);

    let today = Utc::now().date_naive();
    if state.quota.check(&key, today).is_allowed() {
        None
    } else {
        Some(
            (
                StatusCode::TOO_MANY_REQUESTS,
                ApiResponse::<Value>::fail(format!(
                    "daily AI limit of {} requests reached - resets at midnight UTC",
                    state.quota.limit()
                )),
            )
                .into_response(),
        )
    }
}

fn ai_client(state: &AppState) -> Result<&AiClient, axum::response::Response> {
    state.ai.as_deref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiResponse::<Value>::fail("AI is not configured on this server"),
        )
            .into_response()
    })
}

/// POST /api/ai/summary - one-shot financial summary
async fn ai_summary(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(rejection) = check_ai_quota(&state, &headers, &addr) {
        return rejection;
    }
    let client = match ai_client(&state) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let request = match SummaryRequest::from_json(&body) {
        Ok(r) => r,
        Err(e) => return ai_failure("ai summary payload", e),
    };

    let options = ScoreOptions {
        emergency_fund_amount: request.snapshot.emergency_fund,
        ..Default::default()
    };
    let health = health_score(&request.snapshot.months, &options);
    let messages = build_summary_messages(&request.snapshot, &health);

    match client.generate(&messages, SUMMARY_SYSTEM_PROMPT) {
        Ok(text) => ApiResponse::ok(json!({"summary": text, "health": health})).into_response(),
        Err(e) => ai_failure("ai summary", e),
    }
}

/// POST /api/ai/followup - follow-up chat turn
async fn ai_followup(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if let Some(rejection) = check_ai_quota(&state, &headers, &addr) {
        return rejection;
    }
    let client = match ai_client(&state) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let request = match FollowupRequest::from_json(&body) {
        Ok(r) => r,
        Err(e) => return ai_failure("ai followup payload", e),
    };

    let options = ScoreOptions {
        emergency_fund_amount: request.snapshot.emergency_fund,
        ..Default::default()
    };
    let health = health_score(&request.snapshot.months, &options);
    let messages = build_followup_messages(&request, &health);

    match client.generate(&messages, SUMMARY_SYSTEM_PROMPT) {
        Ok(text) => ApiResponse::ok(json!({"reply": text})).into_response(),
        Err(e) => ai_failure("ai followup", e),
    }
}

// ============================================================================
// MAIN SERVER
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finora_server=info,finora=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let ai = match AiClient::from_env(config.ai_backend) {
        Ok(client) => {
            info!("AI backend ready (model {})", client.model());
            Some(Arc::new(client))
        }
        Err(e) => {
            info!("AI endpoints disabled: {}", e);
            None
        }
    };

    let state = AppState {
        store: Arc::new(Store::new(&config.store_url, &config.store_anon_key)),
        quota: Arc::new(DailyQuota::new(config.ai_daily_limit)),
        ai,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/score", get(get_score))
        .route("/alerts", get(get_alerts))
        .route("/transactions", get(get_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            axum::routing::put(update_transaction).delete(delete_transaction),
        )
        .route("/categories", get(get_categories).post(create_category))
        .route(
            "/categories/:id",
            axum::routing::put(update_category).delete(delete_category),
        )
        .route("/subscriptions", get(get_subscriptions).post(create_subscription))
        .route("/subscriptions/upcoming", get(get_upcoming_renewals))
        .route("/subscriptions/:id", axum::routing::delete(delete_subscription))
        .route("/goals", get(get_goals).post(create_goal))
        .route("/goals/:id", axum::routing::put(update_goal).delete(delete_goal))
        .route("/assets", get(get_assets).post(create_asset))
        .route("/assets/:id", axum::routing::delete(delete_asset))
        .route("/assets/:id/depreciation", get(get_depreciation))
        .route("/export/csv", get(export_csv))
        .route("/export/report", get(export_report))
        .route("/ai/summary", post(ai_summary))
        .route("/ai/followup", post(ai_followup))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("finora-server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
