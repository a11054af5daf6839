//! REST API Server for the finance tracker
//!
//! Exposes goals, expenses, survey answers and goal advice over HTTP.
//! Every `/api` route needs a bearer token; `/api/staff` routes also need
//! the staff role.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::advisor::GoalAdvisor;
use crate::auth::{bearer_token, AuthenticatedUser, TokenVerifier};
use crate::config::Config;
use crate::error::TrackerError;
use crate::models::{AdviceReport, Expense, FinancialProfile, Goal, User};
use crate::stats::{platform_stats, user_summaries, PlatformStats, UserSummary};
use crate::store::TrackerStore;
use crate::Result;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::models::lenient::amount")]
    pub target_amount: f64,
    #[serde(default, deserialize_with = "crate::models::lenient::optional_timestamp")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Partial goal update. Absent fields are left alone; `deadline: null` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "patch_amount")]
    pub target_amount: Option<f64>,
    #[serde(default, deserialize_with = "patch_amount")]
    pub current_amount: Option<f64>,
    /// Signed contribution: positive adds money, negative withdraws
    #[serde(default, deserialize_with = "patch_amount")]
    pub adjust_by: Option<f64>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "patch_timestamp")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default, deserialize_with = "crate::models::lenient::amount")]
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::models::lenient::optional_timestamp")]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesPayload {
    pub categories: Vec<String>,
}

fn patch_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    crate::models::lenient::amount(deserializer).map(Some)
}

fn patch_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    crate::models::lenient::optional_timestamp(deserializer).map(Some)
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalAdviceResponse {
    pub goal: Goal,
    pub progress_percent: f64,
    pub advice: AdviceReport,
    pub text: String,
}

type ApiReply = (StatusCode, Json<ApiResponse>);

fn reply<T: Serialize>(status: StatusCode, result: Result<T>) -> ApiReply {
    match result {
        Ok(data) => (status, Json(ApiResponse::success(data))),
        Err(e) => {
            let code = e.status_code();
            if code.is_server_error() {
                error!(error = %e, "Request failed");
            } else {
                debug!(error = %e, status = %code, "Request rejected");
            }
            (code, Json(ApiResponse::error(e.public_message())))
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn TrackerStore>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl ApiState {
    pub fn new(store: Arc<dyn TrackerStore>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { store, verifier }
    }
}

/// Verify the bearer token and record the visit
async fn authenticate(state: &ApiState, headers: &HeaderMap) -> Result<(AuthenticatedUser, User)> {
    let token = bearer_token(headers).ok_or(TrackerError::Unauthorized)?;
    let identity = state.verifier.verify(token).await?;
    let user = state.store.touch_user(&identity, Utc::now()).await?;
    Ok((identity, user))
}

/// Unwrap a JSON body. Runs after authentication so bad bodies from
/// anonymous callers still get a 401.
fn parse_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| TrackerError::InvalidInput(rejection.body_text()))
}

/// Load a goal the caller owns. Someone else's goal looks missing.
async fn owned_goal(state: &ApiState, user: &User, goal_id: Uuid) -> Result<Goal> {
    match state.store.load_goal(goal_id).await? {
        Some(goal) if goal.user_id == user.id => Ok(goal),
        _ => Err(TrackerError::NotFound("Goal".to_string())),
    }
}

fn ensure_amount(name: &str, value: f64, allow_zero: bool) -> Result<()> {
    let ok = value.is_finite() && if allow_zero { value >= 0.0 } else { value > 0.0 };
    if ok {
        Ok(())
    } else {
        let bound = if allow_zero { "zero or more" } else { "greater than zero" };
        Err(TrackerError::InvalidInput(format!("{} must be {}", name, bound)))
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Survey & Categories
/// =============================

async fn get_financial_info(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<FinancialProfile> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        Ok(state.store.load_profile(&user.id).await?.unwrap_or_default())
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn save_financial_info(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: std::result::Result<Json<FinancialProfile>, JsonRejection>,
) -> ApiReply {
    let result: Result<FinancialProfile> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let profile = parse_body(body)?;
        ensure_amount("monthlyIncome", profile.monthly_income, true)?;
        info!(
            user_id = %user.id,
            frequency = %profile.income_frequency,
            survey_completed = profile.survey_completed,
            "Saving financial info"
        );
        state.store.save_profile(&user.id, profile).await
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn get_categories(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<CategoriesPayload> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        Ok(CategoriesPayload {
            categories: user.expense_categories,
        })
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn save_categories(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: std::result::Result<Json<CategoriesPayload>, JsonRejection>,
) -> ApiReply {
    let result: Result<CategoriesPayload> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let payload = parse_body(body)?;
        let categories: Vec<String> = payload
            .categories
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let categories = state.store.set_categories(&user.id, categories).await?;
        Ok(CategoriesPayload { categories })
    }
    .await;
    reply(StatusCode::OK, result)
}

/// =============================
/// Goals
/// =============================

async fn list_goals(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<Vec<Goal>> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        state.store.list_goals(&user.id).await
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn create_goal(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: std::result::Result<Json<CreateGoalRequest>, JsonRejection>,
) -> ApiReply {
    let result: Result<Goal> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let req = parse_body(body)?;

        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(TrackerError::InvalidInput("title is required".to_string()));
        }
        ensure_amount("targetAmount", req.target_amount, false)?;

        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: user.id.clone(),
            title,
            description: req.description,
            target_amount: req.target_amount,
            current_amount: 0.0,
            deadline: req.deadline,
            completed: false,
            created_at: Utc::now(),
        };
        state.store.persist_goal(&goal).await?;

        info!(user_id = %user.id, goal_id = %goal.id, "Goal created");
        Ok(goal)
    }
    .await;
    reply(StatusCode::CREATED, result)
}

async fn get_goal(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> ApiReply {
    let result: Result<Goal> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        owned_goal(&state, &user, goal_id).await
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn update_goal(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
    body: std::result::Result<Json<UpdateGoalRequest>, JsonRejection>,
) -> ApiReply {
    let result: Result<Goal> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let req = parse_body(body)?;
        let mut goal = owned_goal(&state, &user, goal_id).await?;

        if let Some(title) = req.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(TrackerError::InvalidInput("title is required".to_string()));
            }
            goal.title = title;
        }
        if let Some(description) = req.description {
            goal.description = Some(description);
        }
        if let Some(target) = req.target_amount {
            ensure_amount("targetAmount", target, false)?;
            goal.target_amount = target;
        }
        if let Some(current) = req.current_amount {
            ensure_amount("currentAmount", current, true)?;
            goal.current_amount = current;
        }
        if let Some(delta) = req.adjust_by {
            if !delta.is_finite() {
                return Err(TrackerError::InvalidInput("adjustBy must be a number".to_string()));
            }
            goal.adjust_current(delta);
        }
        if let Some(completed) = req.completed {
            goal.completed = completed;
        }
        if let Some(deadline) = req.deadline {
            goal.deadline = deadline;
        }

        state.store.persist_goal(&goal).await?;
        debug!(goal_id = %goal.id, current = goal.current_amount, "Goal updated");
        Ok(goal)
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn delete_goal(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> ApiReply {
    let result: Result<serde_json::Value> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let goal = owned_goal(&state, &user, goal_id).await?;
        state.store.delete_goal(goal.id).await?;
        info!(user_id = %user.id, goal_id = %goal.id, "Goal deleted");
        Ok(serde_json::json!({ "id": goal.id }))
    }
    .await;
    reply(StatusCode::OK, result)
}

/// =============================
/// Goal Advice Endpoint
/// =============================

async fn goal_advice(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(goal_id): Path<Uuid>,
) -> ApiReply {
    let result: Result<GoalAdviceResponse> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let goal = owned_goal(&state, &user, goal_id).await?;
        let profile = state.store.load_profile(&user.id).await?;
        let expenses = state.store.list_expenses(&user.id).await?;

        let advice = GoalAdvisor::compute_advice(&goal, profile.as_ref(), &expenses, Utc::now());
        info!(
            user_id = %user.id,
            goal_id = %goal.id,
            lines = advice.len(),
            "Advice generated"
        );

        Ok(GoalAdviceResponse {
            progress_percent: goal.progress_percent(),
            text: advice.to_text(),
            advice,
            goal,
        })
    }
    .await;
    reply(StatusCode::OK, result)
}

/// =============================
/// Expenses
/// =============================

async fn list_expenses(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<Vec<Expense>> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        state.store.list_expenses(&user.id).await
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn create_expense(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: std::result::Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> ApiReply {
    let result: Result<Expense> = async {
        let (_, user) = authenticate(&state, &headers).await?;
        let req = parse_body(body)?;

        let category = req.category.trim().to_string();
        if category.is_empty() {
            return Err(TrackerError::InvalidInput("category is required".to_string()));
        }
        ensure_amount("amount", req.amount, true)?;

        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: user.id.clone(),
            category,
            subcategory: req.subcategory,
            amount: req.amount,
            description: req.description,
            date: req.date.unwrap_or_else(Utc::now),
        };
        state.store.persist_expense(expense.clone()).await?;

        debug!(user_id = %user.id, amount = expense.amount, "Expense recorded");
        Ok(expense)
    }
    .await;
    reply(StatusCode::CREATED, result)
}

/// =============================
/// Staff Endpoints
/// =============================

async fn staff_access(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<serde_json::Value> = async {
        let (identity, _) = authenticate(&state, &headers).await?;
        identity.require_staff()?;
        Ok(serde_json::json!({ "access": "granted" }))
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn staff_stats(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<PlatformStats> = async {
        let (identity, _) = authenticate(&state, &headers).await?;
        identity.require_staff()?;
        let users = state.store.list_users().await?;
        let goals = state.store.all_goals().await?;
        Ok(platform_stats(&users, &goals, Utc::now()))
    }
    .await;
    reply(StatusCode::OK, result)
}

async fn staff_users(State(state): State<ApiState>, headers: HeaderMap) -> ApiReply {
    let result: Result<Vec<UserSummary>> = async {
        let (identity, _) = authenticate(&state, &headers).await?;
        identity.require_staff()?;
        let users = state.store.list_users().await?;
        let goals = state.store.all_goals().await?;
        let expenses = state.store.all_expenses().await?;
        Ok(user_summaries(&users, &goals, &expenses))
    }
    .await;
    reply(StatusCode::OK, result)
}

/// =============================
/// Router
/// =============================

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: ApiState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/user/financial-info",
            get(get_financial_info).post(save_financial_info),
        )
        .route("/api/categories", get(get_categories).post(save_categories))
        .route("/api/goals", get(list_goals).post(create_goal))
        .route(
            "/api/goals/:id",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
        .route("/api/goals/:id/advice", get(goal_advice))
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route("/api/staff/access", get(staff_access))
        .route("/api/staff/stats", get(staff_stats))
        .route("/api/staff/users", get(staff_users))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    config: &Config,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state, config);
    let addr = config.listen_addr();

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API Server listening on http://{}", addr);
    info!("Local: http://127.0.0.1:{}", config.port);

    axum::serve(listener, router).await?;

    Ok(())
}
