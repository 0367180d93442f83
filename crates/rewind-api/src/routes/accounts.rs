//! Routes for bank accounts, including history and time travel.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rewind_core::repository::StoredEvent;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use rewind_ledger::application::query_handlers::{
    self, AccountSnapshotView, AccountView, TimelineView,
};
use rewind_ledger::application::command_handlers;
use rewind_ledger::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    /// The account holder's name.
    pub account_holder: String,
    /// Opening balance.
    pub initial_balance: Decimal,
    /// ISO currency code; `USD` when omitted.
    #[serde(default)]
    pub currency: Option<String>,
}

/// Request body for POST /{id}/deposit and POST /{id}/withdraw.
#[derive(Debug, Deserialize)]
pub struct MoneyRequest {
    /// Amount to move.
    pub amount: Decimal,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// Request body for PATCH /{id}/holder.
#[derive(Debug, Deserialize)]
pub struct ChangeHolderRequest {
    /// The new holder name.
    pub new_name: String,
}

/// Request body for POST /{id}/close.
#[derive(Debug, Deserialize)]
pub struct CloseAccountRequest {
    /// Why the account is being closed.
    pub reason: String,
}

/// POST /
#[instrument(skip(state, request))]
async fn open_account(
    State(state): State<AppState>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountView>), ApiError> {
    let command = commands::OpenAccount {
        account_id: Uuid::now_v7(),
        account_holder: request.account_holder,
        initial_balance: request.initial_balance,
        currency: request.currency,
    };

    info!(account_id = %command.account_id, "handling open_account command");

    let view =
        command_handlers::handle_open_account(&command, state.clock.as_ref(), &state.store).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /
#[instrument(skip(state))]
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountView>>, ApiError> {
    let accounts = query_handlers::list_accounts(&state.store).await?;
    Ok(Json(accounts))
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, ApiError> {
    let view = query_handlers::get_account(account_id, &state.store).await?;
    Ok(Json(view))
}

/// POST /{id}/deposit
#[instrument(skip(state, request))]
async fn deposit(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<MoneyRequest>,
) -> Result<Json<AccountView>, ApiError> {
    let command = commands::Deposit {
        account_id,
        amount: request.amount,
        description: request.description,
    };

    info!(amount = %command.amount, "handling deposit command");

    let view =
        command_handlers::handle_deposit(&command, state.clock.as_ref(), &state.store).await?;

    Ok(Json(view))
}

/// POST /{id}/withdraw
#[instrument(skip(state, request))]
async fn withdraw(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<MoneyRequest>,
) -> Result<Json<AccountView>, ApiError> {
    let command = commands::Withdraw {
        account_id,
        amount: request.amount,
        description: request.description,
    };

    info!(amount = %command.amount, "handling withdraw command");

    let view =
        command_handlers::handle_withdraw(&command, state.clock.as_ref(), &state.store).await?;

    Ok(Json(view))
}

/// PATCH /{id}/holder
#[instrument(skip(state, request))]
async fn change_holder(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<ChangeHolderRequest>,
) -> Result<Json<AccountView>, ApiError> {
    let command = commands::ChangeAccountHolder {
        account_id,
        new_name: request.new_name,
    };

    info!("handling change_holder command");

    let view =
        command_handlers::handle_change_holder(&command, state.clock.as_ref(), &state.store)
            .await?;

    Ok(Json(view))
}

/// POST /{id}/close
#[instrument(skip(state, request))]
async fn close_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(request): Json<CloseAccountRequest>,
) -> Result<Json<AccountView>, ApiError> {
    let command = commands::CloseAccount {
        account_id,
        reason: request.reason,
    };

    info!("handling close_account command");

    let view =
        command_handlers::handle_close_account(&command, state.clock.as_ref(), &state.store)
            .await?;

    Ok(Json(view))
}

/// GET /{id}/events
#[instrument(skip(state))]
async fn get_events(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Vec<StoredEvent>>, ApiError> {
    let events = query_handlers::get_account_events(account_id, &state.store).await?;
    Ok(Json(events))
}

/// GET /{id}/timeline
#[instrument(skip(state))]
async fn get_timeline(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<TimelineView>, ApiError> {
    let timeline = query_handlers::get_account_timeline(account_id, &state.store).await?;
    Ok(Json(timeline))
}

/// GET /{id}/state/{version}
#[instrument(skip(state))]
async fn get_state_at_version(
    State(state): State<AppState>,
    Path((account_id, version)): Path<(Uuid, i64)>,
) -> Result<Json<AccountSnapshotView>, ApiError> {
    let snapshot =
        query_handlers::get_account_state_at_version(account_id, version, &state.store).await?;
    Ok(Json(snapshot))
}

/// Returns the router for bank accounts.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_account).get(list_accounts))
        .route("/{id}", get(get_account))
        .route("/{id}/deposit", post(deposit))
        .route("/{id}/withdraw", post(withdraw))
        .route("/{id}/holder", patch(change_holder))
        .route("/{id}/close", post(close_account))
        .route("/{id}/events", get(get_events))
        .route("/{id}/timeline", get(get_timeline))
        .route("/{id}/state/{version}", get(get_state_at_version))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use rewind_core::clock::Clock;
    use rewind_core::repository::EventRepository;
    use rewind_test_support::{EmptyEventRepository, FailingEventRepository, FixedClock};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(event_repository: Arc<dyn EventRepository>) -> AppState {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        AppState::new(clock, event_repository)
    }

    fn test_app_state() -> AppState {
        app_state_with(Arc::new(EmptyEventRepository))
    }

    fn failing_app_state() -> AppState {
        app_state_with(Arc::new(FailingEventRepository))
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_open_account_returns_201_with_view() {
        // Arrange
        let app = router().with_state(test_app_state());
        let body = serde_json::json!({
            "account_holder": "Alice",
            "initial_balance": "100.00"
        });

        // Act
        let (status, json) = send(app, "POST", "/", Some(body)).await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["account_holder"], "Alice");
        assert_eq!(json["balance"], "100.00");
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["is_closed"], false);
        assert_eq!(json["version"], 1);
        Uuid::parse_str(json["id"].as_str().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_open_account_returns_400_for_blank_holder() {
        // Arrange
        let app = router().with_state(test_app_state());
        let body = serde_json::json!({ "account_holder": " ", "initial_balance": 10 });

        // Act
        let (status, json) = send(app, "POST", "/", Some(body)).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_argument");
    }

    #[tokio::test]
    async fn test_open_account_returns_422_for_missing_fields() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, _) = send(app, "POST", "/", Some(serde_json::json!({}))).await;

        // Assert: axum returns 422 for deserialization failures.
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_account_returns_404_for_unknown_id() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, json) = send(app, "GET", &format!("/{}", Uuid::new_v4()), None).await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_get_account_returns_400_for_malformed_id() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, _) = send(app, "GET", "/not-a-uuid", None).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deposit_returns_500_when_repository_fails() {
        // Arrange
        let app = router().with_state(failing_app_state());
        let uri = format!("/{}/deposit", Uuid::new_v4());
        let body = serde_json::json!({ "amount": 5 });

        // Act
        let (status, json) = send(app, "POST", &uri, Some(body)).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_list_accounts_returns_500_when_repository_fails() {
        // Arrange
        let app = router().with_state(failing_app_state());

        // Act
        let (status, json) = send(app, "GET", "/", None).await;

        // Assert
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_list_accounts_returns_empty_array_when_no_accounts() {
        // Arrange
        let app = router().with_state(test_app_state());

        // Act
        let (status, json) = send(app, "GET", "/", None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }
}
