use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tracing::error;

use super::domain::{EntityId, Scoped};
use super::error::OrderingError;
use super::service::{OrderingService, RankNotifier};
use super::store::OrderStore;

/// Router builder exposing create, list, move, replace, and delete for one ordered kind.
pub fn ordering_router<T, S, N>(service: Arc<OrderingService<T, S, N>>) -> Router
where
    T: Scoped + serde::de::DeserializeOwned + serde::Serialize,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    let collection = format!("/api/v1/{}", T::COLLECTION);
    let member = format!("{collection}/:id");
    // Scope and member routes share the `:id` segment name so kinds can be merged
    // (e.g. `/divisions/:id` next to `/divisions/:id/roles`).
    let scoped = format!("/api/v1/{}/:id/{}", T::SCOPE_COLLECTION, T::COLLECTION);

    Router::new()
        .route(&collection, post(create_handler::<T, S, N>))
        .route(
            &member,
            get(fetch_handler::<T, S, N>)
                .put(replace_handler::<T, S, N>)
                .delete(delete_handler::<T, S, N>),
        )
        .route(&format!("{member}/move"), patch(move_handler::<T, S, N>))
        .route(&scoped, get(list_handler::<T, S, N>))
        .with_state(service)
}

/// Route that moves an entity to the head of its scope.
pub fn cast_route<T, S, N>(service: Arc<OrderingService<T, S, N>>) -> Router
where
    T: Scoped,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    Router::new()
        .route(
            &format!("/api/v1/{}/:id/cast", T::COLLECTION),
            patch(cast_handler::<T, S, N>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    axum::Json(value): axum::Json<T>,
) -> Response
where
    T: Scoped + serde::Serialize,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.create(value) {
        Ok(entity) => (StatusCode::CREATED, axum::Json(entity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn fetch_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    T: Scoped + serde::Serialize,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.get(EntityId(id)) {
        Ok(entity) => (StatusCode::OK, axum::Json(entity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(scope): Path<T::Scope>,
) -> Response
where
    T: Scoped + serde::Serialize,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.list_scope(scope) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn move_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(id): Path<u64>,
    body: Option<axum::Json<Value>>,
) -> Response
where
    T: Scoped,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    let body = body.map(|axum::Json(value)| value).unwrap_or(Value::Null);
    match service.handle_move(EntityId(id), &body) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn cast_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    T: Scoped,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.cast(EntityId(id)) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn replace_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(id): Path<u64>,
    axum::Json(value): axum::Json<T>,
) -> Response
where
    T: Scoped + serde::Serialize,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.replace(EntityId(id), value) {
        Ok(entity) => (StatusCode::OK, axum::Json(entity)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<T, S, N>(
    State(service): State<Arc<OrderingService<T, S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    T: Scoped,
    S: OrderStore<T> + 'static,
    N: RankNotifier<T> + 'static,
{
    match service.delete(EntityId(id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: OrderingError) -> Response {
    let (status, payload) = match &err {
        OrderingError::MissingParameter => {
            (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
        }
        OrderingError::InvalidType | OrderingError::OutOfRange { .. } => {
            (StatusCode::BAD_REQUEST, json!({ "order": [err.to_string()] }))
        }
        OrderingError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        OrderingError::TransactionAborted(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": err.to_string(), "retryable": true }),
        ),
        OrderingError::EmptyScope => {
            error!(error = %err, "ordering invariant violated");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            )
        }
    };
    (status, axum::Json(payload)).into_response()
}
