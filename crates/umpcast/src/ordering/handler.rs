use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::domain::{EntityId, Reordering, Scoped};
use super::engine::OrderEngine;
use super::error::OrderingError;
use super::store::OrderStore;

/// Validated body of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub order: i64,
}

impl MoveRequest {
    /// Extract the target order from a JSON body such as `{"order": 2}`.
    ///
    /// Only JSON integers are accepted; bounds are checked later, against the
    /// scope, while it is locked.
    pub fn from_json(body: &Value) -> Result<Self, OrderingError> {
        match body.get("order") {
            None | Some(Value::Null) => Err(OrderingError::MissingParameter),
            Some(Value::Number(number)) => number
                .as_i64()
                .map(|order| Self { order })
                .ok_or(OrderingError::InvalidType),
            Some(_) => Err(OrderingError::InvalidType),
        }
    }
}

/// Entry point for externally requested moves.
///
/// Callers must have authorized the move against the entity's scope before
/// calling `handle`.
pub struct MoveOperationHandler<T, S> {
    engine: OrderEngine<T, S>,
}

impl<T, S> MoveOperationHandler<T, S>
where
    T: Scoped,
    S: OrderStore<T> + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_engine(OrderEngine::new(store))
    }

    pub fn with_engine(engine: OrderEngine<T, S>) -> Self {
        Self { engine }
    }

    pub fn handle(&self, id: EntityId, body: &Value) -> Result<Reordering, OrderingError> {
        let request = MoveRequest::from_json(body).map_err(|err| {
            warn!(kind = T::KIND, %id, error = %err, "rejected move request");
            err
        })?;
        self.engine.move_to(id, request.order).map_err(|err| {
            if err.is_client_error() {
                warn!(kind = T::KIND, %id, order = request.order, error = %err, "move refused");
            }
            err
        })
    }
}
