//! Cart endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::cart::{Cart, CartItem};
use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    #[serde(default)]
    pub user_id: String,
    pub item: CartItem,
}

#[derive(Debug, Deserialize)]
pub struct GetCartParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub item_id: String,
}

/// Body returned by successful mutations.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBody {
    pub status: String,
}

impl StatusBody {
    fn success() -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
        })
    }
}

/// Handler for POST /cart/add.
#[instrument(skip_all)]
pub async fn add_to_cart_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;

    if req.user_id.is_empty() {
        return Err(ApiError::MissingField("user_id"));
    }
    if req.item.id.is_empty() {
        return Err(ApiError::MissingField("item.id"));
    }
    if req.item.quantity == 0 {
        return Err(ApiError::InvalidItem("quantity must be positive"));
    }
    if req.item.price.is_sign_negative() {
        return Err(ApiError::InvalidItem("price must not be negative"));
    }

    debug!(user_id = %req.user_id, item_id = %req.item.id, "Processing /cart/add request");
    state.store.add_item(&req.user_id, req.item);
    Ok(StatusBody::success())
}

/// Handler for GET /cart/get.
#[instrument(skip_all)]
pub async fn get_cart_handler(
    State(state): State<SharedState>,
    Query(params): Query<GetCartParams>,
) -> Result<Json<Cart>, ApiError> {
    let user_id = params
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingField("user_id"))?;

    debug!(user_id = %user_id, "Processing /cart/get request");
    let cart = state.store.get_cart(&user_id)?;
    Ok(Json(cart))
}

/// Handler for DELETE /cart/remove.
#[instrument(skip_all)]
pub async fn remove_from_cart_handler(
    State(state): State<SharedState>,
    payload: Result<Json<RemoveItemRequest>, JsonRejection>,
) -> Result<Json<StatusBody>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;

    debug!(user_id = %req.user_id, item_id = %req.item_id, "Processing /cart/remove request");
    state.store.remove_item(&req.user_id, &req.item_id)?;
    Ok(StatusBody::success())
}
