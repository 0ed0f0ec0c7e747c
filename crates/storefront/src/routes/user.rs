//! Account route handlers. Every handler requires a session.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use akaar_core::AddressId;

use crate::db::{AddressRepository, OrderRepository, QuoteRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::AddressInput;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Address fields as sent by the account pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AddressPayload {
    /// Validate required fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if first name, last name, address,
    /// city, state or zip is missing.
    pub fn into_input(self) -> Result<AddressInput> {
        let (Some(first_name), Some(last_name), Some(address), Some(city), Some(state), Some(zip)) = (
            trimmed(self.first_name),
            trimmed(self.last_name),
            trimmed(self.address),
            trimmed(self.city),
            trimmed(self.state),
            trimmed(self.zip),
        ) else {
            return Err(AppError::BadRequest("Missing required fields".to_string()));
        };

        Ok(AddressInput {
            label: trimmed(self.label),
            address_type: trimmed(self.address_type).unwrap_or_else(|| "home".to_string()),
            first_name,
            last_name,
            address,
            apartment: trimmed(self.apartment),
            city,
            state,
            zip,
            country: trimmed(self.country).unwrap_or_else(|| "India".to_string()),
            phone: trimmed(self.phone),
            is_default: self.is_default,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

fn address_not_found() -> AppError {
    AppError::NotFound("Address not found".to_string())
}

fn parse_address_id(id: &str) -> Result<AddressId> {
    id.parse().map_err(|_| address_not_found())
}

// =============================================================================
// Profile
// =============================================================================

/// `GET /api/user/profile`
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(json!({ "user": user })))
}

/// `PUT /api/user/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Value>> {
    let name = trimmed(update.name);
    let phone = trimmed(update.phone);

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, name.as_deref(), phone.as_deref())
        .await?;

    Ok(Json(json!({ "user": user })))
}

// =============================================================================
// History
// =============================================================================

/// `GET /api/user/orders`
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/user/quotes`
pub async fn quotes(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let quotes = QuoteRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(json!({ "quotes": quotes })))
}

// =============================================================================
// Addresses
// =============================================================================

/// `GET /api/user/addresses`
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(json!({ "addresses": addresses })))
}

/// `POST /api/user/addresses`
#[tracing::instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(payload): ApiJson<AddressPayload>,
) -> Result<Json<Value>> {
    let input = payload.into_input()?;

    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    Ok(Json(json!({ "address": address })))
}

/// `PUT /api/user/addresses/{id}`
#[tracing::instrument(skip_all)]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<AddressPayload>,
) -> Result<Json<Value>> {
    let id = parse_address_id(&id)?;
    let input = payload.into_input()?;

    let address = AddressRepository::new(state.pool())
        .update(id, user.id, &input)
        .await?
        .ok_or_else(address_not_found)?;

    Ok(Json(json!({ "address": address })))
}

/// `DELETE /api/user/addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Value>> {
    let id = parse_address_id(&id)?;

    let deleted = AddressRepository::new(state.pool())
        .delete(id, user.id)
        .await?;
    if !deleted {
        return Err(address_not_found());
    }

    Ok(Json(json!({ "success": true })))
}
