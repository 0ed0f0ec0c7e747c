//! Authentication extractors and ownership checks.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use akaar_core::UserId;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Rejects with `401 {"error": "Unauthorized"}` when there is no session user.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> Result<Json<Value>> {
///     // user.id is the session user's id
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Session is set in extensions by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthorized)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject anonymous requests.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// Check whether `viewer` may read a record owned by `owner`.
///
/// Records without an owner (guest checkouts and quotes) are readable by
/// anyone holding their id. Owned records require the same session user.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the record is owned and the viewer is
/// anonymous or a different user.
pub fn ensure_can_view(owner: Option<UserId>, viewer: Option<&CurrentUser>) -> Result<(), AppError> {
    match owner {
        None => Ok(()),
        Some(owner) if viewer.is_some_and(|v| v.id == owner) => Ok(()),
        Some(_) => Err(unauthorized()),
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop the whole session.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use akaar_core::Email;

    use super::*;

    fn user(id: UserId) -> CurrentUser {
        CurrentUser {
            id,
            email: Email::parse("owner@example.com").unwrap(),
            name: None,
        }
    }

    #[test]
    fn test_guest_records_are_public() {
        assert!(ensure_can_view(None, None).is_ok());
        assert!(ensure_can_view(None, Some(&user(UserId::generate()))).is_ok());
    }

    #[test]
    fn test_owned_records_need_owner() {
        let owner = UserId::generate();
        assert!(ensure_can_view(Some(owner), Some(&user(owner))).is_ok());
        assert!(matches!(
            ensure_can_view(Some(owner), None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            ensure_can_view(Some(owner), Some(&user(UserId::generate()))),
            Err(AppError::Unauthorized(_))
        ));
    }
}
