use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use propeller_app::domain::User;
use propeller_app::AppContext;
use propeller_errors::AppError;
use tower_sessions::Session;

pub const USER_ID_KEY: &str = "user_id";
pub const CSRF_STATE_KEY: &str = "oauth_csrf_state";
pub const PKCE_VERIFIER_KEY: &str = "oauth_pkce_verifier";

/// The logged-in user. Rejects with 401 when the session has no known user.
pub struct AuthUser(pub User);

impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx)
            .await
            .map_err(|_| AppError::Unauthorized)?;

        current_user(&session, ctx)
            .await
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

pub async fn current_user(session: &Session, ctx: &AppContext) -> Option<User> {
    let user_id: Option<String> = session.get(USER_ID_KEY).await.ok().flatten();
    user_id.and_then(|id| ctx.users.find_by_id(&id))
}
