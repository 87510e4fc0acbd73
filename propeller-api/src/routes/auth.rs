use crate::session::{AuthUser, CSRF_STATE_KEY, PKCE_VERIFIER_KEY, USER_ID_KEY};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use propeller_app::AppContext;
use propeller_errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_sessions::Session;

const LOGIN_FAILED_REDIRECT: &str = "/auth";
const LOGIN_SUCCESS_REDIRECT: &str = "/chat";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub async fn google_login(
    State(ctx): State<AppContext>,
    session: Session,
) -> Result<Redirect, AppError> {
    let oauth = ctx.google_oauth.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Google sign-in is not configured".to_string())
    })?;

    let request = oauth.get_auth_url();
    session
        .insert(CSRF_STATE_KEY, &request.csrf_state)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    session
        .insert(PKCE_VERIFIER_KEY, &request.pkce_verifier)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Redirect::to(&request.url))
}

/// Every failure lands back on the sign-in page.
pub async fn google_callback(
    State(ctx): State<AppContext>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match complete_login(&ctx, &session, params).await {
        Ok(user_id) => {
            tracing::info!("User {} signed in", user_id);
            Redirect::to(LOGIN_SUCCESS_REDIRECT)
        }
        Err(e) => {
            tracing::warn!("Google sign-in failed: {}", e);
            Redirect::to(LOGIN_FAILED_REDIRECT)
        }
    }
}

async fn complete_login(
    ctx: &AppContext,
    session: &Session,
    params: CallbackParams,
) -> Result<String, String> {
    let oauth = ctx
        .google_oauth
        .as_ref()
        .ok_or("Google sign-in is not configured")?;

    let expected_state: Option<String> = session
        .remove(CSRF_STATE_KEY)
        .await
        .map_err(|e| e.to_string())?;
    let pkce_verifier: Option<String> = session
        .remove(PKCE_VERIFIER_KEY)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(error) = params.error {
        return Err(format!("Google returned an error: {}", error));
    }
    let code = params.code.ok_or("Missing authorization code")?;
    match (params.state, expected_state) {
        (Some(got), Some(expected)) if got == expected => {}
        _ => return Err("OAuth state mismatch".to_string()),
    }
    let pkce_verifier = pkce_verifier.ok_or("Missing PKCE verifier")?;

    let info = oauth.exchange_code(&code, &pkce_verifier).await?;
    let user = ctx.users.find_or_create(info.into_user());

    // new session id on privilege change
    session.cycle_id().await.map_err(|e| e.to_string())?;
    session
        .insert(USER_ID_KEY, &user.id)
        .await
        .map_err(|e| e.to_string())?;

    ctx.store.persist().await;
    Ok(user.id)
}

pub async fn logout(session: Session) -> Response {
    match session.flush().await {
        Ok(()) => Json(json!({ "success": true, "message": "Logged out successfully" })).into_response(),
        Err(e) => {
            tracing::error!("Logout failed: {}", e);
            AppError::Internal("Logout failed".to_string()).into_response()
        }
    }
}

pub async fn current_user(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "user": user }))
}
