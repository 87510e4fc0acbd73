mod auth;
mod avatar;
mod chats;
mod system;
mod uploads;

use crate::middleware::{api_rate_limit, chat_rate_limit, upload_rate_limit};
use crate::pages;
use axum::extract::DefaultBodyLimit;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use propeller_app::infrastructure::uploads::UPLOADS_URL_PREFIX;
use propeller_app::{AppConfig, AppContext};
use std::convert::Infallible;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

const JSON_BODY_LIMIT: usize = 50 * 1024 * 1024;
// five 10 MiB files plus multipart framing
const UPLOAD_BODY_LIMIT: usize = 51 * 1024 * 1024;
const SESSION_IDLE_HOURS: i64 = 24;

/// Every route and static mount, without the cross-cutting layers.
pub fn routes(ctx: &AppContext) -> Router {
    let api = Router::new()
        .route("/health", get(system::health))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/user", get(auth::current_user))
        .route("/chats", get(chats::list).post(chats::create))
        .route(
            "/chats/{chat_id}",
            get(chats::show).patch(chats::rename).delete(chats::delete),
        )
        .route(
            "/chats/{chat_id}/messages",
            post(chats::send_message).layer(from_fn_with_state(ctx.clone(), chat_rate_limit)),
        )
        .route(
            "/upload",
            post(uploads::upload)
                .layer::<_, Infallible>(from_fn_with_state(ctx.clone(), upload_rate_limit))
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/usage", get(uploads::usage))
        .route("/avatar/{avatar_type}/status", get(avatar::status))
        .route(
            "/avatar/{avatar_type}/questionnaire",
            post(avatar::save_for_avatar),
        )
        .route("/avatar-questionnaire/{avatar_type}", get(avatar::status))
        .route("/avatar-questionnaire", post(avatar::save))
        .fallback(system::api_not_found)
        .layer(from_fn_with_state(ctx.clone(), api_rate_limit));

    let public_dir = ctx.config.public_dir.clone();
    let not_found = move || {
        let public_dir = public_dir.clone();
        async move { pages::not_found_page(&public_dir).await }
    };

    Router::new()
        .nest("/api", api)
        .merge(pages::routes())
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(&ctx.config.uploads_dir))
        .fallback_service(
            ServeDir::new(&ctx.config.public_dir).not_found_service(not_found.into_service()),
        )
        .with_state(ctx.clone())
}

pub fn with_layers(router: Router, config: &AppConfig) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.environment.is_production())
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(SESSION_IDLE_HOURS)));

    router
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(sessions)
        .layer(cors_layer(config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Development mirrors any origin; production only answers the configured
/// list, and an empty list means no cross-origin access at all.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = if config.environment.is_production() {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::AUTHORIZATION]))
}
