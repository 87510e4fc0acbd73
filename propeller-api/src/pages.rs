use crate::session::current_user;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use propeller_app::AppContext;
use std::path::Path;
use tower_sessions::Session;

const INDEX_PAGE: &str = "index";
const NOT_FOUND_PAGE: &str = "404.html";

/// Clean URLs that map onto `<PUBLIC_DIR>/<name>.html`.
const NAMED_PAGES: &[(&str, &str)] = &[
    ("/", INDEX_PAGE),
    ("/app", "app"),
    ("/chat", "chat"),
    ("/settings", "settings"),
    ("/terms", "terms"),
    ("/privacy", "privacy"),
    ("/avatars", "avatars"),
    ("/questionnaire", "questionnaire"),
    ("/avatar-setup", "avatar-setup"),
    ("/avatar-chat", "avatar-chat"),
    ("/avatar-questionnaire", "avatar-questionnaire"),
];

pub fn routes() -> Router<AppContext> {
    NAMED_PAGES
        .iter()
        .fold(Router::new(), |router, &(path, name)| router.route(path, page(name)))
        .route("/auth", get(auth_page))
}

fn page(name: &'static str) -> MethodRouter<AppContext> {
    get(move |State(ctx): State<AppContext>| async move {
        serve_page(&ctx.config.public_dir, name).await
    })
}

/// Logged-in users skip the sign-in page.
async fn auth_page(State(ctx): State<AppContext>, session: Session) -> Response {
    if current_user(&session, &ctx).await.is_some() {
        return Redirect::to("/chat").into_response();
    }
    serve_page(&ctx.config.public_dir, "auth").await
}

pub async fn serve_page(public_dir: &Path, name: &str) -> Response {
    let path = public_dir.join(format!("{}.html", name));
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && name == INDEX_PAGE => {
            Html(render_coming_soon_page()).into_response()
        }
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!("Failed to read {}: {}", path.display(), e);
            }
            not_found_page(public_dir).await
        }
    }
}

pub async fn not_found_page(public_dir: &Path) -> Response {
    let body = tokio::fs::read_to_string(public_dir.join(NOT_FOUND_PAGE))
        .await
        .unwrap_or_else(|_| render_not_found_page());
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

fn render_coming_soon_page() -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Propeller AI - Coming Soon</title>
    <link rel="icon" href="data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'><text y='.9em' font-size='90'>🚀</text></svg>">
    <style>{CSS}</style>
</head>
<body>
    <main class="container">
        <div class="hero">
            <h1 class="hero__title">Propeller AI</h1>
            <p class="hero__subtitle">Your intelligent assistant is almost ready for takeoff. We are putting the finishing touches on something new.</p>
            <a href="/auth" class="hero__button">Sign in for early access</a>
        </div>
    </main>
</body>
</html>"#, CSS = CSS)
}

fn render_not_found_page() -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Page not found - Propeller AI</title>
    <style>{CSS}</style>
</head>
<body>
    <main class="container">
        <div class="error">
            <p class="error__title">404</p>
            <p class="error__message">The page you are looking for does not exist.</p>
            <a href="/" class="hero__button">Back to home</a>
        </div>
    </main>
</body>
</html>"#, CSS = CSS)
}

const CSS: &str = r#"
:root {
    --base: #0b1020;
    --surface: #141a2e;
    --text: #e6e9f5;
    --subtle: #9aa3c7;
    --accent: #6c8cff;
    --accent-2: #a66cff;
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: 'Inter', -apple-system, sans-serif;
    background: radial-gradient(circle at top, var(--surface), var(--base));
    color: var(--text);
    min-height: 100vh;
}
.container { max-width: 720px; margin: 0 auto; padding: 6rem 1.5rem; text-align: center; }
.hero__title {
    font-size: clamp(2.5rem, 7vw, 4rem); font-weight: 800; margin-bottom: 1rem;
    background: linear-gradient(90deg, var(--accent), var(--accent-2));
    -webkit-background-clip: text; background-clip: text; color: transparent;
}
.hero__subtitle { color: var(--subtle); font-size: 1.15rem; line-height: 1.7; margin-bottom: 2.5rem; }
.hero__button {
    display: inline-block; padding: 0.85rem 1.75rem; border-radius: 999px;
    background: var(--accent); color: var(--base); font-weight: 600; text-decoration: none;
}
.error__title { font-size: 4rem; font-weight: 800; color: var(--accent); margin-bottom: 0.5rem; }
.error__message { color: var(--subtle); margin-bottom: 2rem; }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_index_renders_coming_soon() {
        let dir = std::env::temp_dir().join(format!("propeller-pages-{}", uuid::Uuid::new_v4()));
        let response = serve_page(&dir, INDEX_PAGE).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = serve_page(&dir, "settings").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_page_from_public_dir() {
        let dir = std::env::temp_dir().join(format!("propeller-pages-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("terms.html"), "<h1>Terms</h1>").await.unwrap();

        let response = serve_page(&dir, "terms").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_builtin_pages() {
        assert!(render_coming_soon_page().contains("Coming Soon"));
        assert!(render_not_found_page().contains("404"));
    }
}
