use crate::extract::JsonBody;
use crate::session::AuthUser;
use axum::extract::{Path, State};
use axum::Json;
use propeller_app::application::SendMessageRequest;
use propeller_app::AppContext;
use propeller_errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    #[serde(default)]
    title: Option<String>,
}

fn chat_not_found() -> AppError {
    AppError::NotFound("Chat not found".to_string())
}

pub async fn list(State(ctx): State<AppContext>, AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "chats": ctx.chats.list_for_user(&user.id) }))
}

pub async fn create(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    body: Option<JsonBody<CreateChatRequest>>,
) -> Json<Value> {
    let request = body.map(|JsonBody(request)| request).unwrap_or_default();
    let chat = ctx.chats.create(&user.id, request.title);
    tracing::debug!("Created chat {} for user {}", chat.id, user.id);
    ctx.store.persist().await;
    Json(json!({ "success": true, "chat": chat }))
}

pub async fn show(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let chat = ctx
        .chats
        .find_owned(&chat_id, &user.id)
        .ok_or_else(chat_not_found)?;
    Ok(Json(json!({ "chat": chat })))
}

pub async fn rename(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
    JsonBody(request): JsonBody<RenameChatRequest>,
) -> Result<Json<Value>, AppError> {
    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;

    let chat = ctx
        .chats
        .rename(&chat_id, &user.id, title)
        .ok_or_else(chat_not_found)?;
    ctx.store.persist().await;
    Ok(Json(json!({ "success": true, "chat": chat })))
}

pub async fn delete(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !ctx.chats.delete(&chat_id, &user.id) {
        return Err(chat_not_found());
    }
    ctx.store.persist().await;
    Ok(Json(json!({ "success": true, "message": "Chat deleted" })))
}

pub async fn send_message(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(chat_id): Path<String>,
    JsonBody(request): JsonBody<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = ctx
        .send_message
        .execute(&user.id, &chat_id, request)
        .await
        .inspect_err(|e| tracing::error!("Error generating AI response: {}", e))?;

    Ok(Json(json!({
        "success": true,
        "messages": [outcome.user_message, outcome.assistant_message],
        "chat": outcome.chat,
    })))
}
