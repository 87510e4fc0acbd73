use crate::extract::JsonBody;
use crate::session::AuthUser;
use axum::extract::{Path, State};
use axum::Json;
use propeller_app::domain::QuestionnaireStatus;
use propeller_app::AppContext;
use propeller_errors::AppError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    #[serde(default)]
    answers: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRequest {
    #[serde(default)]
    avatar_type: Option<String>,
    #[serde(default)]
    answers: Option<Value>,
}

pub async fn status(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(avatar_type): Path<String>,
) -> Json<QuestionnaireStatus> {
    Json(QuestionnaireStatus::from_answers(
        ctx.questionnaires.get(&user.id, &avatar_type),
    ))
}

pub async fn save_for_avatar(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    Path(avatar_type): Path<String>,
    JsonBody(request): JsonBody<AnswersRequest>,
) -> Result<Json<Value>, AppError> {
    let answers = request
        .answers
        .filter(|a| !a.is_null())
        .ok_or_else(|| AppError::BadRequest("Answers are required".to_string()))?;

    ctx.questionnaires.save(&user.id, &avatar_type, answers);
    ctx.store.persist().await;
    Ok(Json(json!({ "success": true })))
}

pub async fn save(
    State(ctx): State<AppContext>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<QuestionnaireRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(avatar_type), Some(answers)) = (
        request.avatar_type.filter(|t| !t.trim().is_empty()),
        request.answers.filter(|a| !a.is_null()),
    ) else {
        return Err(AppError::BadRequest(
            "Avatar type and answers are required".to_string(),
        ));
    };

    ctx.questionnaires.save(&user.id, &avatar_type, answers);
    ctx.store.persist().await;
    Ok(Json(json!({ "success": true, "message": "Questionnaire saved successfully" })))
}
