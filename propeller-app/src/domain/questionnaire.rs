use serde::Serialize;
use serde_json::Value;

/// Whether a user has answered the questionnaire for one avatar type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireStatus {
    pub has_questionnaire: bool,
    pub answers: Option<Value>,
}

impl QuestionnaireStatus {
    pub fn from_answers(answers: Option<Value>) -> Self {
        Self {
            has_questionnaire: answers.is_some(),
            answers,
        }
    }
}
