use super::DataStore;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct QuestionnaireRepository {
    store: Arc<DataStore>,
}

impl QuestionnaireRepository {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, user_id: &str, avatar_type: &str) -> Option<Value> {
        self.store
            .questionnaires
            .get(user_id)
            .and_then(|answers| answers.get(avatar_type).cloned())
    }

    /// Stores the answers, replacing any previous ones for this avatar.
    pub fn save(&self, user_id: &str, avatar_type: &str, answers: Value) {
        self.store
            .questionnaires
            .entry(user_id.to_string())
            .or_default()
            .insert(avatar_type.to_string(), answers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answers_are_per_user_and_avatar() {
        let repo = QuestionnaireRepository::new(Arc::new(DataStore::empty(std::env::temp_dir())));
        repo.save("u1", "coach", json!({ "tone": "strict" }));
        repo.save("u1", "coach", json!({ "tone": "gentle" }));
        repo.save("u2", "mentor", json!({ "field": "math" }));

        assert_eq!(repo.get("u1", "coach"), Some(json!({ "tone": "gentle" })));
        assert!(repo.get("u1", "mentor").is_none());
        assert!(repo.get("u3", "coach").is_none());
    }
}
