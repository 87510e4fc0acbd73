use super::DataStore;
use crate::domain::User;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<DataStore>,
}

impl UserRepository {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub fn find_by_id(&self, id: &str) -> Option<User> {
        self.store.users.get(id).map(|user| user.value().clone())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.store
            .users
            .iter()
            .find(|entry| entry.value().email.eq_ignore_ascii_case(email))
            .map(|entry| entry.value().clone())
    }

    /// Returns the account already registered under the candidate's email,
    /// or stores the candidate as a new user. Existing users are never updated.
    pub fn find_or_create(&self, candidate: User) -> User {
        if let Some(existing) = self.find_by_email(&candidate.email) {
            tracing::debug!("User logged in: {} {}", existing.id, existing.email);
            return existing;
        }

        let user = self
            .store
            .users
            .entry(candidate.id.clone())
            .or_insert(candidate)
            .value()
            .clone();
        tracing::info!("Created new user: {} {}", user.id, user.email);
        user
    }
}
