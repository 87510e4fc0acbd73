use super::DataStore;
use crate::domain::{Chat, ChatMessage, DEFAULT_CHAT_TITLE};
use std::sync::Arc;

#[derive(Clone)]
pub struct ChatRepository {
    store: Arc<DataStore>,
}

impl ChatRepository {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// The user's chats, most recently updated first.
    pub fn list_for_user(&self, user_id: &str) -> Vec<Chat> {
        let chat_ids: Vec<String> = self
            .store
            .user_chats
            .get(user_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();

        let mut chats: Vec<Chat> = chat_ids
            .iter()
            .filter_map(|id| self.store.chats.get(id).map(|chat| chat.value().clone()))
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        chats
    }

    /// `None` when the chat does not exist or belongs to someone else.
    pub fn find_owned(&self, chat_id: &str, user_id: &str) -> Option<Chat> {
        self.store
            .chats
            .get(chat_id)
            .filter(|chat| chat.is_owned_by(user_id))
            .map(|chat| chat.value().clone())
    }

    pub fn owner_of(&self, chat_id: &str) -> Option<String> {
        self.store.chats.get(chat_id).map(|chat| chat.user_id.clone())
    }

    pub fn create(&self, user_id: &str, title: Option<String>) -> Chat {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());
        let chat = Chat::new(
            uuid::Uuid::new_v4().to_string(),
            user_id.to_string(),
            title,
            None,
        );
        self.insert(chat.clone());
        chat
    }

    /// Appends to an existing chat owned by `user_id`, or creates the chat under
    /// the client-chosen id. Returns the updated chat and whether it was created.
    /// `None` if the id is taken by another user's chat.
    pub fn append_or_create(
        &self,
        chat_id: &str,
        user_id: &str,
        personality: Option<String>,
        messages: Vec<ChatMessage>,
    ) -> Option<(Chat, bool)> {
        let mut created = false;
        let chat = {
            let mut entry = self.store.chats.entry(chat_id.to_string()).or_insert_with(|| {
                created = true;
                Chat::new(
                    chat_id.to_string(),
                    user_id.to_string(),
                    DEFAULT_CHAT_TITLE.to_string(),
                    personality,
                )
            });
            if !entry.is_owned_by(user_id) {
                return None;
            }
            entry.append(messages);
            entry.value().clone()
        };

        if created {
            self.index(user_id, chat_id);
        }
        Some((chat, created))
    }

    pub fn rename(&self, chat_id: &str, user_id: &str, title: String) -> Option<Chat> {
        let mut chat = self.store.chats.get_mut(chat_id)?;
        if !chat.is_owned_by(user_id) {
            return None;
        }
        chat.rename(title);
        Some(chat.value().clone())
    }

    /// Sets a generated title without touching `updatedAt`.
    pub fn set_title(&self, chat_id: &str, title: String) -> Option<Chat> {
        let mut chat = self.store.chats.get_mut(chat_id)?;
        chat.title = title;
        Some(chat.value().clone())
    }

    pub fn delete(&self, chat_id: &str, user_id: &str) -> bool {
        let removed = self
            .store
            .chats
            .remove_if(chat_id, |_, chat| chat.is_owned_by(user_id))
            .is_some();

        if removed {
            if let Some(mut ids) = self.store.user_chats.get_mut(user_id) {
                ids.remove(chat_id);
            }
        }
        removed
    }

    fn insert(&self, chat: Chat) {
        self.index(&chat.user_id, &chat.id);
        self.store.chats.insert(chat.id.clone(), chat);
    }

    fn index(&self, user_id: &str, chat_id: &str) {
        self.store
            .user_chats
            .entry(user_id.to_string())
            .or_default()
            .insert(chat_id.to_string());
    }
}
