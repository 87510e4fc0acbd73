mod chat;
mod questionnaire;
mod upload_usage;
mod user;

pub use chat::{Attachment, Chat, ChatMessage, Role, DEFAULT_CHAT_TITLE};
pub use questionnaire::QuestionnaireStatus;
pub use upload_usage::UploadUsage;
pub use user::User;
