mod chat_repository;
mod data_store;
mod questionnaire_repository;
mod user_repository;

pub use chat_repository::ChatRepository;
pub use data_store::DataStore;
pub use questionnaire_repository::QuestionnaireRepository;
pub use user_repository::UserRepository;
