use crate::application::{SendMessage, UploadFiles};
use crate::config::AppConfig;
use crate::infrastructure::auth::GoogleOAuth;
use crate::infrastructure::openrouter::OpenRouterClient;
use crate::infrastructure::security::{RateLimitPolicy, RateLimiter, UploadQuota};
use crate::infrastructure::store::{
    ChatRepository, DataStore, QuestionnaireRepository, UserRepository,
};
use crate::infrastructure::uploads::FileStorage;
use propeller_errors::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub store: Arc<DataStore>,
    pub users: UserRepository,
    pub chats: ChatRepository,
    pub questionnaires: QuestionnaireRepository,
    pub upload_quota: UploadQuota,
    pub files: FileStorage,
    pub send_message: Arc<SendMessage>,
    pub upload_files: Arc<UploadFiles>,
    pub google_oauth: Option<GoogleOAuth>,
    pub api_limiter: RateLimiter,
    pub chat_limiter: RateLimiter,
    pub upload_limiter: RateLimiter,
}

impl AppContext {
    /// Loads persisted data from `DATA_DIR` and wires every service.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let store = Arc::new(DataStore::load(&config.data_dir).await?);
        let files = FileStorage::init(&config.uploads_dir).await?;
        Self::with_parts(config, store, files)
    }

    /// Wires services around an already-open store and upload directory.
    pub fn with_parts(
        config: AppConfig,
        store: Arc<DataStore>,
        files: FileStorage,
    ) -> Result<Self, AppError> {
        let google_oauth = match &config.google {
            Some(google) => Some(
                GoogleOAuth::new(&google.client_id, &google.client_secret, &google.callback_url)
                    .map_err(AppError::Internal)?,
            ),
            None => None,
        };

        let llm = OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            config.openrouter_base_url.clone(),
            config.app_url.clone(),
        );

        let chats = ChatRepository::new(store.clone());
        let upload_quota = UploadQuota::new(store.clone());

        Ok(Self {
            users: UserRepository::new(store.clone()),
            questionnaires: QuestionnaireRepository::new(store.clone()),
            send_message: Arc::new(SendMessage::new(
                store.clone(),
                chats.clone(),
                files.clone(),
                llm,
            )),
            upload_files: Arc::new(UploadFiles::new(
                store.clone(),
                upload_quota.clone(),
                files.clone(),
            )),
            chats,
            upload_quota,
            files,
            google_oauth,
            api_limiter: RateLimiter::new(RateLimitPolicy::API),
            chat_limiter: RateLimiter::new(RateLimitPolicy::CHAT),
            upload_limiter: RateLimiter::new(RateLimitPolicy::UPLOAD),
            store,
            config: Arc::new(config),
        })
    }
}
