use crate::domain::{Chat, UploadUsage, User};
use dashmap::DashMap;
use propeller_errors::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const USERS_FILE: &str = "users.json";
const CHATS_FILE: &str = "chats.json";
const USER_CHATS_FILE: &str = "user_chats.json";
const USAGE_FILE: &str = "usage.json";
const QUESTIONNAIRES_FILE: &str = "questionnaires.json";

/// In-memory maps mirrored to one JSON file each.
///
/// Every save rewrites all five files; the last completed save wins.
pub struct DataStore {
    dir: PathBuf,
    pub(crate) users: DashMap<String, User>,
    pub(crate) chats: DashMap<String, Chat>,
    pub(crate) user_chats: DashMap<String, BTreeSet<String>>,
    pub(crate) usage: DashMap<String, UploadUsage>,
    pub(crate) questionnaires: DashMap<String, BTreeMap<String, Value>>,
    save_lock: Mutex<()>,
}

impl DataStore {
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            users: DashMap::new(),
            chats: DashMap::new(),
            user_chats: DashMap::new(),
            usage: DashMap::new(),
            questionnaires: DashMap::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Creates the data directory if needed and loads whatever files exist.
    /// A file that fails to parse is logged and skipped.
    pub async fn load(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let store = Self::empty(dir);
        tokio::fs::create_dir_all(&store.dir).await?;

        load_map(&store.dir.join(USERS_FILE), &store.users).await;
        load_map(&store.dir.join(CHATS_FILE), &store.chats).await;
        load_map(&store.dir.join(USER_CHATS_FILE), &store.user_chats).await;
        load_map(&store.dir.join(USAGE_FILE), &store.usage).await;
        load_map(&store.dir.join(QUESTIONNAIRES_FILE), &store.questionnaires).await;

        tracing::info!(
            "Loaded {} users, {} chats, chat index for {} users, usage for {} users, questionnaires for {} users",
            store.users.len(),
            store.chats.len(),
            store.user_chats.len(),
            store.usage.len(),
            store.questionnaires.len()
        );

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rewrites all five files. Concurrent calls are serialised.
    pub async fn save(&self) -> Result<(), AppError> {
        let _guard = self.save_lock.lock().await;

        write_json(&self.dir.join(USERS_FILE), &snapshot(&self.users)).await?;
        write_json(&self.dir.join(CHATS_FILE), &snapshot(&self.chats)).await?;
        write_json(&self.dir.join(USER_CHATS_FILE), &snapshot(&self.user_chats)).await?;
        write_json(&self.dir.join(USAGE_FILE), &snapshot(&self.usage)).await?;
        write_json(
            &self.dir.join(QUESTIONNAIRES_FILE),
            &snapshot(&self.questionnaires),
        )
        .await?;

        tracing::debug!("Data saved to disk");
        Ok(())
    }

    /// Saves after a mutation. Failures are logged; the in-memory state stays authoritative.
    pub async fn persist(&self) {
        if let Err(e) = self.save().await {
            tracing::error!("Error saving data to disk: {}", e);
        }
    }

    pub fn spawn_autosave(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                self.persist().await;
            }
        })
    }
}

fn snapshot<V: Clone>(map: &DashMap<String, V>) -> BTreeMap<String, V> {
    map.iter()
        .map(|entry| (entry.key().clone(), entry.value().clone()))
        .collect()
}

async fn load_map<V: DeserializeOwned>(path: &Path, target: &DashMap<String, V>) {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            tracing::error!("Error reading {}: {}", path.display(), e);
            return;
        }
    };

    match serde_json::from_slice::<HashMap<String, V>>(&bytes) {
        Ok(entries) => {
            for (key, value) in entries {
                target.insert(key, value);
            }
        }
        Err(e) => tracing::error!("Error parsing {}: {}", path.display(), e),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| AppError::Storage(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
