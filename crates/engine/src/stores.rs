//! Shared application state.
//!
//! One explicit store object owns the session's mutable state (avatar,
//! progression, captured preview). Its lifecycle is tied to the `App` that
//! created it - there are no ambient statics. All mutation happens from
//! request handlers on the single runtime, so last-write-wins is the only
//! discipline the slots need.

use tokio::sync::RwLock;

use blockhome_domain::{AvatarConfig, Progression};

use crate::infrastructure::ports::Bitmap;

pub struct GameStore {
    avatar: RwLock<AvatarConfig>,
    progression: RwLock<Progression>,
    /// Most recent captured preview; mint reuses it when present.
    preview: RwLock<Option<Bitmap>>,
}

impl GameStore {
    pub fn new() -> Self {
        Self {
            avatar: RwLock::new(AvatarConfig::default()),
            progression: RwLock::new(Progression::new()),
            preview: RwLock::new(None),
        }
    }

    pub async fn avatar(&self) -> AvatarConfig {
        *self.avatar.read().await
    }

    pub async fn set_avatar(&self, config: AvatarConfig) {
        *self.avatar.write().await = config;
    }

    pub async fn progression(&self) -> Progression {
        self.progression.read().await.clone()
    }

    /// Run a mutation against the progression state under the write lock.
    pub async fn with_progression<R>(&self, f: impl FnOnce(&mut Progression) -> R) -> R {
        let mut progression = self.progression.write().await;
        f(&mut progression)
    }

    pub async fn preview(&self) -> Option<Bitmap> {
        self.preview.read().await.clone()
    }

    pub async fn set_preview(&self, bitmap: Bitmap) {
        *self.preview.write().await = Some(bitmap);
    }

    pub async fn clear_preview(&self) {
        *self.preview.write().await = None;
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}
