//! Game actions: customization, petting, feeding, shop, decorations.
//!
//! Thin orchestration over the domain `Progression`; the rules live there.

use std::sync::Arc;

use serde::Serialize;

use blockhome_domain::{
    ActionOutcome, AvatarConfig, CrownTier, DecorationId, DomainError, FoodKind,
    PlacedDecoration, Progression, ShopError,
};

use crate::stores::GameStore;

/// Current avatar + progression, as served to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub avatar: AvatarConfig,
    pub progression: Progression,
    pub crown: CrownTier,
}

/// What a pet/feed action changed.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub outcome: ActionOutcome,
    pub progression: Progression,
}

pub struct GameActions {
    store: Arc<GameStore>,
}

impl GameActions {
    pub fn new(store: Arc<GameStore>) -> Self {
        Self { store }
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        let progression = self.store.progression().await;
        GameSnapshot {
            avatar: self.store.avatar().await,
            crown: progression.crown_tier(),
            progression,
        }
    }

    pub async fn customize(&self, config: AvatarConfig) -> GameSnapshot {
        self.store.set_avatar(config).await;
        self.snapshot().await
    }

    pub async fn pet(&self) -> ActionReport {
        let (outcome, progression) = self
            .store
            .with_progression(|p| (p.pet(), p.clone()))
            .await;
        if outcome.leveled_up {
            tracing::info!(level = progression.level, "Level up");
        }
        ActionReport {
            outcome,
            progression,
        }
    }

    pub async fn feed(&self, food: FoodKind) -> ActionReport {
        let (outcome, progression) = self
            .store
            .with_progression(|p| (p.feed(food), p.clone()))
            .await;
        if let Some(mission) = outcome.mission_completed {
            tracing::info!(mission = %mission, "Mission completed");
        }
        ActionReport {
            outcome,
            progression,
        }
    }

    pub async fn buy_decoration(&self, name: &str, price: u32) -> Result<GameSnapshot, ShopError> {
        self.store
            .with_progression(|p| p.buy_decoration(name, price))
            .await?;
        Ok(self.snapshot().await)
    }

    pub async fn place_decoration(
        &self,
        kind: String,
        x: f32,
        y: f32,
    ) -> Result<PlacedDecoration, DomainError> {
        self.store
            .with_progression(|p| p.place_decoration(kind, x, y))
            .await
    }

    pub async fn remove_decoration(&self, id: DecorationId) -> bool {
        self.store
            .with_progression(|p| p.remove_decoration(id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockhome_domain::CharacterColor;

    #[tokio::test]
    async fn test_customize_replaces_avatar() {
        let actions = GameActions::new(Arc::new(GameStore::new()));
        let config = AvatarConfig {
            color: CharacterColor::Purple,
            ..AvatarConfig::default()
        };
        let snapshot = actions.customize(config).await;
        assert_eq!(snapshot.avatar.color, CharacterColor::Purple);
    }

    #[tokio::test]
    async fn test_pet_updates_shared_progression() {
        let store = Arc::new(GameStore::new());
        let actions = GameActions::new(store.clone());
        let report = actions.pet().await;
        assert_eq!(report.progression.missions.pet.count, 1);
        // The store saw the same mutation.
        assert_eq!(store.progression().await.missions.pet.count, 1);
    }

    #[tokio::test]
    async fn test_rejected_purchase_leaves_snapshot_unchanged() {
        let actions = GameActions::new(Arc::new(GameStore::new()));
        let before = actions.snapshot().await;
        let err = actions
            .buy_decoration("pool", 100_000)
            .await
            .expect_err("must reject");
        assert!(matches!(err, ShopError::InsufficientCoins { .. }));
        let after = actions.snapshot().await;
        assert_eq!(after.progression, before.progression);
    }
}
