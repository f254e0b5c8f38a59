//! Game progression: level, experience, currency, missions, decorations.
//!
//! All mutation is synchronous and single-writer (the engine wraps one
//! `Progression` in a store guarded by a lock). Invariants:
//! - experience never accumulates past the level threshold without the level
//!   increment happening in the same update,
//! - coins never go negative (purchases are rejected, not clamped),
//! - mission rewards pay exactly once per mission.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Experience needed per level: `level * EXPERIENCE_PER_LEVEL`.
pub const EXPERIENCE_PER_LEVEL: u32 = 100;
/// Coins granted on every level-up.
pub const LEVEL_UP_COIN_BONUS: u32 = 50;
/// Fresh sessions start at level 1 with 100 coins.
pub const STARTING_LEVEL: u32 = 1;
pub const STARTING_COINS: u32 = 100;

/// Per-action experience trickle.
const PET_EXPERIENCE: u32 = 5;
const FEED_EXPERIENCE: u32 = 10;

/// Mission caps and the one-time completion reward.
pub const PET_MISSION_GOAL: u32 = 10;
pub const FEED_MISSION_GOAL: u32 = 5;
pub const MISSION_EXPERIENCE_REWARD: u32 = 30;
pub const MISSION_COIN_REWARD: u32 = 40;

/// Identifier of a placed decoration instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecorationId(Uuid);

impl DecorationId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for DecorationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The foods the pet can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Berry,
    Cookie,
    Star,
}

impl FoodKind {
    pub fn all() -> &'static [FoodKind] {
        &[FoodKind::Berry, FoodKind::Cookie, FoodKind::Star]
    }
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FoodKind::Berry => "berry",
            FoodKind::Cookie => "cookie",
            FoodKind::Star => "star",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FoodKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "berry" => Ok(FoodKind::Berry),
            "cookie" => Ok(FoodKind::Cookie),
            "star" => Ok(FoodKind::Star),
            _ => Err(DomainError::parse(format!("Unknown food: '{s}'"))),
        }
    }
}

/// The repeat-action missions the pet tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "food")]
pub enum MissionKind {
    Pet,
    Feed(FoodKind),
}

impl MissionKind {
    /// Action count at which the mission completes.
    pub fn goal(&self) -> u32 {
        match self {
            MissionKind::Pet => PET_MISSION_GOAL,
            MissionKind::Feed(_) => FEED_MISSION_GOAL,
        }
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissionKind::Pet => write!(f, "pet"),
            MissionKind::Feed(food) => write!(f, "feed_{food}"),
        }
    }
}

/// Counter state for one mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionState {
    pub count: u32,
    pub completed: bool,
}

impl MissionState {
    /// Count one action toward the goal. Returns true exactly once, on the
    /// action that reaches the cap.
    fn record(&mut self, goal: u32) -> bool {
        if self.completed {
            return false;
        }
        self.count = (self.count + 1).min(goal);
        if self.count >= goal {
            self.completed = true;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Missions {
    pub pet: MissionState,
    pub feed_berry: MissionState,
    pub feed_cookie: MissionState,
    pub feed_star: MissionState,
}

impl Missions {
    fn state_mut(&mut self, kind: MissionKind) -> &mut MissionState {
        match kind {
            MissionKind::Pet => &mut self.pet,
            MissionKind::Feed(FoodKind::Berry) => &mut self.feed_berry,
            MissionKind::Feed(FoodKind::Cookie) => &mut self.feed_cookie,
            MissionKind::Feed(FoodKind::Star) => &mut self.feed_star,
        }
    }

    pub fn state(&self, kind: MissionKind) -> MissionState {
        match kind {
            MissionKind::Pet => self.pet,
            MissionKind::Feed(FoodKind::Berry) => self.feed_berry,
            MissionKind::Feed(FoodKind::Cookie) => self.feed_cookie,
            MissionKind::Feed(FoodKind::Star) => self.feed_star,
        }
    }
}

/// Crown shown on the character, earned by leveling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrownTier {
    None,
    Bronze,
    Silver,
    Golden,
}

impl CrownTier {
    pub fn for_level(level: u32) -> Self {
        match level {
            0 => CrownTier::None,
            1 => CrownTier::Bronze,
            2 => CrownTier::Silver,
            _ => CrownTier::Golden,
        }
    }
}

/// Purchase rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopError {
    #[error("Decoration already owned: {0}")]
    AlreadyOwned(String),
    #[error("Insufficient coins: have {coins}, need {price}")]
    InsufficientCoins { coins: u32, price: u32 },
}

/// What a pet/feed action earned the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub experience_gained: u32,
    pub coins_gained: u32,
    pub leveled_up: bool,
    pub mission_completed: Option<MissionKind>,
}

/// A decoration instance placed in the scene. Coordinates are normalized
/// percentages in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDecoration {
    pub id: DecorationId,
    pub kind: String,
    pub x: f32,
    pub y: f32,
}

/// In-memory progression model for one play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub experience: u32,
    pub coins: u32,
    pub owned_decorations: BTreeSet<String>,
    pub placed: Vec<PlacedDecoration>,
    pub missions: Missions,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: STARTING_LEVEL,
            experience: 0,
            coins: STARTING_COINS,
            owned_decorations: BTreeSet::new(),
            placed: Vec::new(),
            missions: Missions::default(),
        }
    }
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    /// Experience required to reach the next level.
    pub fn experience_threshold(&self) -> u32 {
        self.level * EXPERIENCE_PER_LEVEL
    }

    pub fn crown_tier(&self) -> CrownTier {
        CrownTier::for_level(self.level)
    }

    /// Add experience. If the sum reaches the threshold the level increments
    /// by exactly one, the remainder carries over, and the level-up coin
    /// bonus is granted. Returns whether a level-up happened.
    pub fn gain_experience(&mut self, amount: u32) -> bool {
        let total = self.experience + amount;
        let threshold = self.experience_threshold();
        if total >= threshold {
            self.level += 1;
            self.experience = total - threshold;
            self.coins += LEVEL_UP_COIN_BONUS;
            true
        } else {
            self.experience = total;
            false
        }
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins += amount;
    }

    /// Pet the character.
    pub fn pet(&mut self) -> ActionOutcome {
        self.apply_action(PET_EXPERIENCE, MissionKind::Pet)
    }

    /// Feed the character.
    pub fn feed(&mut self, food: FoodKind) -> ActionOutcome {
        self.apply_action(FEED_EXPERIENCE, MissionKind::Feed(food))
    }

    fn apply_action(&mut self, base_experience: u32, mission: MissionKind) -> ActionOutcome {
        let goal = mission.goal();
        let just_completed = self.missions.state_mut(mission).record(goal);

        let mut experience = base_experience;
        let mut coins = 0;
        if just_completed {
            experience += MISSION_EXPERIENCE_REWARD;
            coins += MISSION_COIN_REWARD;
        }

        let coins_before = self.coins;
        self.add_coins(coins);
        let leveled_up = self.gain_experience(experience);

        ActionOutcome {
            experience_gained: experience,
            // Includes the level-up bonus when one fired.
            coins_gained: self.coins - coins_before,
            leveled_up,
            mission_completed: just_completed.then_some(mission),
        }
    }

    pub fn owns(&self, name: &str) -> bool {
        self.owned_decorations.contains(name)
    }

    /// Buy a decoration. Rejected without mutation when already owned or
    /// unaffordable.
    pub fn buy_decoration(&mut self, name: &str, price: u32) -> Result<(), ShopError> {
        if self.owns(name) {
            return Err(ShopError::AlreadyOwned(name.to_string()));
        }
        if self.coins < price {
            return Err(ShopError::InsufficientCoins {
                coins: self.coins,
                price,
            });
        }
        self.coins -= price;
        self.owned_decorations.insert(name.to_string());
        Ok(())
    }

    /// Place a decoration instance. No collision checking; only the
    /// coordinate range is validated.
    pub fn place_decoration(
        &mut self,
        kind: impl Into<String>,
        x: f32,
        y: f32,
    ) -> Result<PlacedDecoration, DomainError> {
        if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
            return Err(DomainError::validation(format!(
                "Decoration position must be within [0, 100]: ({x}, {y})"
            )));
        }
        let placed = PlacedDecoration {
            id: DecorationId::new(),
            kind: kind.into(),
            x,
            y,
        };
        self.placed.push(placed.clone());
        Ok(placed)
    }

    /// Remove a placed instance by id. Any instance can be removed; returns
    /// false if the id is unknown.
    pub fn remove_decoration(&mut self, id: DecorationId) -> bool {
        let before = self.placed.len();
        self.placed.retain(|d| d.id != id);
        self.placed.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_experience_below_threshold() {
        let mut p = Progression::new();
        let leveled = p.gain_experience(40);
        assert!(!leveled);
        assert_eq!(p.level, 1);
        assert_eq!(p.experience, 40);
        assert_eq!(p.coins, STARTING_COINS);
    }

    #[test]
    fn test_gain_experience_rollover() {
        let mut p = Progression::new();
        p.experience = 80;
        // 80 + 30 >= 100: level up, remainder 10, bonus coins
        let leveled = p.gain_experience(30);
        assert!(leveled);
        assert_eq!(p.level, 2);
        assert_eq!(p.experience, 10);
        assert_eq!(p.coins, STARTING_COINS + LEVEL_UP_COIN_BONUS);
    }

    #[test]
    fn test_gain_experience_exact_threshold() {
        let mut p = Progression::new();
        let leveled = p.gain_experience(100);
        assert!(leveled);
        assert_eq!(p.level, 2);
        assert_eq!(p.experience, 0);
    }

    #[test]
    fn test_threshold_scales_with_level() {
        let mut p = Progression::new();
        p.level = 3;
        assert_eq!(p.experience_threshold(), 300);
        assert!(!p.gain_experience(299));
        assert_eq!(p.experience, 299);
    }

    #[test]
    fn test_pet_grants_trickle_experience() {
        let mut p = Progression::new();
        let outcome = p.pet();
        assert_eq!(outcome.experience_gained, PET_EXPERIENCE);
        assert_eq!(outcome.coins_gained, 0);
        assert!(!outcome.leveled_up);
        assert!(outcome.mission_completed.is_none());
        assert_eq!(p.missions.pet.count, 1);
    }

    #[test]
    fn test_pet_mission_completes_once() {
        let mut p = Progression::new();
        let mut completions = 0;
        for _ in 0..PET_MISSION_GOAL + 5 {
            if p.pet().mission_completed.is_some() {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(p.missions.pet.completed);
        // Counter caps at the goal.
        assert_eq!(p.missions.pet.count, PET_MISSION_GOAL);
    }

    #[test]
    fn test_feed_missions_tracked_per_food() {
        let mut p = Progression::new();
        for _ in 0..FEED_MISSION_GOAL {
            p.feed(FoodKind::Berry);
        }
        assert!(p.missions.feed_berry.completed);
        assert!(!p.missions.feed_cookie.completed);
        assert_eq!(p.missions.feed_cookie.count, 0);
    }

    #[test]
    fn test_mission_completion_pays_reward() {
        let mut p = Progression::new();
        for _ in 0..FEED_MISSION_GOAL - 1 {
            p.feed(FoodKind::Star);
        }
        let coins_before = p.coins;
        let outcome = p.feed(FoodKind::Star);
        assert_eq!(outcome.mission_completed, Some(MissionKind::Feed(FoodKind::Star)));
        assert_eq!(outcome.experience_gained, FEED_EXPERIENCE + MISSION_EXPERIENCE_REWARD);
        assert!(p.coins >= coins_before + MISSION_COIN_REWARD);
    }

    #[test]
    fn test_buy_decoration_insufficient_coins_rejected() {
        let mut p = Progression::new();
        let before = p.clone();
        let err = p.buy_decoration("pool", 9999).expect_err("must reject");
        assert_eq!(
            err,
            ShopError::InsufficientCoins {
                coins: STARTING_COINS,
                price: 9999
            }
        );
        // Nothing changed.
        assert_eq!(p, before);
    }

    #[test]
    fn test_buy_decoration_already_owned_rejected() {
        let mut p = Progression::new();
        p.buy_decoration("fence", 30).expect("first purchase");
        let coins_after_first = p.coins;
        let err = p.buy_decoration("fence", 30).expect_err("must reject");
        assert!(matches!(err, ShopError::AlreadyOwned(_)));
        assert_eq!(p.coins, coins_after_first);
    }

    #[test]
    fn test_buy_decoration_debits_and_owns() {
        let mut p = Progression::new();
        p.buy_decoration("garden", 40).expect("purchase");
        assert_eq!(p.coins, STARTING_COINS - 40);
        assert!(p.owns("garden"));
    }

    #[test]
    fn test_place_decoration_validates_range() {
        let mut p = Progression::new();
        assert!(p.place_decoration("garden", 50.0, 101.0).is_err());
        assert!(p.place_decoration("garden", -1.0, 50.0).is_err());
        let placed = p.place_decoration("garden", 0.0, 100.0).expect("corner is valid");
        assert_eq!(p.placed.len(), 1);
        assert_eq!(p.placed[0].id, placed.id);
    }

    #[test]
    fn test_crown_tier_follows_level() {
        assert_eq!(CrownTier::for_level(0), CrownTier::None);
        assert_eq!(CrownTier::for_level(1), CrownTier::Bronze);
        assert_eq!(CrownTier::for_level(2), CrownTier::Silver);
        assert_eq!(CrownTier::for_level(3), CrownTier::Golden);
        assert_eq!(CrownTier::for_level(10), CrownTier::Golden);
    }

    #[test]
    fn test_remove_decoration_by_id() {
        let mut p = Progression::new();
        let placed = p.place_decoration("fence", 10.0, 20.0).expect("place");
        assert!(p.remove_decoration(placed.id));
        assert!(p.placed.is_empty());
        // Unknown id is a no-op.
        assert!(!p.remove_decoration(DecorationId::new()));
    }
}
