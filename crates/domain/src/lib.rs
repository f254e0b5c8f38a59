//! Block Home Domain - core types, value objects, and invariants.
//!
//! Everything in this crate is pure and synchronous: avatar configuration,
//! game progression, the token metadata schema, content URIs, and the mint
//! status machine. I/O lives in the engine crate behind ports.

pub mod error;
pub mod mint;
pub mod progression;
pub mod types;
pub mod value_objects;

pub use error::DomainError;
pub use mint::{MintResult, MintStage};
pub use progression::{
    ActionOutcome, CrownTier, DecorationId, FoodKind, MissionKind, MissionState,
    PlacedDecoration, Progression, ShopError,
};
pub use types::avatar::{
    Accessory, AvatarConfig, BodyStyle, CharacterColor, Expression, GroundStyle, TimeOfDay,
    Weather,
};
pub use types::metadata::{TokenMetadata, TraitEntry, TraitValue};
pub use types::wallet::{network_name, Address};
pub use value_objects::content_uri::{ContentUri, IPFS_SCHEME};
