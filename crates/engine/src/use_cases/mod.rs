//! Use cases - orchestration over stores and ports.

pub mod chat;
pub mod game;
pub mod mint;
pub mod wallet;

pub use chat::ChatWithPet;
pub use game::GameActions;
pub use mint::{MintError, MintOutcome, MintToken};
pub use wallet::WalletSession;
