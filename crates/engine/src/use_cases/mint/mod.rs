//! Mint pipeline: capture, upload, on-chain mint.

mod error;
mod mint_token;

pub use error::MintError;
pub use mint_token::{MintOutcome, MintStatusView, MintToken};
