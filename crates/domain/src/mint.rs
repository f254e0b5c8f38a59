//! Mint attempt status machine and result.
//!
//! The pipeline is linear: `Idle -> Capturing -> Uploading -> Minting` and
//! then one of the terminal stages. The only backward transition is a
//! manual reset from a terminal stage back to `Idle`.

use crate::error::DomainError;
use crate::value_objects::content_uri::ContentUri;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a mint attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintStage {
    #[default]
    Idle,
    Capturing,
    Uploading,
    Minting,
    Success,
    Error,
}

impl MintStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MintStage::Success | MintStage::Error)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            MintStage::Capturing | MintStage::Uploading | MintStage::Minting
        )
    }

    /// Validate the manual reset transition.
    pub fn reset(&self) -> Result<MintStage, DomainError> {
        if self.is_terminal() || *self == MintStage::Idle {
            Ok(MintStage::Idle)
        } else {
            Err(DomainError::invalid_state_transition(format!(
                "cannot reset while a mint attempt is {self}"
            )))
        }
    }
}

impl fmt::Display for MintStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MintStage::Idle => "idle",
            MintStage::Capturing => "capturing",
            MintStage::Uploading => "uploading",
            MintStage::Minting => "minting",
            MintStage::Success => "success",
            MintStage::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Outcome of one mint attempt. Replaces the previous result slot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum MintResult {
    Success {
        token_id: u64,
        metadata_uri: ContentUri,
        image_uri: ContentUri,
    },
    Failure {
        message: String,
    },
}

impl MintResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_from_terminal_stages() {
        assert_eq!(MintStage::Success.reset().expect("allowed"), MintStage::Idle);
        assert_eq!(MintStage::Error.reset().expect("allowed"), MintStage::Idle);
        assert_eq!(MintStage::Idle.reset().expect("allowed"), MintStage::Idle);
    }

    #[test]
    fn test_reset_rejected_in_flight() {
        for stage in [MintStage::Capturing, MintStage::Uploading, MintStage::Minting] {
            assert!(stage.is_in_flight());
            assert!(stage.reset().is_err());
        }
    }

    #[test]
    fn test_result_serializes_tagged() {
        let result = MintResult::Success {
            token_id: 1,
            metadata_uri: ContentUri::parse("ipfs://QmMeta").expect("uri"),
            image_uri: ContentUri::parse("ipfs://QmImage").expect("uri"),
        };
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["status"], "success");
        assert_eq!(value["token_id"], 1);
        assert_eq!(value["metadata_uri"], "ipfs://QmMeta");

        let failure = MintResult::failure("upload failed");
        let value = serde_json::to_value(&failure).expect("serialize");
        assert_eq!(value["status"], "failure");
        assert_eq!(value["message"], "upload failed");
    }
}
