use serde::{Deserialize, Serialize};

use crate::error::RejectionReason;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorKey {
    pub public_key: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterRegistration {
    pub public_key: String,
    pub department: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Serialize, Deserialize)]
pub struct TipInfo {
    pub index: usize,
    pub hash: String,
}

#[derive(Serialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub message: String,
}

impl From<RejectionReason> for Rejection {
    fn from(reason: RejectionReason) -> Self {
        Self {
            reason,
            message: reason.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub voter: String,
    pub candidate: String,
    pub position: String,
    pub department: String,
    pub hash: String,
}
