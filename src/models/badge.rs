//! Per-user badge progress.

use serde::{Deserialize, Serialize};

/// Badges a user has collected so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBadges {
    pub username: String,
    pub badges: Vec<String>,
}

impl UserBadges {
    pub fn has(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }
}
