//! Badge catalog and the award workflow.

use std::collections::BTreeMap;
use std::path::Path;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Badge, UserBadges};

const ASSET_EXTENSIONS: [&str; 4] = ["png", "svg", "jpg", "webp"];

/// Badges that can be awarded, named after the asset files that depict them.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    /// Badge name to asset file name.
    badges: BTreeMap<String, String>,
}

impl BadgeCatalog {
    /// Build the catalog from the file stems in a badge asset directory.
    ///
    /// Falls back to the classifier badges when the directory cannot be read
    /// or holds no badge assets.
    pub fn from_dir(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Badge directory {:?} unavailable ({}), using built-in badges",
                    dir,
                    e
                );
                return Self::builtin();
            }
        };

        let badges: BTreeMap<String, String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            })
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                let file_name = path.file_name()?.to_str()?;
                Some((stem.to_string(), file_name.to_string()))
            })
            .collect();

        if badges.is_empty() {
            tracing::warn!("No badge assets in {:?}, using built-in badges", dir);
            return Self::builtin();
        }

        tracing::info!("Loaded {} badges from {:?}", badges.len(), dir);
        Self { badges }
    }

    /// Catalog of the badges the classifier can hand out, drawn by the
    /// bundled SVG assets.
    pub fn builtin() -> Self {
        Self {
            badges: Badge::ALL
                .iter()
                .map(|b| (b.as_str().to_string(), format!("{}.svg", b.as_str())))
                .collect(),
        }
    }

    pub fn contains(&self, badge: &str) -> bool {
        self.badges.contains_key(badge)
    }

    /// File name of the asset depicting a badge.
    pub fn asset(&self, badge: &str) -> Option<&str> {
        self.badges.get(badge).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.badges.keys().map(String::as_str)
    }
}

/// Award a badge to a user. Awarding a badge twice has no further effect.
pub async fn award_badge(
    repo: &Repository,
    catalog: &BadgeCatalog,
    username: &str,
    badge: &str,
) -> Result<UserBadges, AppError> {
    if !catalog.contains(badge) {
        return Err(AppError::NotFound(format!("Badge {} not found", badge)));
    }

    if repo.add_badge(username, badge).await? {
        tracing::info!(username, badge, "badge awarded");
    } else {
        tracing::debug!(username, badge, "badge already collected");
    }

    repo.get_user_badges(username).await
}
