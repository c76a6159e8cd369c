//! Badge API endpoints.

use axum::extract::{Path, State};
use axum::Extension;

use super::{success, ApiResult};
use crate::auth::AuthenticatedUser;
use crate::badges::award_badge;
use crate::models::UserBadges;
use crate::pages::PageState;

/// GET {realm}/api/badges - Badges collected by the current user.
pub async fn list_badges(
    State(state): State<PageState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserBadges> {
    let badges = state.app.repo.get_user_badges(&user.username).await?;
    success(badges)
}

/// POST {realm}/api/badges/{badge} - Award a badge to the current user.
pub async fn award(
    State(state): State<PageState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(badge): Path<String>,
) -> ApiResult<UserBadges> {
    let badges = award_badge(
        &state.app.repo,
        &state.app.catalog,
        &user.username,
        &badge,
    )
    .await?;
    success(badges)
}
