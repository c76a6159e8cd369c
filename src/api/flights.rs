//! Flight API endpoints.

use axum::extract::{Query, State};

use super::{success, ApiResult};
use crate::flights::ViewerQuery;
use crate::models::NormalizedFlight;
use crate::pages::PageState;

/// GET {realm}/api/flights - Nearby flights, nearest first.
pub async fn nearby_flights(
    State(state): State<PageState>,
    Query(query): Query<ViewerQuery>,
) -> ApiResult<Vec<NormalizedFlight>> {
    let flights = state
        .app
        .fetcher
        .nearby_flights(&state.app.repo, &query)
        .await?;
    success(flights)
}
