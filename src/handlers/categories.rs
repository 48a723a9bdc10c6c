//! Category listing with credential availability

use crate::error::AppResult;
use crate::handlers::AppState;
use crate::router::CategoryAvailability;
use axum::{Json, extract::State};

/// `GET /categories`: every category in scan order, with the model id of
/// its credential when one is configured. Secrets are never included.
pub async fn handler(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryAvailability>>> {
    let listing = state.router().availability().await?;
    tracing::debug!(
        categories = listing.len(),
        configured = listing.iter().filter(|c| c.has_key).count(),
        "Listed category availability"
    );
    Ok(Json(listing))
}
