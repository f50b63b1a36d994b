//! Event-creation endpoints that quick-add links are redirected to

use axum::{Json, Router, extract::Query, response::Redirect, routing::get};
use quickadd_core::QuickAddError;
use quickadd_core::constants::{BOUNCE_PATH, HANDLER_PATH};
use quickadd_core::intercept::is_quick_add_url;
use quickadd_core::quick_add::QuickAddEvent;
use serde::Deserialize;
use url::Url;

use crate::routes::AppError;

pub fn router() -> Router {
    Router::new()
        .route(HANDLER_PATH, get(add_event))
        .route(BOUNCE_PATH, get(bounce))
}

/// GET /event/add-to - Parse the forwarded quick-add parameters
async fn add_event(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<QuickAddEvent>, AppError> {
    let event = QuickAddEvent::from_query_pairs(params)?;

    tracing::info!(
        title = event.title.as_deref().unwrap_or(""),
        guests = event.guests.len(),
        "received quick-add event"
    );

    Ok(Json(event))
}

#[derive(Deserialize)]
struct BounceParams {
    original: Option<String>,
}

/// GET /event/add-to-bounce - Send the browser back to the original link
async fn bounce(Query(params): Query<BounceParams>) -> Result<Redirect, AppError> {
    let original = params
        .original
        .filter(|original| !original.is_empty())
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Missing 'original' parameter")))?;

    if !is_quick_add_url(&original) {
        return Err(QuickAddError::NotQuickAdd(original).into());
    }

    // Serialising through `Url` percent-encodes spaces and non-ASCII text.
    let target = Url::parse(&original)
        .map_err(|e| QuickAddError::InvalidUrl(original.clone(), e.to_string()))?;

    tracing::debug!(%target, "bouncing to original provider");
    Ok(Redirect::temporary(target.as_str()))
}
