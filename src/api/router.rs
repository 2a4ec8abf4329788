//! HTTP router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//! Layers (outermost → innermost): CORS → body limit → access log.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::attachments::MAX_ATTACHMENT_BYTES;
use crate::core_state::CoreState;

/// Build the API router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/detect", post(endpoints::reference::detect))
        .route("/reference/conditions", get(endpoints::reference::conditions))
        .route("/reference/conditions/:name", get(endpoints::reference::condition))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route("/patients/:id", get(endpoints::patients::detail))
        .route(
            "/patients/:id/cases",
            get(endpoints::patients::cases).post(endpoints::cases::start),
        )
        .route(
            "/cases/:id",
            get(endpoints::cases::detail).delete(endpoints::cases::delete),
        )
        .route("/cases/:id/note", post(endpoints::cases::note))
        .route("/cases/:id/condition", post(endpoints::cases::condition))
        .route("/cases/:id/icd-codes", post(endpoints::cases::icd_code))
        .route(
            "/cases/:id/baskets/:basket_type/items",
            post(endpoints::cases::basket_item),
        )
        .route(
            "/cases/:id/baskets/:basket_type/items/:code/quantity",
            put(endpoints::cases::quantity),
        )
        .route(
            "/cases/:id/baskets/:basket_type/items/:code/documentation",
            put(endpoints::cases::documentation),
        )
        .route("/cases/:id/skip-ongoing", post(endpoints::cases::skip_ongoing))
        .route("/cases/:id/admissible", get(endpoints::cases::admissible))
        .route(
            "/cases/:id/medicines",
            get(endpoints::cases::medicines).post(endpoints::cases::medicine),
        )
        .route("/cases/:id/plan", put(endpoints::cases::plan))
        .route("/cases/:id/advance", post(endpoints::cases::advance))
        .route("/cases/:id/back", post(endpoints::cases::back))
        .route(
            "/cases/:id/registration-notes",
            post(endpoints::cases::registration_note),
        )
        .route("/cases/:id/save", post(endpoints::cases::save))
        .route("/cases/:id/archive", post(endpoints::cases::archive))
        .route("/cases/:id/export", get(endpoints::cases::export))
        .route(
            "/cases/:id/encounters",
            get(endpoints::encounters::list).post(endpoints::encounters::begin),
        )
        .route("/cases/:id/encounters/codes", post(endpoints::encounters::code))
        .route(
            "/cases/:id/encounters/complete",
            post(endpoints::encounters::complete),
        )
        .route(
            "/cases/:id/encounters/current",
            axum::routing::delete(endpoints::encounters::cancel),
        )
        .route(
            "/cases/:id/referrals",
            get(endpoints::referrals::list).post(endpoints::referrals::draft),
        )
        .route("/referrals/:id/send", post(endpoints::referrals::send))
        .route(
            "/referrals/:id/acknowledge",
            post(endpoints::referrals::acknowledge),
        )
        .route("/referrals/:id/cancel", post(endpoints::referrals::cancel))
        .route(
            "/cases/:id/attachments",
            post(endpoints::attachments::upload),
        )
        .route(
            "/cases/:id/attachments/:hash",
            get(endpoints::attachments::download),
        )
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        // base64 body for the largest attachment plus JSON framing
        .layer(DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES / 3 * 4 + 64 * 1024))
        .layer(CorsLayer::permissive())
}
