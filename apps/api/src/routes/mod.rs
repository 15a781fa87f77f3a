pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::standards::handlers as standards;
use crate::state::AppState;
use crate::worksheet::handlers as worksheet;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Worksheet generation
        .route(
            "/api/generate-pdf",
            post(worksheet::handle_generate_pdf).fallback(worksheet::handle_method_not_allowed),
        )
        .route(
            "/api/v1/worksheets/sample",
            post(worksheet::handle_sample_worksheet),
        )
        // Standards packs
        .route(
            "/api/v1/packs",
            get(standards::handle_list_packs).post(standards::handle_import_pack),
        )
        .route("/api/v1/packs/samples", post(standards::handle_load_samples))
        .route("/api/v1/packs/csv", post(standards::handle_import_csv))
        .route("/api/v1/frameworks", get(standards::handle_list_frameworks))
        .route(
            "/api/v1/frameworks/:id/standards",
            get(standards::handle_list_standards),
        )
        // Standards selection
        .route(
            "/api/v1/selection",
            get(standards::handle_get_selection).post(standards::handle_add_selection),
        )
        .route(
            "/api/v1/selection/:code",
            delete(standards::handle_remove_selection),
        )
        .with_state(state)
}
