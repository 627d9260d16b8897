// src/routes.rs

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn app(app_state: AppState) -> Router {
    let whatsapp_routes = Router::new()
        .route(
            "/webhook",
            get(handlers::whatsapp::verify_webhook).post(handlers::whatsapp::receive_webhook),
        )
        .route("/messages", get(handlers::inbox::list_messages))
        .route("/conversations", get(handlers::inbox::list_conversations))
        .route("/mark-read", post(handlers::inbox::mark_read));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/bills", post(handlers::bills::create_bill))
        .route("/api/contact", post(handlers::contact::submit_contact))
        .nest("/api/whatsapp", whatsapp_routes)
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
