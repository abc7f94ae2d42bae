use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    auth::AuthenticatedUser,
    gateway::{
        CostumeGateway, EquipmentGateway, LocationGateway, PersonnelGateway, PropGateway,
    },
    state::AppState,
};

pub mod auth;
pub mod files;
pub mod health;
pub mod resources;
pub mod shoots;
pub mod teams;

fn cors_layer(state: &AppState) -> CorsLayer {
    let allow_origin = match state.config.cors_allowed_origin.as_ref() {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(_) => {
                        tracing::warn!(origin = value, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(&state);
    let body_limit = state.config.max_upload_bytes;

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let teams_routes = Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route(
            "/current",
            get(teams::current_team).post(teams::switch_team),
        );

    let files_routes = Router::new()
        .route("/", get(files::list_files).post(files::upload_file))
        .route("/:id", axum::routing::delete(files::delete_file));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/personnel", resources::resource_routes::<PersonnelGateway>())
        .nest("/api/equipment", resources::resource_routes::<EquipmentGateway>())
        .nest("/api/props", resources::resource_routes::<PropGateway>())
        .nest("/api/costumes", resources::resource_routes::<CostumeGateway>())
        .nest("/api/locations", resources::resource_routes::<LocationGateway>())
        .nest("/api/shoots", shoots::shoot_routes())
        .nest("/api/teams", teams_routes)
        .nest("/api/files", files_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
}
