use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/sauces", sauce_routes())
}

fn sauce_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::sauce::list_sauces).post(handlers::sauce::create_sauce),
        )
        .route(
            "/{id}",
            get(handlers::sauce::get_sauce)
                .put(handlers::sauce::update_sauce)
                .delete(handlers::sauce::delete_sauce),
        )
        .route("/{id}/like", post(handlers::sauce::vote_sauce))
        .layer(handlers::sauce::image_upload_body_limit())
}

pub fn image_routes() -> Router<AppState> {
    Router::new().route("/{key}", get(handlers::image::get_image))
}
