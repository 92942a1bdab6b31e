//! Router for the model catalog API

use axum::{Router, extract::State, response::Json};

use super::public;
use crate::api::SharedState;

/// List the models a user can select or chain
async fn list_models(State(state): State<SharedState>) -> Json<public::ModelsResponse> {
    let shared_state = state.read().expect("Unable to read share state");
    Json(public::ModelsResponse {
        models: shared_state
            .catalog
            .presets()
            .iter()
            .map(public::Model::from)
            .collect(),
        default_model: shared_state.config.default_model.clone(),
        default_chain: shared_state.config.default_chain.clone(),
    })
}

/// Create the models router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", axum::routing::get(list_models))
}
