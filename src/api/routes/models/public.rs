//! Public types for the model catalog API
use serde::Serialize;

use crate::ai::catalog::{Category, ModelPreset};

#[derive(Serialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub category: Category,
}

impl From<&ModelPreset> for Model {
    fn from(preset: &ModelPreset) -> Self {
        Self {
            id: preset.id.clone(),
            name: preset.name.clone(),
            category: preset.category,
        }
    }
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<Model>,
    pub default_model: String,
    pub default_chain: Vec<String>,
}
