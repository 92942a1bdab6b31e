//! Response templates using Handlebars. Strict mode catches templates
//! that reference anything other than `prompt` and `model`, and
//! escaping is turned off since responses are plain text, not HTML.

use anyhow::{Context, Error, Result};
use handlebars::{Handlebars, no_escape};
use serde::Serialize;

use super::catalog::Catalog;

/// Name the fallback template is registered under. Not a valid model id
/// because it contains a space.
pub const FALLBACK: &str = "fallback template";

const FALLBACK_TEMPLATE: &str = "{{model}} Response: {{prompt}}";

#[derive(Serialize)]
pub struct ResponseContext<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
}

pub fn templates<'a>(catalog: &Catalog) -> Result<Handlebars<'a>, Error> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry.register_escape_fn(no_escape);
    registry
        .register_template_string(FALLBACK, FALLBACK_TEMPLATE)
        .context("Failed to register fallback template")?;
    for preset in catalog.presets() {
        registry
            .register_template_string(&preset.id, &preset.template)
            .with_context(|| format!("Failed to register template for {}", preset.id))?;
    }
    Ok(registry)
}

/// Render the response for `model`, falling back to the generic
/// template for models the catalog doesn't know.
pub fn render(registry: &Handlebars<'_>, model: &str, prompt: &str) -> Result<String, Error> {
    let name = if registry.has_template(model) {
        model
    } else {
        FALLBACK
    };
    let rendered = registry.render(name, &ResponseContext { model, prompt })?;
    Ok(rendered)
}
