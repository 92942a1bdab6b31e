use anyhow::Result;

use crate::core::AppConfig;

pub fn run() -> Result<()> {
    let config = AppConfig::default();
    let catalog = config.catalog()?;

    for preset in catalog.presets() {
        let marker = if preset.id == config.default_model {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<22} {:<20} {}",
            marker, preset.id, preset.name, preset.category
        );
    }

    Ok(())
}
