//! Merge rules: built-in defaults applied beneath every other source.

use crate::provider::ChatProviderConfig;
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with defaults for keys that partial files may omit.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = Config::builder().set_default("books_root", "books")?;
    for (section, defaults) in [
        ("text", ChatProviderConfig::text_default()),
        ("rename", ChatProviderConfig::rename_default()),
    ] {
        builder = builder
            .set_default(format!("providers.{}.base_url", section), defaults.base_url)?
            .set_default(format!("providers.{}.model", section), defaults.model)?
            .set_default(format!("providers.{}.api_key_env", section), defaults.api_key_env)?;
    }
    Ok(builder)
}
