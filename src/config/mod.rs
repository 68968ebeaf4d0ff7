mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{ApplicationSettings, LoggingSettings, ServerSettings, Settings};

/// Prefix for environment overrides, e.g. `HOLORELAY_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "HOLORELAY";

/// Loads the configuration from `config/default.*` (optional) and the
/// environment, merged over the built-in defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge(Settings::default()))
}
