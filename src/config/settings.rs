use serde::Deserialize;

/// Top-level configuration settings for the relay.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub application: ApplicationSettings,
}

/// Where the WebSocket server binds.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Settings for the bundled console application.
///
/// `heartbeat_secs = 0` disables the periodic status broadcast.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ApplicationSettings {
    pub heartbeat_secs: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub logging: Option<PartialLoggingSettings>,
    pub application: Option<PartialApplicationSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialApplicationSettings {
    pub heartbeat_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            application: ApplicationSettings { heartbeat_secs: 0 },
        }
    }
}

impl PartialSettings {
    /// Overlay whatever was provided onto `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let server = self.server;
        let logging = self.logging;
        let application = self.application;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(defaults.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(defaults.server.port),
            },
            logging: LoggingSettings {
                level: logging
                    .and_then(|l| l.level)
                    .unwrap_or(defaults.logging.level),
            },
            application: ApplicationSettings {
                heartbeat_secs: application
                    .and_then(|a| a.heartbeat_secs)
                    .unwrap_or(defaults.application.heartbeat_secs),
            },
        }
    }
}
