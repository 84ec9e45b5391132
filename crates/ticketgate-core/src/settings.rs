//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `TICKETGATE__*` environment variables
//! (e.g. `TICKETGATE__PATHS__TEMPLATE=/srv/ticket.pdf`).

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Name of the config file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "ticketgate.toml";

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for every relative path below
    pub data_dir: PathBuf,
    pub paths: PathSettings,
    pub logging: LoggingSettings,
    pub ticket: TicketLayout,
}

/// Store and artifact locations, relative to `data_dir` unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub qr_dir: PathBuf,
    pub output_dir: PathBuf,
    pub valid_file: PathBuf,
    pub used_file: PathBuf,
    pub scan_log: PathBuf,
    pub app_log: PathBuf,
    pub template: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter for the application log file (`RUST_LOG` wins when set)
    pub level: String,
    /// Whether to append to the application log file
    pub file: bool,
}

/// Placement of the QR image and code label on the ticket template, in PDF points
///
/// Margins are measured from the bottom edge (both), the left edge (QR)
/// and the right edge (label).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketLayout {
    pub qr_size: f32,
    pub qr_margin_x: f32,
    pub qr_margin_y: f32,
    pub text_margin_x: f32,
    pub text_margin_y: f32,
    pub font_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            paths: PathSettings::default(),
            logging: LoggingSettings::default(),
            ticket: TicketLayout::default(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            qr_dir: PathBuf::from("qrs"),
            output_dir: PathBuf::from("entradas"),
            valid_file: PathBuf::from("qrs/codigos_validos.txt"),
            used_file: PathBuf::from("entradas/usados.txt"),
            scan_log: PathBuf::from("entradas/registro_escaneos.csv"),
            app_log: PathBuf::from("entradas/log_app.txt"),
            template: PathBuf::from("template/template_ticket.pdf"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: true,
        }
    }
}

impl Default for TicketLayout {
    fn default() -> Self {
        Self {
            qr_size: 180.0,
            qr_margin_x: 60.0,
            qr_margin_y: 130.0,
            text_margin_x: 250.0,
            text_margin_y: 130.0,
            font_size: 17.0,
        }
    }
}

impl Settings {
    /// Load settings
    ///
    /// `config_file` is required to exist when given; otherwise
    /// `<data_dir>/ticketgate.toml` is read if present. `data_dir`
    /// overrides every other source.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or the result is invalid
    pub fn load(config_file: Option<&Path>, data_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => {
                let base = data_dir.unwrap_or_else(|| Path::new("."));
                builder.add_source(File::from(base.join(CONFIG_FILE_NAME)).required(false))
            }
        };

        builder = builder
            .add_source(Environment::with_prefix("TICKETGATE").separator("__"))
            .set_override_option("data_dir", data_dir.map(|p| p.display().to_string()))?;

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings rooted at `data_dir` with every other value defaulted
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Validate values that would produce an unusable ticket
    ///
    /// # Errors
    /// Returns `ConfigError::Message` describing the first invalid value
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Message(message.to_string()));

        let layout = &self.ticket;
        if layout.qr_size <= 0.0 {
            return invalid("ticket.qr_size must be positive");
        }
        if layout.font_size <= 0.0 {
            return invalid("ticket.font_size must be positive");
        }
        if self.logging.level.trim().is_empty() {
            return invalid("logging.level cannot be empty");
        }
        Ok(())
    }

    /// Resolve a configured path against `data_dir`
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    #[must_use]
    pub fn qr_dir(&self) -> PathBuf {
        self.resolve(&self.paths.qr_dir)
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output_dir)
    }

    #[must_use]
    pub fn valid_file(&self) -> PathBuf {
        self.resolve(&self.paths.valid_file)
    }

    #[must_use]
    pub fn used_file(&self) -> PathBuf {
        self.resolve(&self.paths.used_file)
    }

    #[must_use]
    pub fn scan_log(&self) -> PathBuf {
        self.resolve(&self.paths.scan_log)
    }

    #[must_use]
    pub fn app_log(&self) -> PathBuf {
        self.resolve(&self.paths.app_log)
    }

    #[must_use]
    pub fn template(&self) -> PathBuf {
        self.resolve(&self.paths.template)
    }
}
