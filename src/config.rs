use crate::table::Column;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    /// Ensure the config directory exists
    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Generate default configuration template as a string
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub input: InputConfig,
    pub reference: ReferenceConfig,
    pub export: ExportConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub delimiter: char,
    /// Columns that are never typed as numbers, so identifiers keep leading zeros.
    pub text_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    pub key_column: String,
    pub value_column: String,
    /// Worksheet to read; the first sheet when unset.
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub sheet_name: String,
    pub file_name: String,
    pub money_columns: Vec<String>,
    pub money_format: String,
    pub money_width: f64,
    pub width_padding: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            input: InputConfig::default(),
            reference: ReferenceConfig::default(),
            export: ExportConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: '|',
            text_columns: vec![
                Column::SidNumber.name().to_string(),
                Column::Account.name().to_string(),
            ],
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            key_column: "SID".to_string(),
            value_column: Column::Account.name().to_string(),
            sheet: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "CombinedData".to_string(),
            file_name: "combined_data.xlsx".to_string(),
            money_columns: vec![
                Column::StampDutyFee.name().to_string(),
                Column::GrossAmount.name().to_string(),
            ],
            money_format: "#,##0.00".to_string(),
            money_width: 20.0,
            width_padding: 2,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { preview_rows: 50 }
    }
}

impl ExportConfig {
    pub fn is_money_column(&self, column: &Column) -> bool {
        self.money_columns.iter().any(|c| c == column.name())
    }
}

// Configuration loading and merging
impl PipelineConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let mut config = PipelineConfig::default();

        if let Ok(user_config) = Self::load_user_config(app_name) {
            config.merge(user_config);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from default → explicit file. Unlike the user
    /// config, a missing or unreadable explicit file is an error.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = PipelineConfig::default();
        config.merge(Self::read_file(path)?);
        config.validate()?;
        Ok(config)
    }

    /// Load user configuration from ~/.config/materai/config.toml
    fn load_user_config(app_name: &str) -> Result<PipelineConfig> {
        let config_manager = ConfigManager::new(app_name)?;
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(PipelineConfig::default());
        }

        Self::read_file(&config_path)
    }

    fn read_file(config_path: &Path) -> Result<PipelineConfig> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: PipelineConfig) {
        if other.version != PipelineConfig::default().version {
            self.version = other.version;
        }

        self.input.merge(other.input);
        self.reference.merge(other.reference);
        self.export.merge(other.export);
        self.display.merge(other.display);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        let delimiter = self.input.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(eyre!(
                "Invalid delimiter {:?}: must be a single ASCII character other than a quote or newline",
                delimiter
            ));
        }

        if self.reference.key_column.is_empty() || self.reference.value_column.is_empty() {
            return Err(eyre!("reference key_column and value_column must not be empty"));
        }

        let sheet = &self.export.sheet_name;
        if sheet.is_empty() || sheet.chars().count() > 31 {
            return Err(eyre!(
                "Invalid sheet_name '{}': must be 1 to 31 characters",
                sheet
            ));
        }
        if sheet.contains(['[', ']', ':', '*', '?', '/', '\\']) {
            return Err(eyre!(
                "Invalid sheet_name '{}': must not contain any of []:*?/\\",
                sheet
            ));
        }

        if !(self.export.money_width > 0.0 && self.export.money_width <= 255.0) {
            return Err(eyre!("money_width must be between 0 and 255"));
        }

        if self.display.preview_rows == 0 {
            return Err(eyre!("preview_rows must be greater than 0"));
        }

        Ok(())
    }
}

// Merge implementations for each config section
impl InputConfig {
    pub fn merge(&mut self, other: Self) {
        let default = InputConfig::default();
        if other.delimiter != default.delimiter {
            self.delimiter = other.delimiter;
        }
        if other.text_columns != default.text_columns {
            self.text_columns = other.text_columns;
        }
    }
}

impl ReferenceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ReferenceConfig::default();
        if other.key_column != default.key_column {
            self.key_column = other.key_column;
        }
        if other.value_column != default.value_column {
            self.value_column = other.value_column;
        }
        if other.sheet.is_some() {
            self.sheet = other.sheet;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.sheet_name != default.sheet_name {
            self.sheet_name = other.sheet_name;
        }
        if other.file_name != default.file_name {
            self.file_name = other.file_name;
        }
        if other.money_columns != default.money_columns {
            self.money_columns = other.money_columns;
        }
        if other.money_format != default.money_format {
            self.money_format = other.money_format;
        }
        if other.money_width != default.money_width {
            self.money_width = other.money_width;
        }
        if other.width_padding != default.width_padding {
            self.width_padding = other.width_padding;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.preview_rows != default.preview_rows {
            self.preview_rows = other.preview_rows;
        }
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
