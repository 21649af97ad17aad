//! Generator configuration.
//!
//! Settings come from three layers, lowest precedence first: built-in
//! defaults, an optional TOML file, then command-line overrides applied by
//! the binary.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_gen::config::GeneratorConfig;
//!
//! let config = GeneratorConfig::from_toml_str(r#"
//!     target_package = "cellar"
//!     cache_expiration_secs = 60
//! "#).unwrap();
//!
//! assert_eq!(config.target_package, "cellar");
//! assert_eq!(config.cache_expiration_secs, 60);
//! assert_eq!(config.app_module, "app");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::GeneratorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Package name of the generated crate.
    pub target_package: String,
    /// Directory generated sources are written to.
    pub output_dir: PathBuf,
    /// Module holding the default version's contexts and media types.
    pub app_module: String,
    /// Module holding storage models.
    pub models_module: String,
    /// Lifetime of cached model entries.
    pub cache_expiration_secs: u64,
    /// Interval between sweeps of expired cache entries.
    pub cache_purge_secs: u64,
    /// Render artifacts on the rayon thread pool.
    pub parallel: bool,
    /// Version requirement on the `modelsmith` runtime in the emitted
    /// Cargo.toml.
    pub runtime_version: String,
    /// Path of the `modelsmith` runtime, relative to the generated package.
    pub runtime_path: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_package: "modelsmith-generated".to_string(),
            output_dir: PathBuf::from("generated/src"),
            app_module: "app".to_string(),
            models_module: "models".to_string(),
            cache_expiration_secs: 300,
            cache_purge_secs: 30,
            parallel: true,
            runtime_version: "0.1.0".to_string(),
            runtime_path: "../modelsmith".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::ConfigError` for malformed TOML, unknown keys
    /// or invalid module names.
    pub fn from_toml_str(text: &str) -> Result<Self, GeneratorError> {
        let config: GeneratorConfig =
            toml::from_str(text).map_err(|e| GeneratorError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML configuration file.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::ConfigError` if the file cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = fs::read_to_string(path).map_err(|e| {
            GeneratorError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks module names and cache windows.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        for (key, value) in [
            ("app_module", &self.app_module),
            ("models_module", &self.models_module),
        ] {
            let valid = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                && !value.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(GeneratorError::ConfigError(format!(
                    "{key} must be a snake_case module name, got '{value}'"
                )));
            }
        }
        if self.app_module == self.models_module {
            return Err(GeneratorError::ConfigError(
                "app_module and models_module must differ".to_string(),
            ));
        }
        if self.cache_expiration_secs == 0 {
            return Err(GeneratorError::ConfigError(
                "cache_expiration_secs must be positive".to_string(),
            ));
        }
        if self.target_package.is_empty() {
            return Err(GeneratorError::ConfigError(
                "target_package must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Rust crate name of the generated package.
    pub fn crate_name(&self) -> String {
        self.target_package.replace('-', "_")
    }
}
