//! Cargo.toml generation for the generated package.
//!
//! The manifest carries the package fields, a do-not-edit notice, and the
//! dependencies the generated code links against: the `modelsmith` runtime
//! plus serde. Storage models run detached cache writes, so tokio is added
//! as a dev-dependency for tests of the generated crate.

use std::path::Path;

use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;
use crate::output::write_atomic;

/// Renders the Cargo.toml of the generated package.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::cargo_gen::render_cargo_toml;
/// use modelsmith_gen::config::GeneratorConfig;
///
/// let manifest = render_cargo_toml(&GeneratorConfig::default());
/// assert!(manifest.contains("name = \"modelsmith-generated\""));
/// assert!(manifest.contains("modelsmith = "));
/// ```
pub fn render_cargo_toml(config: &GeneratorConfig) -> String {
    format!(
        r#"[package]
name = "{package}"
version = "0.1.0"
edition = "2024"
license = "AGPL-3.0-only"
description = "Generated contexts, media types and models from modelsmith designs"

# This file was automatically generated by modelsmith-gen.
# Do not edit manually - changes will be overwritten.

[dependencies]
modelsmith = {{ version = "{runtime}", path = "{runtime_path}" }}
serde = {{ version = "1.0", features = ["derive"] }}
serde_json = "1.0"

[dev-dependencies]
tokio = {{ version = "1.43", features = ["rt-multi-thread", "macros"] }}
"#,
        package = config.target_package,
        runtime = config.runtime_version,
        runtime_path = config.runtime_path,
    )
}

/// Writes the Cargo.toml into `package_dir`, or prints it on a dry run.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if the file cannot be written.
pub fn write_cargo_toml(
    package_dir: &Path,
    config: &GeneratorConfig,
    dry_run: bool,
) -> Result<(), GeneratorError> {
    let manifest = render_cargo_toml(config);
    let path = package_dir.join("Cargo.toml");
    if dry_run {
        println!("=== {} ===\n{manifest}", path.display());
        return Ok(());
    }
    write_atomic(&path, &manifest)
}
