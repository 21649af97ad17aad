//! Artifact identity, validation, formatting and file writing.
//!
//! This module handles the final phase of code generation: every rendered
//! token stream is validated, formatted and collected into an
//! [`ArtifactSet`], which is then written to disk atomically or bundled into
//! one file for `include!`.
//!
//! ## Output Structure
//!
//! ```text
//! src/
//! ├── lib.rs              # crate docs and module declarations
//! ├── app/                # the default version
//! │   ├── mod.rs
//! │   ├── contexts.rs
//! │   ├── hrefs.rs
//! │   ├── media_types.rs
//! │   └── user_types.rs
//! ├── v1/                 # one directory per named version
//! └── models/
//!     ├── mod.rs
//!     └── widget.rs       # one file per storage type
//! ```
//!
//! ## Safety Guarantees
//!
//! - **Validation**: All generated code is validated with `syn` before writing
//! - **Formatting**: Output is formatted with `prettyplease` for consistent style
//! - **Atomic writes**: Uses temp file + rename pattern to prevent partial writes
//! - **All or nothing**: Nothing is written unless every artifact rendered

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use syn::{AttrStyle, Item};
use tracing::debug;

use crate::errors::GeneratorError;

/// Notice prepended to every generated file.
pub const GENERATED_NOTICE: &str =
    "// This code was automatically generated by modelsmith-gen. Do not edit manually.\n\n";

/// Identity of one artifact: the version it belongs to (empty for
/// unversioned artifacts) and its path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArtifactKey {
    pub version: String,
    pub file: String,
}

impl ArtifactKey {
    pub fn new(version: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            file: file.into(),
        }
    }

    /// An artifact shared by every version.
    pub fn unversioned(file: impl Into<String>) -> Self {
        Self::new("", file)
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.file)
    }
}

/// A validated, formatted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub key: ArtifactKey,
    pub content: String,
}

impl Artifact {
    /// Validates and formats rendered tokens.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::CodeGenError` when the tokens do not parse as
    /// a Rust file.
    pub fn from_tokens(key: ArtifactKey, tokens: &TokenStream) -> Result<Self, GeneratorError> {
        let file = validate_code(tokens).map_err(|e| {
            GeneratorError::CodeGenError(format!("{}: {e}", key.file))
        })?;
        Ok(Self {
            key,
            content: format_code(&file),
        })
    }
}

/// Every artifact of a generation pass, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: BTreeMap<ArtifactKey, String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an artifact.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::DuplicateArtifact` when the key is taken.
    pub fn insert(&mut self, artifact: Artifact) -> Result<(), GeneratorError> {
        if self.artifacts.contains_key(&artifact.key) {
            return Err(GeneratorError::DuplicateArtifact(artifact.key.file));
        }
        self.artifacts.insert(artifact.key, artifact.content);
        Ok(())
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }

    /// Finds an artifact by relative path, whatever its version.
    pub fn by_path(&self, file: &str) -> Option<&str> {
        self.artifacts
            .iter()
            .find(|(key, _)| key.file == file)
            .map(|(_, content)| content.as_str())
    }

    /// Relative paths of every artifact, in key order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.artifacts.keys().map(ArtifactKey::path).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactKey, &str)> {
        self.artifacts.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Writes every artifact under `output_dir`.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::WriteError` for the first file that cannot
    /// be written.
    pub fn write(&self, output_dir: &Path) -> Result<(), GeneratorError> {
        for (key, content) in &self.artifacts {
            let path = output_dir.join(key.path());
            debug!(path = %path.display(), "writing artifact");
            write_atomic(&path, content)?;
        }
        Ok(())
    }

    /// Prints every artifact instead of writing it.
    pub fn print(&self) {
        for (key, content) in &self.artifacts {
            println!("=== {} ===\n{}\n", key.file, content);
        }
    }

    /// Inlines every module reachable from `lib.rs` into one file suitable
    /// for `include!` at a crate root.
    ///
    /// Crate-level inner attributes of `lib.rs` are dropped since they are
    /// not allowed in an included file.
    ///
    /// ## Errors
    ///
    /// Returns `GeneratorError::CodeGenError` when `lib.rs` is missing, an
    /// artifact fails to parse, or a declared module has no artifact.
    pub fn bundle(&self) -> Result<String, GeneratorError> {
        let lib = self
            .by_path("lib.rs")
            .ok_or_else(|| GeneratorError::CodeGenError("no lib.rs artifact to bundle".to_string()))?;
        let mut file = parse_artifact("lib.rs", lib)?;
        file.attrs.clear();
        file.items = self.inline_modules(Path::new(""), file.items)?;
        Ok(format_code(&file))
    }

    fn inline_modules(&self, dir: &Path, items: Vec<Item>) -> Result<Vec<Item>, GeneratorError> {
        items
            .into_iter()
            .map(|item| match item {
                Item::Mod(mut module) if module.content.is_none() => {
                    let name = module.ident.to_string();
                    let (path, text) = self.module_source(dir, &name)?;
                    let child = parse_artifact(&path, text)?;
                    let child_dir = dir.join(&name);
                    let items = self.inline_modules(&child_dir, child.items)?;
                    module.attrs.extend(child.attrs.into_iter().filter(|a| matches!(a.style, AttrStyle::Inner(_))));
                    module.content = Some((syn::token::Brace::default(), items));
                    module.semi = None;
                    Ok(Item::Mod(module))
                }
                other => Ok(other),
            })
            .collect()
    }

    /// Resolves `mod name;` declared in `dir` to `dir/name.rs` or
    /// `dir/name/mod.rs`.
    fn module_source(&self, dir: &Path, name: &str) -> Result<(String, &str), GeneratorError> {
        let candidates = [dir.join(format!("{name}.rs")), dir.join(name).join("mod.rs")];
        candidates
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .find_map(|p| self.by_path(&p).map(|text| (p, text)))
            .ok_or_else(|| {
                GeneratorError::CodeGenError(format!(
                    "module '{name}' declared in '{}' has no artifact",
                    dir.display()
                ))
            })
    }
}

fn parse_artifact(path: &str, text: &str) -> Result<syn::File, GeneratorError> {
    syn::parse_file(text)
        .map_err(|e| GeneratorError::CodeGenError(format!("artifact '{path}' does not parse: {e}")))
}

/// Validates generated code using syn.
///
/// ## Errors
///
/// Returns `GeneratorError::CodeGenError` if the code fails to parse.
pub fn validate_code(tokens: &TokenStream) -> Result<syn::File, GeneratorError> {
    syn::parse2(tokens.clone())
        .map_err(|e| GeneratorError::CodeGenError(format!("Generated code is invalid: {}", e)))
}

/// Formats generated code using prettyplease, prepending the generated-code
/// notice.
pub fn format_code(file: &syn::File) -> String {
    let formatted = prettyplease::unparse(file);
    format!("{GENERATED_NOTICE}{formatted}")
}

/// Writes content to a file atomically using temp file + rename.
///
/// ## Errors
///
/// Returns `GeneratorError::WriteError` if:
/// - Parent directories cannot be created
/// - The temp file cannot be written
/// - The rename operation fails
pub fn write_atomic(path: &Path, content: &str) -> Result<(), GeneratorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::WriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| GeneratorError::WriteError {
        path: temp_path.display().to_string(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| GeneratorError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;
    use tempfile::TempDir;

    fn artifact(file: &str, tokens: TokenStream) -> Artifact {
        Artifact::from_tokens(ArtifactKey::unversioned(file), &tokens).unwrap()
    }

    fn nested_set() -> ArtifactSet {
        let mut set = ArtifactSet::new();
        set.insert(artifact(
            "lib.rs",
            quote! {
                //! Crate docs.
                pub mod app;
            },
        ))
        .unwrap();
        set.insert(artifact(
            "app/mod.rs",
            quote! {
                //! App docs.
                pub mod contexts;
                pub use contexts::*;
            },
        ))
        .unwrap();
        set.insert(artifact(
            "app/contexts.rs",
            quote! {
                pub struct ShowBottleContext;
            },
        ))
        .unwrap();
        set
    }

    // === validate_code / format_code tests ===

    #[test]
    fn validate_code_accepts_valid_code() {
        let tokens = quote! {
            pub struct Foo { pub bar: String }
        };
        assert!(validate_code(&tokens).is_ok());
    }

    #[test]
    fn validate_code_rejects_invalid_code() {
        let tokens = quote! { pub struct { } };
        let err = validate_code(&tokens).unwrap_err();
        assert!(err.to_string().contains("Generated code is invalid"));
    }

    #[test]
    fn format_code_prepends_notice() {
        let file = validate_code(&quote!(pub struct Foo;)).unwrap();
        let formatted = format_code(&file);
        assert!(formatted.starts_with("// This code was automatically generated by modelsmith-gen"));
        assert!(formatted.contains("pub struct Foo;"));
    }

    #[test]
    fn invalid_artifacts_name_their_file() {
        let err = Artifact::from_tokens(ArtifactKey::unversioned("app/bad.rs"), &quote!(fn {})).unwrap_err();
        assert!(err.to_string().contains("app/bad.rs"));
    }

    // === ArtifactSet tests ===

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut set = ArtifactSet::new();
        set.insert(artifact("lib.rs", quote!())).unwrap();
        let err = set.insert(artifact("lib.rs", quote!())).unwrap_err();
        assert!(matches!(err, GeneratorError::DuplicateArtifact(ref file) if file == "lib.rs"));
    }

    #[test]
    fn paths_follow_key_order() {
        let mut set = ArtifactSet::new();
        set.insert(Artifact::from_tokens(ArtifactKey::new("v1", "v1/mod.rs"), &quote!()).unwrap())
            .unwrap();
        set.insert(artifact("models/mod.rs", quote!())).unwrap();
        set.insert(artifact("lib.rs", quote!())).unwrap();
        assert_eq!(
            set.paths(),
            vec![
                PathBuf::from("lib.rs"),
                PathBuf::from("models/mod.rs"),
                PathBuf::from("v1/mod.rs"),
            ]
        );
    }

    #[test]
    fn write_creates_nested_files() {
        let temp = TempDir::new().unwrap();
        nested_set().write(temp.path()).unwrap();

        let contexts = fs::read_to_string(temp.path().join("app/contexts.rs")).unwrap();
        assert!(contexts.contains("pub struct ShowBottleContext;"));
        assert!(temp.path().join("lib.rs").exists());
        assert!(!temp.path().join("app/contexts.tmp").exists());
    }

    // === bundle tests ===

    #[test]
    fn bundle_inlines_nested_modules() {
        let bundled = nested_set().bundle().unwrap();
        assert!(bundled.contains("pub mod app {"));
        assert!(bundled.contains("pub mod contexts {"));
        assert!(bundled.contains("pub struct ShowBottleContext;"));
        assert!(bundled.contains("App docs."));
        assert!(!bundled.contains("Crate docs."));
        assert!(syn::parse_file(&bundled).is_ok());
    }

    #[test]
    fn bundle_reports_missing_modules() {
        let mut set = ArtifactSet::new();
        set.insert(artifact("lib.rs", quote!(pub mod ghost;))).unwrap();
        let err = set.bundle().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    // === write_atomic tests ===

    #[test]
    fn write_atomic_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.rs");

        write_atomic(&path, "fn main() {}").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fn main() {}");
    }

    #[test]
    fn write_atomic_overwrites_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.rs");

        write_atomic(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
