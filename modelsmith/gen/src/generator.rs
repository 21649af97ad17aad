//! The generation driver.
//!
//! [`Generator`] turns a validated design into an [`ArtifactSet`]. It first
//! plans one [`Job`] per output file, then renders the jobs (on the rayon
//! pool when `parallel` is set), and finally collects them in key order so
//! the output does not depend on scheduling.
//!
//! ## Artifacts
//!
//! | Job            | File                          | Renderer                         |
//! |----------------|-------------------------------|----------------------------------|
//! | `Lib`          | `lib.rs`                      | module declarations, crate docs  |
//! | `VersionIndex` | `{version}/mod.rs`            | [`ModuleDocBuilder`]             |
//! | `Contexts`     | `{version}/contexts.rs`       | [`render_contexts`]              |
//! | `MediaTypes`   | `{version}/media_types.rs`    | [`render_media_types`]           |
//! | `UserTypes`    | `{version}/user_types.rs`     | [`render_user_types`]            |
//! | `Hrefs`        | `{version}/hrefs.rs`          | [`render_hrefs`]                 |
//! | `ModelsIndex`  | `{models}/mod.rs`             | [`render_models_index`]          |
//! | `Model`        | `{models}/{type}.rs`          | [`render_model`]                 |
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::{ApiDefinition, ApiVersion};
//! use modelsmith_gen::config::GeneratorConfig;
//! use modelsmith_gen::generator::Generator;
//!
//! let api = ApiDefinition::new("cellar").version(ApiVersion::default_version());
//! let artifacts = Generator::new(GeneratorConfig::default()).generate(&api).unwrap();
//! assert!(artifacts.by_path("lib.rs").is_some());
//! assert!(artifacts.by_path("app/contexts.rs").is_some());
//! ```

use std::sync::Mutex;

use modelsmith_define::{ApiDefinition, ApiVersion, UserType};
use proc_macro2::TokenStream;
use quote::quote;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::codegen::{
    ModuleDocBuilder, TypeScope, crate_docs, render_contexts, render_hrefs, render_media_types,
    render_model, render_models_index, render_user_types,
};
use crate::codegen::model::{model_module, storage_types};
use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;
use crate::naming::{ident, version_module};
use crate::output::{Artifact, ArtifactKey, ArtifactSet};
use crate::validation::validate_design;

/// One output file to render.
#[derive(Debug, Clone, Copy)]
pub enum Job<'a> {
    Lib,
    VersionIndex(&'a ApiVersion),
    Contexts(&'a ApiVersion),
    MediaTypes(&'a ApiVersion),
    UserTypes(&'a ApiVersion),
    Hrefs(&'a ApiVersion),
    ModelsIndex,
    Model(&'a UserType),
}

/// Drives a generation pass.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Module name of a version.
    pub fn version_module(&self, version: &ApiVersion) -> String {
        version_module(&version.version, &self.config.app_module)
    }

    /// Lists the jobs of a pass in declaration order.
    pub fn plan<'a>(&self, api: &'a ApiDefinition) -> Vec<Job<'a>> {
        let mut jobs = vec![Job::Lib];
        for version in &api.versions {
            jobs.extend([
                Job::VersionIndex(version),
                Job::Contexts(version),
                Job::MediaTypes(version),
                Job::UserTypes(version),
                Job::Hrefs(version),
            ]);
        }
        if let Some(default) = api.default_version()
            && storage_types(default).next().is_some()
        {
            jobs.push(Job::ModelsIndex);
            jobs.extend(storage_types(default).map(Job::Model));
        }
        jobs
    }

    /// The artifact key a job renders to.
    pub fn key(&self, job: &Job<'_>) -> ArtifactKey {
        let in_version = |version: &ApiVersion, file: &str| {
            ArtifactKey::new(
                version.version.clone(),
                format!("{}/{file}", self.version_module(version)),
            )
        };
        let models = &self.config.models_module;
        match job {
            Job::Lib => ArtifactKey::unversioned("lib.rs"),
            Job::VersionIndex(version) => in_version(version, "mod.rs"),
            Job::Contexts(version) => in_version(version, "contexts.rs"),
            Job::MediaTypes(version) => in_version(version, "media_types.rs"),
            Job::UserTypes(version) => in_version(version, "user_types.rs"),
            Job::Hrefs(version) => in_version(version, "hrefs.rs"),
            Job::ModelsIndex => ArtifactKey::unversioned(format!("{models}/mod.rs")),
            Job::Model(user_type) => {
                ArtifactKey::unversioned(format!("{models}/{}.rs", model_module(&user_type.name)))
            }
        }
    }

    /// Validates the design and renders every artifact.
    ///
    /// ## Errors
    ///
    /// Returns the first design, rendering or validation error. No partial
    /// set is returned.
    pub fn generate(&self, api: &ApiDefinition) -> Result<ArtifactSet, GeneratorError> {
        validate_design(api)?;
        let jobs = self.plan(api);
        info!(design = %api.name, jobs = jobs.len(), parallel = self.config.parallel, "rendering artifacts");

        let mut rendered = if self.config.parallel {
            let collected = Mutex::new(Vec::with_capacity(jobs.len()));
            jobs.par_iter().try_for_each(|job| {
                let artifact = self.render(api, job)?;
                collected
                    .lock()
                    .map_err(|_| GeneratorError::CodeGenError("artifact collector poisoned".to_string()))?
                    .push(artifact);
                Ok::<_, GeneratorError>(())
            })?;
            collected
                .into_inner()
                .map_err(|_| GeneratorError::CodeGenError("artifact collector poisoned".to_string()))?
        } else {
            jobs.iter()
                .map(|job| self.render(api, job))
                .collect::<Result<Vec<_>, _>>()?
        };
        rendered.sort_by(|a, b| a.key.cmp(&b.key));

        let mut set = ArtifactSet::new();
        for artifact in rendered {
            set.insert(artifact)?;
        }
        info!(artifacts = set.len(), "rendered artifacts");
        Ok(set)
    }

    /// Generates, then writes the artifacts to the configured output
    /// directory or prints them.
    ///
    /// ## Errors
    ///
    /// See [`Generator::generate`] and [`ArtifactSet::write`].
    pub fn generate_and_write(&self, api: &ApiDefinition, dry_run: bool) -> Result<ArtifactSet, GeneratorError> {
        let set = self.generate(api)?;
        if dry_run {
            set.print();
        } else {
            set.write(&self.config.output_dir)?;
            info!(output = %self.config.output_dir.display(), files = set.len(), "wrote artifacts");
        }
        Ok(set)
    }

    fn render(&self, api: &ApiDefinition, job: &Job<'_>) -> Result<Artifact, GeneratorError> {
        let key = self.key(job);
        let tokens = self.render_tokens(api, job)?;
        let artifact = Artifact::from_tokens(key, &tokens)?;
        debug!(file = %artifact.key.file, bytes = artifact.content.len(), "rendered artifact");
        Ok(artifact)
    }

    fn scope<'a>(&self, api: &'a ApiDefinition, version: &'a ApiVersion) -> TypeScope<'a> {
        let default = api.default_version().filter(|_| !version.is_default());
        TypeScope::new(version, default, &self.config.app_module)
    }

    fn render_tokens(&self, api: &ApiDefinition, job: &Job<'_>) -> Result<TokenStream, GeneratorError> {
        match *job {
            Job::Lib => Ok(self.render_lib(api)),
            Job::VersionIndex(version) => {
                let has_user_types = !self.scope(api, version).rendered_user_types().is_empty();
                Ok(render_version_index(api, version, has_user_types))
            }
            Job::Contexts(version) => render_contexts(&self.scope(api, version)),
            Job::MediaTypes(version) => render_media_types(&self.scope(api, version)),
            Job::UserTypes(version) => render_user_types(&self.scope(api, version)),
            Job::Hrefs(version) => render_hrefs(version),
            Job::ModelsIndex => {
                let default = api
                    .default_version()
                    .ok_or_else(|| GeneratorError::design("models need a default version"))?;
                Ok(render_models_index(default))
            }
            Job::Model(user_type) => {
                let default = api
                    .default_version()
                    .ok_or_else(|| GeneratorError::design("models need a default version"))?;
                render_model(user_type, default, &self.config)
            }
        }
    }

    fn render_lib(&self, api: &ApiDefinition) -> TokenStream {
        let models: Vec<String> = api
            .default_version()
            .map(|d| storage_types(d).map(|u| u.name.clone()).collect())
            .unwrap_or_default();
        let docs = crate_docs(api, &models);
        let versions = api.versions.iter().map(|v| ident(&self.version_module(v)));
        let models_module = (!models.is_empty()).then(|| {
            let module = ident(&self.config.models_module);
            quote!(pub mod #module;)
        });
        quote! {
            #docs

            #(pub mod #versions;)*
            #models_module
        }
    }
}

fn render_version_index(api: &ApiDefinition, version: &ApiVersion, has_user_types: bool) -> TokenStream {
    let docs = ModuleDocBuilder::new(api, version).build();
    // An empty glob re-export trips `unused_imports` in the generated crate.
    let user_types = has_user_types.then(|| quote!(pub use user_types::*;));
    quote! {
        #docs

        pub mod contexts;
        pub mod hrefs;
        pub mod media_types;
        pub mod user_types;

        pub use contexts::*;
        pub use media_types::*;
        #user_types
    }
}
