//! Module documentation for generated version modules.
//!
//! [`ModuleDocBuilder`] renders the `//!` header of each version's `mod.rs`:
//! an introduction, the routes grouped by resource, the media types it
//! serves, and a short usage example built from the first action.

use std::collections::BTreeMap;

use modelsmith_define::{ApiDefinition, ApiVersion};
use proc_macro2::TokenStream;
use quote::quote;

use super::context::{context_name, full_paths};

/// Builds module-level documentation for one API version.
///
/// ## Examples
///
/// ```
/// use modelsmith_define::{ApiDefinition, ApiVersion};
/// use modelsmith_gen::codegen::ModuleDocBuilder;
///
/// let api = ApiDefinition::new("cellar").version(ApiVersion::default_version());
/// let version = api.default_version().unwrap();
/// let docs = ModuleDocBuilder::new(&api, version).build();
/// assert!(docs.to_string().contains("cellar"));
/// ```
pub struct ModuleDocBuilder<'a> {
    api: &'a ApiDefinition,
    version: &'a ApiVersion,
}

impl<'a> ModuleDocBuilder<'a> {
    pub fn new(api: &'a ApiDefinition, version: &'a ApiVersion) -> Self {
        Self { api, version }
    }

    /// Builds the `#![doc = ...]` attributes of the module.
    pub fn build(&self) -> TokenStream {
        let intro = self.intro_paragraph();
        let routes = self.routes_section();
        let media = self.media_section();
        let example = self.example_section();

        quote! {
            #![doc = #intro]
            //!
            #![doc = #routes]
            //!
            #![doc = #media]
            //!
            #![doc = #example]
        }
    }

    fn intro_paragraph(&self) -> String {
        let version = if self.version.is_default() {
            "the unversioned surface".to_string()
        } else {
            format!("version `{}`", self.version.version)
        };
        let mut intro = format!(" Request contexts and media types of {} for {}.", version, self.api.name);
        if !self.api.description.is_empty() {
            intro.push_str(&format!("\n\n {}", self.api.description));
        }
        intro
    }

    /// Maps each resource to `(verb, path, context)` lines.
    fn categorize_routes(&self) -> BTreeMap<String, Vec<(String, String, String)>> {
        let mut routes: BTreeMap<String, Vec<(String, String, String)>> = BTreeMap::new();
        for resource in &self.version.resources {
            for action in &resource.actions {
                let context = context_name(&resource.name, &action.name);
                for (route, path) in action.routes.iter().zip(full_paths(resource, action)) {
                    routes.entry(resource.name.clone()).or_default().push((
                        route.verb.to_string().to_uppercase(),
                        path,
                        context.clone(),
                    ));
                }
            }
        }
        routes
    }

    fn routes_section(&self) -> String {
        let routes = self.categorize_routes();
        if routes.is_empty() {
            return " ## Routes\n\n No routes defined.".to_string();
        }

        let mut lines = vec![" ## Routes".to_string(), String::new()];
        for (resource, entries) in &routes {
            lines.push(format!(" **{resource}**:"));
            for (verb, path, context) in entries {
                lines.push(format!(" - `{verb} {path}` builds [`{context}`]"));
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }

    fn media_section(&self) -> String {
        if self.version.media_types.is_empty() {
            return " ## Media Types\n\n None.".to_string();
        }
        let mut lines = vec![" ## Media Types".to_string(), String::new()];
        for media_type in &self.version.media_types {
            let views: Vec<&str> = media_type.views.iter().map(|v| v.name.as_str()).collect();
            if views.is_empty() {
                lines.push(format!(" - `{}` (`{}`)", media_type.name(), media_type.identifier));
            } else {
                lines.push(format!(
                    " - `{}` (`{}`), views: {}",
                    media_type.name(),
                    media_type.identifier,
                    views.join(", ")
                ));
            }
        }
        lines.join("\n")
    }

    fn example_section(&self) -> String {
        let first = self
            .version
            .resources
            .iter()
            .flat_map(|r| r.actions.iter().map(move |a| (r, a)))
            .next();
        let Some((resource, action)) = first else {
            return " ## Example\n\n No actions available for example.".to_string();
        };
        let context = context_name(&resource.name, &action.name);
        format!(
            r#" ## Example

 ```ignore
 let request = modelsmith::MemoryRequest::new().boxed();
 match {context}::new(request) {{
     Ok(context) => {{ /* handle the action */ }}
     Err(modelsmith::ContextError::Invalid {{ errors, .. }}) => eprintln!("{{errors}}"),
     Err(other) => eprintln!("{{other}}"),
 }}
 ```"#
        )
    }
}

/// Crate-level documentation of the generated `lib.rs`.
pub fn crate_docs(api: &ApiDefinition, models: &[String]) -> TokenStream {
    let intro = if api.description.is_empty() {
        format!(" Generated server surface for {}.", api.name)
    } else {
        format!(" Generated server surface for {}.\n\n {}", api.name, api.description)
    };
    let versions: Vec<String> = api
        .versions
        .iter()
        .map(|v| {
            if v.is_default() {
                " - the unversioned surface".to_string()
            } else {
                format!(" - `{}`", v.version)
            }
        })
        .collect();
    let versions = format!(" ## Versions\n\n{}", versions.join("\n"));
    let models = if models.is_empty() {
        " ## Models\n\n None.".to_string()
    } else {
        let lines: Vec<String> = models.iter().map(|m| format!(" - `{m}`")).collect();
        format!(" ## Models\n\n{}", lines.join("\n"))
    };

    quote! {
        #![doc = #intro]
        //!
        #![doc = #versions]
        //!
        #![doc = #models]
    }
}
