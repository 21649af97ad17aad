//! Pre-generation validation of designs.
//!
//! Running these checks before any renderer keeps design mistakes from
//! surfacing as confusing errors halfway through a generation pass.
//!
//! ## Validation Checks
//!
//! - **Uniqueness**: version strings, type names, media type identifiers,
//!   resource names and action names within a resource
//! - **Roots**: user and media types are objects; collection media types
//!   wrap a media type
//! - **Rules**: numeric bounds are finite, required and non-zero names refer
//!   to declared members
//! - **Storage**: storage types declare a key whose declared member matches
//!   its kind, and relationships point at keyed storage types
//! - **Routing**: canonical actions are declared on their resource
//!
//! ## Examples
//!
//! ```
//! use modelsmith_define::{ApiDefinition, ApiVersion};
//! use modelsmith_gen::validation::validate_design;
//!
//! let api = ApiDefinition::new("cellar").version(ApiVersion::default_version());
//! assert!(validate_design(&api).is_ok());
//! ```

use std::collections::HashSet;

use modelsmith_define::{ApiDefinition, ApiVersion, Attribute, AttributeType, UserType, Validation};
use tracing::warn;

use crate::errors::GeneratorError;

/// Validates a design before code generation.
///
/// ## Errors
///
/// Returns `GeneratorError::MissingDesignInput` naming the first problem
/// found.
pub fn validate_design(api: &ApiDefinition) -> Result<(), GeneratorError> {
    if api.versions.is_empty() {
        return Err(GeneratorError::design(format!("design '{}' declares no versions", api.name)));
    }
    unique(api.versions.iter().map(|v| v.version.as_str()), "version")?;

    let default = api.default_version();
    for version in &api.versions {
        validate_version(version, default)?;
    }
    if let Some(default) = default {
        validate_storage(default)?;
    }
    Ok(())
}

fn validate_version(version: &ApiVersion, default: Option<&ApiVersion>) -> Result<(), GeneratorError> {
    let label = if version.is_default() {
        "the default version".to_string()
    } else {
        format!("version '{}'", version.version)
    };

    unique(version.user_types.iter().map(|u| u.name.as_str()), "user type")?;
    unique(version.media_types.iter().map(|m| m.name()), "media type")?;
    unique(
        version.media_types.iter().map(|m| m.identifier.as_str()),
        "media type identifier",
    )?;
    unique(version.resources.iter().map(|r| r.name.as_str()), "resource")?;

    for user_type in &version.user_types {
        require_object(user_type)?;
        validate_rules(&user_type.name, &user_type.attribute)?;
        if user_type.is_storage() && !version.is_default() {
            warn!(
                user_type = %user_type.name,
                version = %version.version,
                "storage options outside the default version are ignored"
            );
        }
    }

    for media_type in &version.media_types {
        if let Some(element) = media_type.collection_of() {
            let known = version.media_type_by_name(element).is_some()
                || default.is_some_and(|d| d.media_type_by_name(element).is_some());
            if !known {
                return Err(GeneratorError::design(format!(
                    "collection '{}' in {label} wraps '{element}', which is not a media type",
                    media_type.name()
                )));
            }
            continue;
        }
        require_object(&media_type.user_type)?;
        validate_rules(media_type.name(), media_type.attribute())?;
        for view in &media_type.views {
            if let Some(missing) = view
                .fields
                .iter()
                .find(|f| media_type.attribute().field(f).is_none())
            {
                return Err(GeneratorError::design(format!(
                    "view '{}' of '{}' lists unknown member '{missing}'",
                    view.name,
                    media_type.name()
                )));
            }
        }
    }

    for resource in &version.resources {
        unique(resource.actions.iter().map(|a| a.name.as_str()), "action")?;
        if let Some(canonical) = resource.canonical_action.as_deref()
            && resource.find_action(canonical).is_none()
        {
            return Err(GeneratorError::design(format!(
                "resource '{}' in {label} names canonical action '{canonical}', which it does not declare",
                resource.name
            )));
        }
        for action in &resource.actions {
            if let Some(params) = &action.params {
                validate_rules(&format!("{}.{} params", resource.name, action.name), params)?;
            }
            if let Some(payload) = &action.payload {
                require_object(payload)?;
                validate_rules(&payload.name, &payload.attribute)?;
            }
        }
    }
    Ok(())
}

fn validate_storage(default: &ApiVersion) -> Result<(), GeneratorError> {
    for user_type in default.user_types.iter().filter(|u| u.is_storage()) {
        if user_type.primary_keys.is_empty() {
            return Err(GeneratorError::design(format!(
                "storage type '{}' declares no primary key",
                user_type.name
            )));
        }
        for key in &user_type.primary_keys {
            if let Some(field) = user_type.attribute.field(&key.name)
                && field.attribute.kind != key.kind.attribute_type()
            {
                return Err(GeneratorError::design(format!(
                    "key '{}' of '{}' is declared as {} but keyed as {}",
                    key.name, user_type.name, field.attribute.kind, key.kind
                )));
            }
        }
        for (parent, _) in user_type.belongs_to() {
            keyed_storage(default, parent, &user_type.name)?;
        }
        for (relation, related, _) in user_type.many_to_many() {
            keyed_storage(default, related, &user_type.name)?;
            if default
                .user_type_by_name(related)
                .and_then(|u| u.storage.as_ref())
                .is_some_and(|s| s.dynamic_table_name)
            {
                return Err(GeneratorError::design(format!(
                    "many-to-many relation '{relation}' of '{}' targets '{related}', whose table is chosen per call",
                    user_type.name
                )));
            }
            if user_type.primary_keys.len() > 1 {
                return Err(GeneratorError::design(format!(
                    "many-to-many relation '{relation}' of '{}' needs a single-column key",
                    user_type.name
                )));
            }
        }
    }
    Ok(())
}

fn keyed_storage(default: &ApiVersion, name: &str, owner: &str) -> Result<(), GeneratorError> {
    match default.user_type_by_name(name) {
        Some(target) if target.is_storage() && !target.primary_keys.is_empty() => Ok(()),
        _ => Err(GeneratorError::design(format!(
            "'{owner}' is related to '{name}', which is not a keyed storage type"
        ))),
    }
}

fn require_object(user_type: &UserType) -> Result<(), GeneratorError> {
    if user_type.attribute.is_object() {
        Ok(())
    } else {
        Err(GeneratorError::design(format!(
            "type '{}' must have an object root",
            user_type.name
        )))
    }
}

/// Checks the rules of an attribute and everything nested in it.
fn validate_rules(owner: &str, attribute: &Attribute) -> Result<(), GeneratorError> {
    for validation in &attribute.validations {
        match validation {
            Validation::Minimum(bound) | Validation::Maximum(bound) if !bound.is_finite() => {
                return Err(GeneratorError::design(format!(
                    "'{owner}' has a non-finite bound {bound}"
                )));
            }
            Validation::Required(names) | Validation::NonZero(names) => {
                if let Some(missing) = names.iter().find(|n| attribute.field(n).is_none()) {
                    return Err(GeneratorError::design(format!(
                        "'{owner}' constrains undeclared member '{missing}'"
                    )));
                }
            }
            _ => {}
        }
    }

    match &attribute.kind {
        AttributeType::Array { element } => validate_rules(owner, element),
        AttributeType::Object(object) => object
            .fields
            .iter()
            .try_for_each(|f| validate_rules(&format!("{owner}.{}", f.name), &f.attribute)),
        _ => Ok(()),
    }
}

fn unique<'a>(names: impl Iterator<Item = &'a str>, what: &str) -> Result<(), GeneratorError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(GeneratorError::design(format!("{what} '{name}' is declared twice")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsmith_define::{
        Action, Field, MediaType, PrimaryKey, Relationship, Resource, StorageOptions, View,
    };

    fn api(version: ApiVersion) -> ApiDefinition {
        ApiDefinition::new("test").version(version)
    }

    fn keyed(name: &str) -> UserType {
        UserType::new(name, Attribute::object(vec![Field::new("id", Attribute::integer())]))
            .with_storage(StorageOptions::new())
            .with_primary_key(PrimaryKey::integer("id"))
    }

    fn assert_design_error(api: &ApiDefinition, needle: &str) {
        match validate_design(api) {
            Err(GeneratorError::MissingDesignInput(message)) => {
                assert!(message.contains(needle), "'{message}' should mention '{needle}'")
            }
            other => panic!("expected a design error, got {other:?}"),
        }
    }

    // === structure tests ===

    #[test]
    fn designs_need_a_version() {
        assert_design_error(&ApiDefinition::new("empty"), "no versions");
    }

    #[test]
    fn duplicate_versions_are_rejected() {
        let api = ApiDefinition::new("test")
            .version(ApiVersion::new("v1"))
            .version(ApiVersion::new("v1"));
        assert_design_error(&api, "version 'v1'");
    }

    #[test]
    fn duplicate_actions_are_rejected() {
        let version = ApiVersion::default_version().resource(
            Resource::new("bottle")
                .action(Action::new("show"))
                .action(Action::new("show")),
        );
        assert_design_error(&api(version), "action 'show'");
    }

    #[test]
    fn canonical_actions_must_exist() {
        let version = ApiVersion::default_version()
            .resource(Resource::new("bottle").with_canonical_action("show"));
        assert_design_error(&api(version), "canonical action 'show'");
    }

    #[test]
    fn scalar_roots_are_rejected() {
        let version = ApiVersion::default_version().user_type(UserType::new("Count", Attribute::integer()));
        assert_design_error(&api(version), "object root");
    }

    // === rule tests ===

    #[test]
    fn non_finite_bounds_are_rejected() {
        let version = ApiVersion::default_version().user_type(UserType::new(
            "Reading",
            Attribute::object(vec![Field::new("value", Attribute::number().maximum(f64::INFINITY))]),
        ));
        assert_design_error(&api(version), "Reading.value");
    }

    #[test]
    fn required_names_must_be_declared() {
        let version = ApiVersion::default_version().user_type(UserType::new(
            "Bottle",
            Attribute::object(vec![Field::new("name", Attribute::string())]).required(["vintage"]),
        ));
        assert_design_error(&api(version), "'vintage'");
    }

    #[test]
    fn views_must_list_declared_members() {
        let version = ApiVersion::default_version().media_type(
            MediaType::new(
                UserType::new("Bottle", Attribute::object(vec![Field::new("id", Attribute::integer())])),
                "application/vnd.bottle+json",
            )
            .with_view(View::new("tiny", ["id", "color"])),
        );
        assert_design_error(&api(version), "'color'");
    }

    #[test]
    fn collections_must_wrap_media_types() {
        let version = ApiVersion::default_version().media_type(MediaType::new(
            UserType::new("BottleCollection", Attribute::array(Attribute::named("Bottle", vec![]))),
            "application/vnd.bottle+json; type=collection",
        ));
        assert_design_error(&api(version), "not a media type");
    }

    // === storage tests ===

    #[test]
    fn storage_types_need_keys() {
        let version = ApiVersion::default_version().user_type(
            UserType::new("Loose", Attribute::object(vec![])).with_storage(StorageOptions::new()),
        );
        assert_design_error(&api(version), "no primary key");
    }

    #[test]
    fn declared_keys_must_match_their_kind() {
        let version = ApiVersion::default_version().user_type(
            UserType::new("Tag", Attribute::object(vec![Field::new("name", Attribute::integer())]))
                .with_storage(StorageOptions::new())
                .with_primary_key(PrimaryKey::string("name")),
        );
        assert_design_error(&api(version), "key 'name'");
    }

    #[test]
    fn relationships_need_keyed_storage_targets() {
        let version = ApiVersion::default_version()
            .user_type(keyed("Comment").with_relationship(Relationship::belongs_to("Post", "post_id")));
        assert_design_error(&api(version), "'Post'");

        let version = ApiVersion::default_version()
            .user_type(keyed("Post"))
            .user_type(keyed("Comment").with_relationship(Relationship::belongs_to("Post", "post_id")));
        assert!(validate_design(&api(version)).is_ok());
    }

    #[test]
    fn many_to_many_targets_need_a_fixed_table() {
        let tag = UserType::new("Tag", Attribute::object(vec![]))
            .with_storage(StorageOptions::new().dynamic_table())
            .with_primary_key(PrimaryKey::string("name"));
        let version = ApiVersion::default_version()
            .user_type(tag)
            .user_type(keyed("Post").with_relationship(Relationship::many_to_many("Tag", "Tag", "posts_tags")));
        assert_design_error(&api(version), "chosen per call");
    }

    #[test]
    #[tracing_test::traced_test]
    fn storage_outside_the_default_version_only_warns() {
        let api = ApiDefinition::new("test").version(ApiVersion::new("v1").user_type(keyed("Widget")));
        assert!(validate_design(&api).is_ok());
        assert!(logs_contain("storage options outside the default version are ignored"));
    }
}
