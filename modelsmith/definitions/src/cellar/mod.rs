//! The cellar design.
//!
//! A wine cellar service: accounts own bottles, a small blog tags its posts,
//! and widgets round out the storage options. Stock and tasting notes live in
//! tables chosen per call. Version `v1` adds a read-only surface that reuses
//! the unversioned media types.

pub mod types;

use modelsmith_define::{
    Action, ApiDefinition, ApiVersion, Attribute, Field, Resource, Response, RestMethod,
};
use serde_json::json;

use types::*;

/// Defines the cellar design.
///
/// ## Examples
///
/// ```
/// use modelsmith_definitions::cellar::define_cellar_api;
///
/// let api = define_cellar_api();
/// let default = api.default_version().unwrap();
/// assert!(default.user_type_by_name("Bottle").is_some());
/// assert!(default.media_type_by_identifier("application/vnd.bottle+json").is_some());
/// ```
pub fn define_cellar_api() -> ApiDefinition {
    ApiDefinition::new("cellar")
        .with_description("The cellar service keeps track of wine bottles and the accounts that own them.")
        .version(default_version())
        .version(v1())
}

fn default_version() -> ApiVersion {
    ApiVersion::default_version()
        .user_type(account())
        .user_type(bottle())
        .user_type(widget())
        .user_type(post())
        .user_type(comment())
        .user_type(tag())
        .user_type(stock())
        .user_type(note())
        .media_type(account_media())
        .media_type(bottle_media())
        .media_type(bottle_collection())
        .media_type(widget_media())
        .resource(account_resource())
        .resource(bottle_resource())
        .resource(widget_resource())
        .resource(health_resource())
}

fn account_id() -> Field {
    Field::new("accountID", Attribute::integer().with_description("Account ID"))
}

fn bottle_id() -> Field {
    Field::new("bottleID", Attribute::integer().with_description("Bottle ID"))
}

fn account_resource() -> Resource {
    Resource::new("account")
        .with_base_path("/accounts")
        .with_media_type(ACCOUNT_MEDIA)
        .with_canonical_action("show")
        .action(
            Action::new("show")
                .with_description("Retrieve account with given id.")
                .route(RestMethod::Get, "/:accountID")
                .with_params(Attribute::object(vec![account_id()]).required(["accountID"]))
                .response(Response::ok())
                .response(Response::not_found()),
        )
        .action(
            Action::new("create")
                .with_description("Create new account")
                .route(RestMethod::Post, "")
                .with_payload(create_account_payload())
                .response(Response::created())
                .response(Response::bad_request()),
        )
        .action(
            Action::new("delete")
                .route(RestMethod::Delete, "/:accountID")
                .with_params(Attribute::object(vec![account_id()]).required(["accountID"]))
                .response(Response::no_content())
                .response(Response::not_found()),
        )
}

fn bottle_resource() -> Resource {
    Resource::new("bottle")
        .with_base_path("/accounts/:accountID/bottles")
        .with_media_type(BOTTLE_MEDIA)
        .with_canonical_action("show")
        .with_headers(
            Attribute::object(vec![Field::new("X-Account", Attribute::string())]).required(["X-Account"]),
        )
        .response(Response::bad_request())
        .action(
            Action::new("list")
                .with_description("List all bottles in account optionally filtering by year")
                .route(RestMethod::Get, "")
                .with_params(
                    Attribute::object(vec![
                        account_id(),
                        Field::new(
                            "count",
                            Attribute::integer().minimum(1.0).with_description("Page size"),
                        ),
                        Field::new(
                            "years",
                            Attribute::array(Attribute::integer()).with_description("Filter by years"),
                        ),
                        Field::new(
                            "sort",
                            Attribute::string().one_of(vec![json!("name"), json!("vintage")]),
                        ),
                    ])
                    .required(["accountID", "count"]),
                )
                .response(Response::ok().with_media_type(BOTTLE_COLLECTION_MEDIA)),
        )
        .action(
            Action::new("show")
                .with_description("Retrieve bottle with given id")
                .route(RestMethod::Get, "/:bottleID")
                .with_params(
                    Attribute::object(vec![account_id(), bottle_id()]).required(["accountID", "bottleID"]),
                )
                .response(Response::ok())
                .response(Response::not_found()),
        )
        .action(
            Action::new("create")
                .with_description("Record new bottle")
                .route(RestMethod::Post, "")
                .with_params(Attribute::object(vec![account_id()]).required(["accountID"]))
                .with_payload(create_bottle_payload())
                .response(Response::created()),
        )
        .action(
            Action::new("rate")
                .route(RestMethod::Put, "/:bottleID/actions/rate")
                .with_params(
                    Attribute::object(vec![account_id(), bottle_id()]).required(["accountID", "bottleID"]),
                )
                .with_payload(rate_bottle_payload())
                .response(Response::no_content())
                .response(Response::not_found()),
        )
}

fn widget_resource() -> Resource {
    Resource::new("widget")
        .with_base_path("/widgets")
        .with_media_type(WIDGET_MEDIA)
        .with_canonical_action("show")
        .action(
            Action::new("show")
                .route(RestMethod::Get, "/:id")
                .with_params(
                    Attribute::object(vec![Field::new("id", Attribute::integer())])
                        .required(["id"])
                        .non_zero(["id"]),
                )
                .response(Response::ok())
                .response(Response::not_found()),
        )
}

fn health_resource() -> Resource {
    Resource::new("health").action(
        Action::new("check")
            .with_description("Reports service health")
            .route(RestMethod::Get, "//health")
            .response(Response::ok().with_media_type("text/plain")),
    )
}

fn v1() -> ApiVersion {
    ApiVersion::new("v1")
        .media_type(vintage_media())
        .resource(
            Resource::new("bottle")
                .with_base_path("/v1/bottles")
                .with_media_type(BOTTLE_MEDIA)
                .with_canonical_action("show")
                .action(
                    Action::new("show")
                        .route(RestMethod::Get, "/:bottleID")
                        .with_params(Attribute::object(vec![bottle_id()]).required(["bottleID"]))
                        .response(Response::ok())
                        .response(Response::not_found()),
                ),
        )
        .resource(
            Resource::new("vintage")
                .with_base_path("/v1/vintages")
                .with_media_type("application/vnd.vintage+json")
                .action(
                    Action::new("show")
                        .route(RestMethod::Get, "/:year")
                        .with_params(
                            Attribute::object(vec![Field::new("year", Attribute::integer().minimum(1900.0))])
                                .required(["year"]),
                        )
                        .response(Response::ok()),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_a_default_and_a_v1_version() {
        let api = define_cellar_api();
        assert_eq!(api.versions.len(), 2);
        assert!(api.versions[0].is_default());
        assert_eq!(api.versions[1].version, "v1");
    }

    #[test]
    fn storage_types_live_in_the_default_version() {
        let api = define_cellar_api();
        let default = api.default_version().unwrap();
        let storage: Vec<&str> = default
            .user_types
            .iter()
            .filter(|u| u.is_storage())
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(
            storage,
            ["Account", "Bottle", "Widget", "Post", "Comment", "Tag", "Stock", "Note"]
        );
        assert!(api.versions[1].user_types.is_empty());
    }

    #[test]
    fn relationships_are_declared() {
        let api = define_cellar_api();
        let default = api.default_version().unwrap();
        let comment = default.user_type_by_name("Comment").unwrap();
        assert_eq!(comment.belongs_to().collect::<Vec<_>>(), [("Post", "post_id")]);
        let post = default.user_type_by_name("Post").unwrap();
        assert_eq!(post.many_to_many().collect::<Vec<_>>(), [("Tag", "Tag", "posts_tags")]);
    }

    #[test]
    fn per_call_tables_are_declared() {
        let api = define_cellar_api();
        let default = api.default_version().unwrap();
        let stock = default.user_type_by_name("Stock").unwrap();
        assert_eq!(stock.primary_keys.len(), 2);
        let note = default.user_type_by_name("Note").unwrap();
        for user_type in [stock, note] {
            let storage = user_type.storage.as_ref().unwrap();
            assert!(storage.dynamic_table_name && storage.cached, "{}", user_type.name);
        }
    }

    #[test]
    fn canonical_actions_are_declared() {
        let api = define_cellar_api();
        for version in &api.versions {
            for resource in &version.resources {
                if let Some(canonical) = &resource.canonical_action {
                    assert!(resource.find_action(canonical).is_some(), "{}", resource.name);
                }
            }
        }
    }

    #[test]
    fn bottle_collection_wraps_bottles() {
        let api = define_cellar_api();
        let default = api.default_version().unwrap();
        let collection = default.media_type_by_identifier(BOTTLE_COLLECTION_MEDIA).unwrap();
        assert_eq!(collection.collection_of(), Some("Bottle"));
    }
}
