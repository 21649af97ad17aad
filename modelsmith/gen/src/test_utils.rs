//! Shared test utilities for modelsmith-gen tests.
//!
//! Provides the reference design and a minimal single-model design.

use modelsmith_define::{
    Action, ApiDefinition, ApiVersion, Attribute, Field, MediaType, PrimaryKey, Resource, Response,
    RestMethod, StorageOptions, UserType,
};

/// The cellar reference design.
pub fn cellar_api() -> ApiDefinition {
    modelsmith_definitions::define_cellar_api()
}

/// A design with one stored `Widget` that is also served as a media type.
pub fn widget_api() -> ApiDefinition {
    let widget = UserType::new(
        "Widget",
        Attribute::object(vec![
            Field::new("id", Attribute::integer()),
            Field::new("label", Attribute::string()),
        ])
        .required(["label"]),
    );
    ApiDefinition::new("widgets").version(
        ApiVersion::default_version()
            .user_type(
                widget
                    .clone()
                    .with_storage(StorageOptions::new().table("widgets"))
                    .with_primary_key(PrimaryKey::integer("id")),
            )
            .media_type(MediaType::new(widget, "application/vnd.widget+json"))
            .resource(
                Resource::new("widget")
                    .with_base_path("/widgets")
                    .with_media_type("application/vnd.widget+json")
                    .with_canonical_action("show")
                    .action(
                        Action::new("show")
                            .route(RestMethod::Get, "/:id")
                            .with_params(Attribute::object(vec![Field::new("id", Attribute::integer())]))
                            .response(Response::ok()),
                    ),
            ),
    )
}
