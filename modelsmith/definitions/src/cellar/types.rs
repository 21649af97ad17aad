//! User types, payloads and media types of the cellar design.

use modelsmith_define::{
    Attribute, Field, MediaType, PrimaryKey, Relationship, StorageOptions, UserType, View,
};
use serde_json::json;

pub const ACCOUNT_MEDIA: &str = "application/vnd.account+json";
pub const BOTTLE_MEDIA: &str = "application/vnd.bottle+json";
pub const BOTTLE_COLLECTION_MEDIA: &str = "application/vnd.bottle+json; type=collection";
pub const WIDGET_MEDIA: &str = "application/vnd.widget+json";

fn color() -> Attribute {
    Attribute::string()
        .with_description("Wine color")
        .one_of(vec![
            json!("red"),
            json!("white"),
            json!("rose"),
            json!("yellow"),
            json!("sparkling"),
        ])
}

fn account_fields() -> Vec<Field> {
    vec![
        Field::new("id", Attribute::integer().with_description("ID of account")),
        Field::new("href", Attribute::string().with_description("API href of account")),
        Field::new(
            "name",
            Attribute::string().with_description("Name of account").min_length(1),
        ),
        Field::new("created_by", Attribute::string().with_description("Email of account owner")),
    ]
}

/// Stored account, cached and carrying a role.
pub fn account() -> UserType {
    let mut fields = account_fields();
    fields.push(Field::new(
        "role",
        Attribute::string().one_of(vec![json!("owner"), json!("member")]),
    ));
    UserType::new("Account", Attribute::object(fields).required(["name", "role"]))
        .with_description("A tenant account")
        .with_storage(StorageOptions::new().cached().table("accounts").role_capable())
        .with_primary_key(PrimaryKey::integer("id"))
}

pub fn account_media() -> MediaType {
    MediaType::new(
        UserType::new("Account", Attribute::object(account_fields()).required(["id", "href", "name"]))
            .with_description("A tenant account"),
        ACCOUNT_MEDIA,
    )
    .with_view(View::new("default", ["id", "href", "name", "created_by"]))
    .with_view(View::new("tiny", ["id", "href", "name"]))
}

fn bottle_fields() -> Vec<Field> {
    vec![
        Field::new("id", Attribute::integer().with_description("ID of bottle")),
        Field::new("href", Attribute::string().with_description("API href of bottle")),
        Field::new("name", Attribute::string().min_length(2)),
        Field::new("vintage", Attribute::integer().minimum(1900.0).maximum(2100.0)),
        Field::new("color", color()),
        Field::new("sweetness", Attribute::integer().minimum(1.0).maximum(5.0)),
        Field::new("rating", Attribute::integer().minimum(1.0).maximum(5.0)),
    ]
}

/// Stored bottle, owned by an account.
pub fn bottle() -> UserType {
    let mut fields = bottle_fields();
    fields.retain(|f| f.name != "href");
    UserType::new("Bottle", Attribute::object(fields).required(["name", "vintage"]))
        .with_description("A wine bottle")
        .with_storage(StorageOptions::new().sql_tag("index"))
        .with_primary_key(PrimaryKey::integer("id"))
        .with_relationship(Relationship::belongs_to("Account", "account_id"))
}

pub fn bottle_media() -> MediaType {
    let mut fields = bottle_fields();
    fields.push(Field::new("account", Attribute::named("Account", vec![])));
    MediaType::new(
        UserType::new("Bottle", Attribute::object(fields).required(["id", "href", "name"]))
            .with_description("A wine bottle"),
        BOTTLE_MEDIA,
    )
    .with_view(View::new("default", ["id", "href", "name", "vintage", "color", "account"]))
    .with_view(View::new("tiny", ["id", "href", "name"]))
    .with_view(View::new(
        "full",
        ["id", "href", "name", "vintage", "color", "sweetness", "rating", "account"],
    ))
}

pub fn bottle_collection() -> MediaType {
    MediaType::new(
        UserType::new("BottleCollection", Attribute::array(Attribute::named("Bottle", vec![]))),
        BOTTLE_COLLECTION_MEDIA,
    )
}

/// Stored widget with a fixed table and free-form specs.
pub fn widget() -> UserType {
    UserType::new(
        "Widget",
        Attribute::object(vec![
            Field::new("id", Attribute::integer()),
            Field::new("label", Attribute::string()),
            Field::new("specs", Attribute::any()),
        ])
        .required(["label"]),
    )
    .with_storage(StorageOptions::new().table("widgets"))
    .with_primary_key(PrimaryKey::integer("id"))
}

pub fn widget_media() -> MediaType {
    MediaType::new(
        UserType::new(
            "Widget",
            Attribute::object(vec![
                Field::new("id", Attribute::integer()),
                Field::new("label", Attribute::string()),
            ])
            .required(["id", "label"]),
        ),
        WIDGET_MEDIA,
    )
}

/// Cached post, tagged through the `posts_tags` join table.
pub fn post() -> UserType {
    UserType::new(
        "Post",
        Attribute::object(vec![
            Field::new("id", Attribute::integer()),
            Field::new("title", Attribute::string().max_length(200)),
            Field::new("body", Attribute::string()),
        ])
        .required(["title"]),
    )
    .with_storage(StorageOptions::new().cached())
    .with_primary_key(PrimaryKey::integer("id"))
    .with_relationship(Relationship::many_to_many("Tag", "Tag", "posts_tags"))
}

pub fn comment() -> UserType {
    UserType::new(
        "Comment",
        Attribute::object(vec![
            Field::new("id", Attribute::integer()),
            Field::new("body", Attribute::string()),
            Field::new("author", Attribute::string()),
        ])
        .required(["body"]),
    )
    .with_storage(StorageOptions::new())
    .with_primary_key(PrimaryKey::integer("id"))
    .with_relationship(Relationship::belongs_to("Post", "post_id"))
}

/// Tags are keyed by their name.
pub fn tag() -> UserType {
    UserType::new(
        "Tag",
        Attribute::object(vec![Field::new("name", Attribute::string().min_length(1))]).required(["name"]),
    )
    .with_storage(StorageOptions::new())
    .with_primary_key(PrimaryKey::string("name"))
}

/// Bottles on hand per cellar bin. Each site keeps its own stock table.
pub fn stock() -> UserType {
    UserType::new(
        "Stock",
        Attribute::object(vec![
            Field::new("cellar_id", Attribute::integer()),
            Field::new("bin", Attribute::string().min_length(1)),
            Field::new("quantity", Attribute::integer().minimum(0.0)),
            Field::new("note", Attribute::string()),
        ])
        .required(["quantity"]),
    )
    .with_description("Bottles on hand in one bin")
    .with_storage(StorageOptions::new().cached().dynamic_table())
    .with_primary_key(PrimaryKey::integer("cellar_id"))
    .with_primary_key(PrimaryKey::string("bin"))
    .with_relationship(Relationship::belongs_to("Bottle", "bottle_id"))
}

/// Tasting notes, one table per season, tagged through `notes_tags`.
pub fn note() -> UserType {
    UserType::new(
        "Note",
        Attribute::object(vec![
            Field::new("id", Attribute::integer()),
            Field::new("text", Attribute::string().min_length(1)),
            Field::new("author", Attribute::string()),
        ])
        .required(["text"]),
    )
    .with_description("A tasting note")
    .with_storage(StorageOptions::new().cached().dynamic_table())
    .with_primary_key(PrimaryKey::integer("id"))
    .with_relationship(Relationship::belongs_to("Bottle", "bottle_id"))
    .with_relationship(Relationship::many_to_many("Tag", "Tag", "notes_tags"))
}

pub fn create_account_payload() -> UserType {
    UserType::new(
        "CreateAccountPayload",
        Attribute::object(vec![Field::new("name", Attribute::string().min_length(1))]).required(["name"]),
    )
}

pub fn create_bottle_payload() -> UserType {
    UserType::new(
        "CreateBottlePayload",
        Attribute::object(vec![
            Field::new("name", Attribute::string().min_length(2)),
            Field::new("vintage", Attribute::integer().minimum(1900.0)),
            Field::new("color", color()),
            Field::new("sweetness", Attribute::integer().minimum(1.0).maximum(5.0)),
        ])
        .required(["name", "vintage", "color"]),
    )
}

pub fn rate_bottle_payload() -> UserType {
    UserType::new(
        "RateBottlePayload",
        Attribute::object(vec![Field::new(
            "rating",
            Attribute::integer().minimum(1.0).maximum(5.0),
        )])
        .required(["rating"]),
    )
}

/// Media type served only by version `v1`.
pub fn vintage_media() -> MediaType {
    MediaType::new(
        UserType::new(
            "Vintage",
            Attribute::object(vec![
                Field::new("year", Attribute::integer()),
                Field::new("bottles", Attribute::integer()),
            ])
            .required(["year"]),
        ),
        "application/vnd.vintage+json",
    )
}
