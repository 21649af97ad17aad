//! Resource types: user types, media types and their storage options.
//!
//! - [`UserType`] - A named root attribute with optional storage options
//! - [`MediaType`] - A user type rendered in responses, with named views
//! - [`StorageOptions`] - Table naming, caching and role capability
//! - [`PrimaryKey`] - Ordered row-identity fields
//! - [`Relationship`] - BelongsTo and ManyToMany links between storage types

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::attribute::{Attribute, AttributeType};

/// Storage options for a user type that is backed by a table.
///
/// `dynamic_table_name` means the table is supplied per call at runtime.
/// It does not conflict with a fixed `table_name`; when both are set the
/// fixed name is still exported as the type's default table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Wraps the data-access object in a read-through cache.
    pub cached: bool,
    /// Fixed table name. Empty means derived from the type name.
    pub table_name: String,
    pub dynamic_table_name: bool,
    /// Skips the model to media type conversion.
    pub no_media: bool,
    /// The model exposes a `role` accessor.
    pub role_capable: bool,
    /// Free-form column tag emitted alongside the model.
    pub sql_tag: String,
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(mut self) -> Self {
        self.cached = true;
        self
    }

    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    pub fn dynamic_table(mut self) -> Self {
        self.dynamic_table_name = true;
        self
    }

    pub fn no_media(mut self) -> Self {
        self.no_media = true;
        self
    }

    pub fn role_capable(mut self) -> Self {
        self.role_capable = true;
        self
    }

    pub fn sql_tag(mut self, tag: impl Into<String>) -> Self {
        self.sql_tag = tag.into();
        self
    }
}

/// Kind of a primary-key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum KeyKind {
    Integer,
    String,
}

impl KeyKind {
    /// The attribute kind a key column of this kind is declared with.
    pub fn attribute_type(self) -> AttributeType {
        match self {
            Self::Integer => AttributeType::Integer,
            Self::String => AttributeType::String,
        }
    }
}

/// One row-identity column. Order within a type's key list is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: String,
    pub kind: KeyKind,
}

impl PrimaryKey {
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: KeyKind::Integer,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: KeyKind::String,
        }
    }
}

/// A link from one storage type to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relationship {
    /// Many-to-one through a foreign-key column on the child.
    BelongsTo {
        parent: String,
        foreign_key: String,
    },
    /// Many-to-many through an association table.
    ManyToMany {
        /// Singular relation name, e.g. `"Tag"`.
        relation: String,
        related_type: String,
        join_table: String,
    },
}

impl Relationship {
    pub fn belongs_to(parent: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::BelongsTo {
            parent: parent.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn many_to_many(
        relation: impl Into<String>,
        related_type: impl Into<String>,
        join_table: impl Into<String>,
    ) -> Self {
        Self::ManyToMany {
            relation: relation.into(),
            related_type: related_type.into(),
            join_table: join_table.into(),
        }
    }
}

/// A named data type.
///
/// ## Examples
///
/// ```
/// use modelsmith_define::{Attribute, Field, PrimaryKey, Relationship, StorageOptions, UserType};
///
/// let comment = UserType::new(
///     "Comment",
///     Attribute::object(vec![
///         Field::new("id", Attribute::integer()),
///         Field::new("body", Attribute::string()),
///     ])
///     .required(["body"]),
/// )
/// .with_storage(StorageOptions::new())
/// .with_primary_key(PrimaryKey::integer("id"))
/// .with_relationship(Relationship::belongs_to("Post", "post_id"));
///
/// assert!(comment.is_storage());
/// assert_eq!(comment.belongs_to().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserType {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub attribute: Attribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageOptions>,
    #[serde(default)]
    pub primary_keys: Vec<PrimaryKey>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl UserType {
    pub fn new(name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            attribute,
            storage: None,
            primary_keys: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageOptions) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_primary_key(mut self, key: PrimaryKey) -> Self {
        self.primary_keys.push(key);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Returns `true` when the type carries storage options.
    pub fn is_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Iterates `(parent, foreign_key)` pairs of BelongsTo relationships.
    pub fn belongs_to(&self) -> impl Iterator<Item = (&str, &str)> {
        self.relationships.iter().filter_map(|r| match r {
            Relationship::BelongsTo {
                parent,
                foreign_key,
            } => Some((parent.as_str(), foreign_key.as_str())),
            _ => None,
        })
    }

    /// Iterates `(relation, related_type, join_table)` triples of
    /// ManyToMany relationships.
    pub fn many_to_many(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.relationships.iter().filter_map(|r| match r {
            Relationship::ManyToMany {
                relation,
                related_type,
                join_table,
            } => Some((relation.as_str(), related_type.as_str(), join_table.as_str())),
            _ => None,
        })
    }
}

/// A named projection of a media type's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

impl View {
    pub fn new<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// A user type rendered in responses under a content identifier.
///
/// A media type whose root attribute is an array of a named object is a
/// collection of that object's media type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(flatten)]
    pub user_type: UserType,
    pub identifier: String,
    #[serde(default)]
    pub views: Vec<View>,
}

impl MediaType {
    pub fn new(user_type: UserType, identifier: impl Into<String>) -> Self {
        Self {
            user_type,
            identifier: identifier.into(),
            views: Vec::new(),
        }
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    pub fn name(&self) -> &str {
        &self.user_type.name
    }

    pub fn attribute(&self) -> &Attribute {
        &self.user_type.attribute
    }

    /// Returns the element type name for collection media types.
    pub fn collection_of(&self) -> Option<&str> {
        self.attribute().element().and_then(Attribute::type_name)
    }

    /// Returns `true` when more than one view is declared.
    pub fn is_multi_view(&self) -> bool {
        self.views.len() > 1
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }
}
