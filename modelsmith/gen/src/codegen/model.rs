//! Storage model and data-access object generation.
//!
//! Every user type of the default version that carries storage options gets
//! one artifact holding:
//!
//! - the row struct `{Type}`, with `TABLE_NAME` and optional `SQL_TAG`
//! - one scope function and one in-memory filter per BelongsTo parent
//! - the `{Type}Storage` trait and its `{Type}Db` implementation over an
//!   `Arc<dyn modelsmith::Store>`, optionally fronted by a `modelsmith::Cache`
//!
//! ## Field layout
//!
//! Primary-key columns come first in key order. Declared members follow,
//! skipping keys. Foreign keys of BelongsTo links that were not declared are
//! appended last. Key and foreign-key columns are never optional; their type
//! follows the key kind (`i64` or `String`).

use modelsmith_define::{ApiVersion, Attribute, AttributeType, KeyKind, StorageOptions, UserType};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;
use crate::naming::{ident, pluralize, snake_case, table_name, type_ident};

/// One primary-key or foreign-key column.
#[derive(Debug, Clone)]
pub struct KeyColumn {
    pub name: String,
    pub ident: Ident,
    pub kind: KeyKind,
}

impl KeyColumn {
    fn new(name: &str, kind: KeyKind) -> Self {
        Self {
            name: name.to_string(),
            ident: ident(name),
            kind,
        }
    }

    /// Type of the struct field.
    fn field_type(&self) -> TokenStream {
        match self.kind {
            KeyKind::Integer => quote!(i64),
            KeyKind::String => quote!(String),
        }
    }

    /// Type of a method argument carrying this key.
    fn arg_type(&self) -> TokenStream {
        match self.kind {
            KeyKind::Integer => quote!(i64),
            KeyKind::String => quote!(&str),
        }
    }

    /// Passes the key field of `owner` as a method argument.
    fn arg_from(&self, owner: &TokenStream) -> TokenStream {
        let ident = &self.ident;
        match self.kind {
            KeyKind::Integer => quote!(#owner.#ident),
            KeyKind::String => quote!(#owner.#ident.as_str()),
        }
    }
}

/// A BelongsTo link from the model to a parent storage type.
#[derive(Debug, Clone)]
pub struct ParentLink {
    pub parent: String,
    pub column: KeyColumn,
}

/// A ManyToMany link through a join table.
#[derive(Debug, Clone)]
pub struct AssociationLink {
    pub relation: String,
    pub related: String,
    pub join_table: String,
    /// Key column of the related type.
    pub related_key: KeyColumn,
}

/// A rendered struct member.
#[derive(Debug, Clone)]
pub struct ModelField {
    pub name: String,
    pub ident: Ident,
    pub ty: TokenStream,
    pub optional: bool,
}

/// Everything the renderer needs about one storage type.
#[derive(Debug, Clone)]
pub struct ModelPlan<'a> {
    pub user_type: &'a UserType,
    pub options: &'a StorageOptions,
    pub keys: Vec<KeyColumn>,
    pub parents: Vec<ParentLink>,
    pub associations: Vec<AssociationLink>,
    /// Path of the same-named media type, when a conversion is emitted.
    pub media: Option<TokenStream>,
}

impl<'a> ModelPlan<'a> {
    /// Plans the model of a storage type.
    ///
    /// ## Errors
    ///
    /// Returns `MissingDesignInput` when the type has no storage options or
    /// no primary key, or when a relationship names a type that is not a
    /// keyed storage type of the default version.
    pub fn build(
        user_type: &'a UserType,
        default: &'a ApiVersion,
        app_module: &str,
    ) -> Result<Self, GeneratorError> {
        let options = user_type.storage.as_ref().ok_or_else(|| {
            GeneratorError::design(format!("type '{}' has no storage options", user_type.name))
        })?;
        if user_type.primary_keys.is_empty() {
            return Err(GeneratorError::design(format!(
                "storage type '{}' declares no primary key",
                user_type.name
            )));
        }
        let keys = user_type
            .primary_keys
            .iter()
            .map(|key| KeyColumn::new(&key.name, key.kind))
            .collect();

        let mut parents = Vec::new();
        for (parent, foreign_key) in user_type.belongs_to() {
            let parent_key = first_key(default, parent, &user_type.name)?;
            parents.push(ParentLink {
                parent: parent.to_string(),
                column: KeyColumn::new(foreign_key, parent_key.kind),
            });
        }

        let mut associations = Vec::new();
        for (relation, related, join_table) in user_type.many_to_many() {
            if user_type.primary_keys.len() > 1 {
                return Err(GeneratorError::design(format!(
                    "many-to-many relation '{relation}' of '{}' needs a single-column key",
                    user_type.name
                )));
            }
            let related_key = first_key(default, related, &user_type.name)?;
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
            associations.push(AssociationLink {
                relation: relation.to_string(),
                related: related.to_string(),
                join_table: join_table.to_string(),
                related_key,
            });
        }

        let media = if options.no_media {
            None
        } else {
            default.media_type_by_name(&user_type.name).map(|media| {
                let app = ident(app_module);
                let ty = type_ident(media.name());
                quote!(crate::#app::#ty)
            })
        };

        Ok(Self {
            user_type,
            options,
            keys,
            parents,
            associations,
            media,
        })
    }

    /// The table name baked into the model: declared, or the plural
    /// snake-case type name.
    pub fn table_name(&self) -> String {
        if self.options.table_name.is_empty() {
            table_name(&self.user_type.name)
        } else {
            self.options.table_name.clone()
        }
    }

    fn is_key(&self, name: &str) -> bool {
        self.keys.iter().any(|k| k.name == name)
    }

    fn foreign_key(&self, name: &str) -> Option<&KeyColumn> {
        self.parents.iter().map(|p| &p.column).find(|c| c.name == name)
    }

    /// Struct members in layout order.
    pub fn fields(&self) -> Vec<ModelField> {
        let attribute = &self.user_type.attribute;
        let mut fields: Vec<ModelField> = self.keys.iter().map(key_field).collect();

        for field in attribute.fields() {
            if self.is_key(&field.name) {
                continue;
            }
            if let Some(column) = self.foreign_key(&field.name) {
                fields.push(key_field(column));
                continue;
            }
            let optional = attribute.is_pointer(&field.name);
            let ty = column_type(&field.attribute);
            fields.push(ModelField {
                name: field.name.clone(),
                ident: ident(&field.name),
                ty: if optional { quote!(Option<#ty>) } else { ty },
                optional,
            });
        }

        for parent in &self.parents {
            if attribute.field(&parent.column.name).is_none() && !self.is_key(&parent.column.name) {
                fields.push(key_field(&parent.column));
            }
        }
        fields
    }
}

fn key_field(column: &KeyColumn) -> ModelField {
    ModelField {
        name: column.name.clone(),
        ident: column.ident.clone(),
        ty: column.field_type(),
        optional: false,
    }
}

fn first_key(default: &ApiVersion, name: &str, owner: &str) -> Result<KeyColumn, GeneratorError> {
    default
        .user_type_by_name(name)
        .filter(|u| u.is_storage())
        .and_then(|u| u.primary_keys.first())
        .map(|key| KeyColumn::new(&key.name, key.kind))
        .ok_or_else(|| {
            GeneratorError::design(format!(
                "'{owner}' is related to '{name}', which is not a keyed storage type"
            ))
        })
}

/// Column type of a declared member. Objects and opaque values are stored
/// as JSON.
fn column_type(attribute: &Attribute) -> TokenStream {
    match &attribute.kind {
        AttributeType::Boolean => quote!(bool),
        AttributeType::Integer => quote!(i64),
        AttributeType::Number => quote!(f64),
        AttributeType::String => quote!(String),
        AttributeType::Array { element } if element.is_primitive() => {
            let element = column_type(element);
            quote!(Vec<#element>)
        }
        AttributeType::Any | AttributeType::Array { .. } | AttributeType::Object(_) => {
            quote!(serde_json::Value)
        }
    }
}

/// Module name of a model artifact.
pub fn model_module(type_name: &str) -> String {
    snake_case(type_name)
}

/// Storage types of the default version, in declaration order.
pub fn storage_types(default: &ApiVersion) -> impl Iterator<Item = &UserType> {
    default.user_types.iter().filter(|u| u.is_storage())
}

/// Renders `models/mod.rs`.
pub fn render_models_index(default: &ApiVersion) -> TokenStream {
    let modules = storage_types(default).map(|user_type| {
        let module = ident(&model_module(&user_type.name));
        let ty = type_ident(&user_type.name);
        let db = format_ident!("{}Db", ty);
        let storage = format_ident!("{}Storage", ty);
        quote! {
            pub mod #module;
            pub use #module::{#ty, #db, #storage};
        }
    });
    quote! {
        //! Storage models and their data-access objects.

        #(#modules)*
    }
}

/// Renders one storage type's artifact.
///
/// ## Errors
///
/// See [`ModelPlan::build`]. Role-capable types additionally need a string
/// `role` member.
pub fn render_model(
    user_type: &UserType,
    default: &ApiVersion,
    config: &GeneratorConfig,
) -> Result<TokenStream, GeneratorError> {
    let plan = ModelPlan::build(user_type, default, &config.app_module)?;
    let model = ModelRenderer::new(&plan, config);

    let module_doc = format!(" Storage model of `{}`.", user_type.name);
    let definition = model.render_struct()?;
    let scopes = model.render_scopes();
    let storage = model.render_storage();

    Ok(quote! {
        #![doc = #module_doc]

        #definition
        #(#scopes)*
        #storage
    })
}

/// Where the table name of a generated method comes from.
enum TableSource {
    Fixed(TokenStream),
    /// Supplied per call as a `table_name: &str` argument.
    Dynamic,
}

struct ModelRenderer<'p, 'a> {
    plan: &'p ModelPlan<'a>,
    config: &'p GeneratorConfig,
    ty: Ident,
    table: TableSource,
}

impl<'p, 'a> ModelRenderer<'p, 'a> {
    fn new(plan: &'p ModelPlan<'a>, config: &'p GeneratorConfig) -> Self {
        let ty = type_ident(&plan.user_type.name);
        let table = if plan.options.dynamic_table_name {
            TableSource::Dynamic
        } else {
            TableSource::Fixed(quote!(#ty::TABLE_NAME))
        };
        Self {
            plan,
            config,
            ty,
            table,
        }
    }

    fn cached(&self) -> bool {
        self.plan.options.cached
    }

    fn table_expr(&self) -> TokenStream {
        match &self.table {
            TableSource::Fixed(expr) => expr.clone(),
            TableSource::Dynamic => quote!(table_name),
        }
    }

    /// Leading `table_name` parameter of table-bound methods.
    fn table_param(&self) -> TokenStream {
        match self.table {
            TableSource::Fixed(_) => TokenStream::new(),
            TableSource::Dynamic => quote!(table_name: &str,),
        }
    }

    fn table_arg(&self) -> TokenStream {
        match self.table {
            TableSource::Fixed(_) => TokenStream::new(),
            TableSource::Dynamic => quote!(table_name,),
        }
    }

    fn key_params(&self) -> Vec<TokenStream> {
        self.plan
            .keys
            .iter()
            .map(|key| {
                let ident = &key.ident;
                let ty = key.arg_type();
                quote!(#ident: #ty)
            })
            .collect()
    }

    /// Selects one row by primary key; `values` are `serde_json::Value`
    /// expressions in key order.
    fn key_lookup(&self, values: &[TokenStream]) -> TokenStream {
        let table = self.table_expr();
        if let ([key], [value]) = (self.plan.keys.as_slice(), values) {
            let column = key.name.as_str();
            return quote!(modelsmith::Query::table(#table).by_key(#column, #value));
        }
        let columns: Vec<&str> = self.plan.keys.iter().map(|k| k.name.as_str()).collect();
        let clause = modelsmith::store::where_clause(&columns);
        quote!(modelsmith::Query::table(#table).by_where(#clause, vec![#(#values),*]))
    }

    fn arg_values(&self) -> Vec<TokenStream> {
        self.plan
            .keys
            .iter()
            .map(|key| {
                let ident = &key.ident;
                quote!(serde_json::Value::from(#ident))
            })
            .collect()
    }

    fn field_values(&self, owner: &TokenStream) -> Vec<TokenStream> {
        self.plan
            .keys
            .iter()
            .map(|key| {
                let arg = key.arg_from(owner);
                quote!(serde_json::Value::from(#arg))
            })
            .collect()
    }

    /// Cache key expression from key expressions, prefixed by the table for
    /// dynamic tables.
    fn cache_key(&self, parts: &[TokenStream]) -> TokenStream {
        let table = match self.table {
            TableSource::Fixed(_) => None,
            TableSource::Dynamic => Some(quote!(&table_name)),
        };
        let parts = table.into_iter().chain(parts.iter().cloned());
        quote!(modelsmith::cache::cache_key(&[#(#parts),*]))
    }

    fn arg_cache_parts(&self) -> Vec<TokenStream> {
        self.plan
            .keys
            .iter()
            .map(|key| {
                let ident = &key.ident;
                quote!(&#ident)
            })
            .collect()
    }

    fn field_cache_parts(&self, owner: &TokenStream) -> Vec<TokenStream> {
        self.plan
            .keys
            .iter()
            .map(|key| {
                let ident = &key.ident;
                quote!(&#owner.#ident)
            })
            .collect()
    }

    fn render_struct(&self) -> Result<TokenStream, GeneratorError> {
        let ty = &self.ty;
        let plan = self.plan;
        let fields = plan.fields();
        let doc = if plan.user_type.description.is_empty() {
            format!(" Stored `{}` row.", plan.user_type.name)
        } else {
            format!(" {}", plan.user_type.description)
        };

        let members = fields.iter().map(|field| {
            let ident = &field.ident;
            let field_ty = &field.ty;
            let mut attrs = Vec::new();
            if ident.to_string().trim_start_matches("r#") != field.name {
                let original = field.name.as_str();
                attrs.push(quote!(#[serde(rename = #original)]));
            }
            if field.optional {
                attrs.push(quote!(#[serde(skip_serializing_if = "Option::is_none")]));
            }
            quote! {
                #(#attrs)*
                pub #ident: #field_ty
            }
        });

        let table = plan.table_name();
        let sql_tag = (!plan.options.sql_tag.is_empty()).then(|| {
            let tag = plan.options.sql_tag.as_str();
            quote! {
                /// Column tag declared for the model.
                pub const SQL_TAG: &'static str = #tag;
            }
        });
        let to_media = plan.media.as_ref().map(|media| {
            quote! {
                /// Converts the row into its media type.
                ///
                /// ## Errors
                ///
                /// Returns the conversion error when a stored column does not
                /// fit the media type's member.
                pub fn to_media(&self) -> Result<#media, serde_json::Error> {
                    serde_json::from_value(serde_json::to_value(self)?)
                }
            }
        });
        let roler = if plan.options.role_capable {
            Some(self.render_roler(&fields)?)
        } else {
            None
        };

        Ok(quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
            #[serde(default)]
            pub struct #ty {
                #(#members),*
            }

            impl #ty {
                /// Default table of the model.
                pub const TABLE_NAME: &'static str = #table;

                #sql_tag

                #to_media
            }

            #roler
        })
    }

    fn render_roler(&self, fields: &[ModelField]) -> Result<TokenStream, GeneratorError> {
        let ty = &self.ty;
        let role = fields
            .iter()
            .find(|f| f.name == "role")
            .filter(|f| {
                let rendered = f.ty.to_string();
                rendered == "String" || rendered == "Option < String >"
            })
            .ok_or_else(|| {
                GeneratorError::design(format!(
                    "role-capable type '{}' needs a string 'role' member",
                    self.plan.user_type.name
                ))
            })?;
        let body = if role.optional {
            quote!(self.role.as_deref().unwrap_or_default())
        } else {
            quote!(&self.role)
        };
        Ok(quote! {
            impl modelsmith::Roler for #ty {
                fn role(&self) -> &str {
                    #body
                }
            }
        })
    }

    /// Scope and in-memory filter functions, one pair per parent.
    fn render_scopes(&self) -> Vec<TokenStream> {
        let ty = &self.ty;
        let type_name = &self.plan.user_type.name;
        self.plan
            .parents
            .iter()
            .map(|link| {
                let scope_fn = scope_fn_ident(type_name, &link.parent);
                let filter_fn = format_ident!("filter_{}_by_{}", snake_case(type_name), snake_case(&link.parent));
                let column = &link.column;
                let arg = &column.ident;
                let arg_ty = column.arg_type();
                let clause = format!("{} = ?", column.name);
                let scope_doc = format!(
                    " Limits `{type_name}` queries to one `{}`; a zero or empty id leaves the query unscoped.",
                    link.parent
                );
                let filter_doc = format!(" Keeps the `{type_name}` rows that belong to one `{}`.", link.parent);

                let scope_body = match column.kind {
                    KeyKind::Integer => quote! {
                        if #arg > 0 {
                            Box::new(move |query: modelsmith::Query| {
                                query.filter(#clause, vec![serde_json::Value::from(#arg)])
                            })
                        } else {
                            modelsmith::store::unscoped()
                        }
                    },
                    KeyKind::String => quote! {
                        if #arg.is_empty() {
                            modelsmith::store::unscoped()
                        } else {
                            let #arg = #arg.to_string();
                            Box::new(move |query: modelsmith::Query| {
                                query.filter(#clause, vec![serde_json::Value::from(#arg.clone())])
                            })
                        }
                    },
                };

                quote! {
                    #[doc = #scope_doc]
                    pub fn #scope_fn(#arg: #arg_ty) -> modelsmith::ScopeFn {
                        #scope_body
                    }

                    #[doc = #filter_doc]
                    pub fn #filter_fn(#arg: #arg_ty, list: &[#ty]) -> Vec<#ty> {
                        list.iter().filter(|item| item.#arg == #arg).cloned().collect()
                    }
                }
            })
            .collect()
    }

    fn render_storage(&self) -> TokenStream {
        let ty = &self.ty;
        let storage = format_ident!("{}Storage", ty);
        let db = format_ident!("{}Db", ty);
        let methods = self.methods();
        let signatures = methods.iter().map(|m| {
            let doc = &m.doc;
            let signature = &m.signature;
            quote! {
                #[doc = #doc]
                #signature;
            }
        });
        let bodies = methods.iter().map(|m| {
            let signature = &m.signature;
            let body = &m.body;
            quote! {
                #signature {
                    #body
                }
            }
        });
        let associations = self.plan.associations.iter().map(|link| self.render_association_fn(link));

        let (cache_field, cache_init) = if self.cached() {
            let expiration = self.config.cache_expiration_secs;
            let purge = self.config.cache_purge_secs;
            (
                quote!(cache: modelsmith::Cache<#ty>,),
                quote! {
                    cache: modelsmith::Cache::new(
                        std::time::Duration::from_secs(#expiration),
                        std::time::Duration::from_secs(#purge),
                    ),
                },
            )
        } else {
            (TokenStream::new(), TokenStream::new())
        };
        let storage_doc = format!(" Data access for `{}` rows.", self.plan.user_type.name);
        let db_doc = if self.cached() {
            format!(
                " [`{storage}`] over a `modelsmith::Store`, with a read-through cache. Cache writes run detached after the storage write succeeds."
            )
        } else {
            format!(" [`{storage}`] over a `modelsmith::Store`.")
        };

        quote! {
            #[doc = #storage_doc]
            #[allow(async_fn_in_trait)]
            pub trait #storage {
                #(#signatures)*
            }

            #[doc = #db_doc]
            #[derive(Clone)]
            pub struct #db {
                db: std::sync::Arc<dyn modelsmith::Store>,
                #cache_field
            }

            impl #db {
                pub fn new(db: std::sync::Arc<dyn modelsmith::Store>) -> Self {
                    Self {
                        db,
                        #cache_init
                    }
                }

                /// The underlying store.
                pub fn db(&self) -> &std::sync::Arc<dyn modelsmith::Store> {
                    &self.db
                }

                #(#associations)*
            }

            impl #storage for #db {
                #(#bodies)*
            }
        }
    }

    fn methods(&self) -> Vec<Method> {
        let mut methods = vec![self.list(), self.one(), self.add(), self.update(), self.delete()];
        for link in &self.plan.parents {
            methods.push(self.list_by(link));
            methods.push(self.one_by(link));
        }
        for link in &self.plan.associations {
            methods.extend(self.association_methods(link));
        }
        methods
    }

    fn list(&self) -> Method {
        let ty = &self.ty;
        let table = self.table_expr();
        let table_param = self.table_param();
        Method {
            doc: " Lists every row.".to_string(),
            signature: quote! {
                async fn list(&self, #table_param) -> Result<Vec<#ty>, modelsmith::StoreError>
            },
            body: quote! {
                let query = modelsmith::Query::table(#table);
                let rows = self.db.list(&query).await?;
                rows.into_iter().map(modelsmith::from_row).collect()
            },
        }
    }

    fn one(&self) -> Method {
        let ty = &self.ty;
        let table = self.table_expr();
        let table_param = self.table_param();
        let keys = self.key_params();
        let lookup = self.key_lookup(&self.arg_values());
        let fetch = quote! {
            let query = #lookup;
            let row = self
                .db
                .find(&query)
                .await?
                .ok_or_else(|| modelsmith::StoreError::not_found(#table))?;
        };
        let body = if self.cached() {
            let key = self.cache_key(&self.arg_cache_parts());
            quote! {
                let key = #key;
                if let Some(cached) = self.cache.get(&key) {
                    return Ok(cached);
                }
                #fetch
                let value: #ty = modelsmith::from_row(row)?;
                let cache = self.cache.clone();
                let cached = value.clone();
                modelsmith::detach(async move {
                    cache.set(key, cached);
                });
                Ok(value)
            }
        } else {
            quote! {
                #fetch
                modelsmith::from_row(row)
            }
        };
        Method {
            doc: if self.cached() {
                " Fetches one row by primary key, serving from the cache when possible.".to_string()
            } else {
                " Fetches one row by primary key.".to_string()
            },
            signature: quote! {
                async fn one(&self, #table_param #(#keys),*) -> Result<#ty, modelsmith::StoreError>
            },
            body,
        }
    }

    fn add(&self) -> Method {
        let ty = &self.ty;
        let table = self.table_expr();
        let table_param = self.table_param();
        let columns: Vec<&str> = self.plan.keys.iter().map(|k| k.name.as_str()).collect();
        let populate = self.cached().then(|| {
            let key = self.cache_key(&self.field_cache_parts(&quote!(value)));
            quote! {
                let cache = self.cache.clone();
                let key = #key;
                let cached = value.clone();
                modelsmith::detach(async move {
                    cache.set(key, cached);
                });
            }
        });
        Method {
            doc: " Inserts a row and returns it with its assigned key.".to_string(),
            signature: quote! {
                async fn add(&self, #table_param value: #ty) -> Result<#ty, modelsmith::StoreError>
            },
            body: quote! {
                let row = self
                    .db
                    .insert(#table, &[#(#columns),*], modelsmith::to_row(&value)?)
                    .await?;
                let value: #ty = modelsmith::from_row(row)?;
                #populate
                Ok(value)
            },
        }
    }

    fn update(&self) -> Method {
        let ty = &self.ty;
        let table_param = self.table_param();
        let table_arg = self.table_arg();
        let owner = quote!(value);
        let key_args = self.plan.keys.iter().map(|key| key.arg_from(&owner));
        let lookup = self.key_lookup(&self.field_values(&owner));
        let refresh = self.cached().then(|| {
            let key = self.cache_key(&self.field_cache_parts(&owner));
            quote! {
                let db = std::sync::Arc::clone(&self.db);
                let cache = self.cache.clone();
                let key = #key;
                modelsmith::detach(async move {
                    let fresh = db
                        .find(&query)
                        .await
                        .and_then(|row| row.map(modelsmith::from_row::<#ty>).transpose());
                    if let Ok(Some(fresh)) = fresh {
                        cache.set(key, fresh);
                    }
                });
            }
        });
        Method {
            doc: " Writes the non-null members of an existing row.".to_string(),
            signature: quote! {
                async fn update(&self, #table_param value: &#ty) -> Result<(), modelsmith::StoreError>
            },
            body: quote! {
                self.one(#table_arg #(#key_args),*).await?;
                let query = #lookup;
                let changes = modelsmith::without_nulls(modelsmith::to_row(value)?);
                self.db.update(&query, changes).await?;
                #refresh
                Ok(())
            },
        }
    }

    fn delete(&self) -> Method {
        let table_param = self.table_param();
        let keys = self.key_params();
        let lookup = self.key_lookup(&self.arg_values());
        let evict = self.cached().then(|| {
            let key = self.cache_key(&self.arg_cache_parts());
            quote! {
                let cache = self.cache.clone();
                let key = #key;
                modelsmith::detach(async move {
                    cache.delete(&key);
                });
            }
        });
        Method {
            doc: " Deletes one row by primary key.".to_string(),
            signature: quote! {
                async fn delete(&self, #table_param #(#keys),*) -> Result<(), modelsmith::StoreError>
            },
            body: quote! {
                let query = #lookup;
                self.db.delete(&query).await?;
                #evict
                Ok(())
            },
        }
    }

    fn list_by(&self, link: &ParentLink) -> Method {
        let ty = &self.ty;
        let table = self.table_expr();
        let table_param = self.table_param();
        let method = format_ident!("list_by_{}", snake_case(&link.parent));
        let scope_fn = scope_fn_ident(&self.plan.user_type.name, &link.parent);
        let arg = &link.column.ident;
        let arg_ty = link.column.arg_type();
        Method {
            doc: format!(" Lists the rows belonging to one `{}`.", link.parent),
            signature: quote! {
                async fn #method(&self, #table_param #arg: #arg_ty) -> Result<Vec<#ty>, modelsmith::StoreError>
            },
            body: quote! {
                let query = modelsmith::Query::table(#table).scoped(&#scope_fn(#arg));
                let rows = self.db.list(&query).await?;
                rows.into_iter().map(modelsmith::from_row).collect()
            },
        }
    }

    fn one_by(&self, link: &ParentLink) -> Method {
        let ty = &self.ty;
        let table = self.table_expr();
        let table_param = self.table_param();
        let method = format_ident!("one_by_{}", snake_case(&link.parent));
        let scope_fn = scope_fn_ident(&self.plan.user_type.name, &link.parent);
        let arg = &link.column.ident;
        let arg_ty = link.column.arg_type();
        // The parent argument shadows a key of the same name; key on a fresh
        // binding to keep both.
        let key_idents: Vec<Ident> = self
            .plan
            .keys
            .iter()
            .map(|key| {
                if key.ident == *arg {
                    format_ident!("{}_key", key.ident.to_string().trim_start_matches("r#"))
                } else {
                    key.ident.clone()
                }
            })
            .collect();
        let keys = key_idents.iter().zip(&self.plan.keys).map(|(ident, key)| {
            let ty = key.arg_type();
            quote!(#ident: #ty)
        });
        let values: Vec<TokenStream> = key_idents
            .iter()
            .map(|ident| quote!(serde_json::Value::from(#ident)))
            .collect();
        let lookup = self.key_lookup(&values);
        let fetch = quote! {
            let query = #lookup.scoped(&#scope_fn(#arg));
            let row = self
                .db
                .find(&query)
                .await?
                .ok_or_else(|| modelsmith::StoreError::not_found(#table))?;
        };

        let body = if self.cached() {
            let parts: Vec<TokenStream> = key_idents.iter().map(|ident| quote!(&#ident)).collect();
            let key = self.cache_key(&parts);
            // Mirrors the scope function: a zero or empty parent id matches any row.
            let unscoped = match link.column.kind {
                KeyKind::Integer => quote!(#arg <= 0),
                KeyKind::String => quote!(#arg.is_empty()),
            };
            quote! {
                let key = #key;
                if let Some(cached) = self
                    .cache
                    .get(&key)
                    .filter(|cached| #unscoped || cached.#arg == #arg)
                {
                    return Ok(cached);
                }
                #fetch
                let value: #ty = modelsmith::from_row(row)?;
                let cache = self.cache.clone();
                let cached = value.clone();
                modelsmith::detach(async move {
                    cache.set(key, cached);
                });
                Ok(value)
            }
        } else {
            quote! {
                #fetch
                modelsmith::from_row(row)
            }
        };

        Method {
            doc: if self.cached() {
                format!(
                    " Fetches one row by primary key within one `{}`, serving from the cache when the cached row belongs to it.",
                    link.parent
                )
            } else {
                format!(" Fetches one row by primary key within one `{}`.", link.parent)
            },
            signature: quote! {
                async fn #method(&self, #table_param #arg: #arg_ty, #(#keys),*) -> Result<#ty, modelsmith::StoreError>
            },
            body,
        }
    }

    fn association_fn(link: &AssociationLink) -> Ident {
        format_ident!("{}_association", snake_case(&link.relation))
    }

    /// Private constructor of the join-table description.
    fn render_association_fn(&self, link: &AssociationLink) -> TokenStream {
        let name = Self::association_fn(link);
        let owner_table = self.table_expr();
        let table_param = self.table_param();
        let owner_key = &self.plan.keys[0];
        let join_table = link.join_table.as_str();
        let owner_column = format!("{}_{}", snake_case(&self.plan.user_type.name), owner_key.name);
        let related_module = ident(&model_module(&link.related));
        let related_ty = type_ident(&link.related);
        let related_column = format!("{}_{}", snake_case(&link.related), link.related_key.name);
        let related_key = link.related_key.name.as_str();
        quote! {
            fn #name(#table_param) -> modelsmith::Association {
                modelsmith::Association {
                    join_table: #join_table.to_string(),
                    owner_table: #owner_table.to_string(),
                    owner_column: #owner_column.to_string(),
                    related_table: super::#related_module::#related_ty::TABLE_NAME.to_string(),
                    related_column: #related_column.to_string(),
                    related_key: #related_key.to_string(),
                }
            }
        }
    }

    fn association_methods(&self, link: &AssociationLink) -> Vec<Method> {
        let owner_key = &self.plan.keys[0];
        let owner = &owner_key.ident;
        let owner_ty = owner_key.arg_type();
        let relation = snake_case(&link.relation);
        let related = format_ident!("{}_{}", relation, snake_case(&link.related_key.name));
        let related_ty = link.related_key.arg_type();
        let related_module = ident(&model_module(&link.related));
        let related_type = type_ident(&link.related);
        let association = Self::association_fn(link);
        let table_param = self.table_param();
        let table_arg = self.table_arg();
        let add = format_ident!("add_{}", relation);
        let delete = format_ident!("delete_{}", relation);
        let list = format_ident!("list_{}", pluralize(&relation));

        vec![
            Method {
                doc: format!(" Links a `{}` through `{}`.", link.related, link.join_table),
                signature: quote! {
                    async fn #add(&self, #table_param #owner: #owner_ty, #related: #related_ty) -> Result<(), modelsmith::StoreError>
                },
                body: quote! {
                    self.db
                        .associate(
                            &Self::#association(#table_arg),
                            &serde_json::Value::from(#owner),
                            &serde_json::Value::from(#related),
                        )
                        .await
                },
            },
            Method {
                doc: format!(" Unlinks a `{}`.", link.related),
                signature: quote! {
                    async fn #delete(&self, #table_param #owner: #owner_ty, #related: #related_ty) -> Result<(), modelsmith::StoreError>
                },
                body: quote! {
                    self.db
                        .dissociate(
                            &Self::#association(#table_arg),
                            &serde_json::Value::from(#owner),
                            &serde_json::Value::from(#related),
                        )
                        .await
                },
            },
            Method {
                doc: format!(" Lists the linked `{}` rows.", link.related),
                signature: quote! {
                    async fn #list(&self, #table_param #owner: #owner_ty) -> Result<Vec<super::#related_module::#related_type>, modelsmith::StoreError>
                },
                body: quote! {
                    let rows = self
                        .db
                        .associated(&Self::#association(#table_arg), &serde_json::Value::from(#owner))
                        .await?;
                    rows.into_iter().map(modelsmith::from_row).collect()
                },
            },
        ]
    }
}

/// A trait method: its doc line, signature and implementation body.
struct Method {
    doc: String,
    signature: TokenStream,
    body: TokenStream,
}

fn scope_fn_ident(type_name: &str, parent: &str) -> Ident {
    format_ident!("{}_filter_by_{}", snake_case(type_name), snake_case(parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelsmith_define::{Field, MediaType, PrimaryKey, Relationship};

    fn design() -> ApiVersion {
        let widget = UserType::new(
            "Widget",
            Attribute::object(vec![
                Field::new("id", Attribute::integer()),
                Field::new("label", Attribute::string()),
                Field::new("specs", Attribute::object(vec![])),
            ])
            .required(["label"]),
        )
        .with_storage(StorageOptions::new().table("widgets"))
        .with_primary_key(PrimaryKey::integer("id"));

        let post = UserType::new(
            "Post",
            Attribute::object(vec![
                Field::new("title", Attribute::string()),
                Field::new("id", Attribute::integer()),
            ]),
        )
        .with_storage(StorageOptions::new().cached())
        .with_primary_key(PrimaryKey::integer("id"))
        .with_relationship(Relationship::many_to_many("Tag", "Tag", "posts_tags"));

        let comment = UserType::new(
            "Comment",
            Attribute::object(vec![Field::new("body", Attribute::string())]).required(["body"]),
        )
        .with_storage(StorageOptions::new())
        .with_primary_key(PrimaryKey::integer("id"))
        .with_relationship(Relationship::belongs_to("Post", "post_id"));

        let tag = UserType::new(
            "Tag",
            Attribute::object(vec![Field::new("name", Attribute::string())]),
        )
        .with_storage(StorageOptions::new())
        .with_primary_key(PrimaryKey::string("name"));

        let regional = UserType::new(
            "Regional",
            Attribute::object(vec![Field::new("role", Attribute::string())]).required(["role"]),
        )
        .with_storage(StorageOptions::new().dynamic_table().cached().role_capable().sql_tag("index"))
        .with_primary_key(PrimaryKey::integer("account_id"))
        .with_primary_key(PrimaryKey::string("region"));

        let note = UserType::new(
            "Note",
            Attribute::object(vec![Field::new("text", Attribute::string())]),
        )
        .with_storage(StorageOptions::new().dynamic_table().cached())
        .with_primary_key(PrimaryKey::integer("id"))
        .with_relationship(Relationship::belongs_to("Post", "post_id"))
        .with_relationship(Relationship::many_to_many("Tag", "Tag", "notes_tags"));

        ApiVersion::default_version()
            .user_type(widget)
            .user_type(post)
            .user_type(comment)
            .user_type(tag)
            .user_type(regional)
            .user_type(note)
            .media_type(MediaType::new(
                UserType::new("Widget", Attribute::object(vec![])),
                "application/vnd.widget+json",
            ))
    }

    fn render(name: &str) -> String {
        let version = design();
        let user_type = version.user_type_by_name(name).unwrap();
        render_model(user_type, &version, &GeneratorConfig::default())
            .unwrap()
            .to_string()
    }

    // === layout tests ===

    #[test]
    fn keys_come_first_and_are_not_repeated() {
        let version = design();
        let plan = ModelPlan::build(version.user_type_by_name("Post").unwrap(), &version, "app").unwrap();
        let names: Vec<_> = plan.fields().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["id", "title"]);
    }

    #[test]
    fn foreign_keys_are_appended() {
        let version = design();
        let plan =
            ModelPlan::build(version.user_type_by_name("Comment").unwrap(), &version, "app").unwrap();
        let fields = plan.fields();
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "body", "post_id"]);
        assert_eq!(fields[2].ty.to_string(), "i64");
    }

    #[test]
    fn objects_are_stored_as_json() {
        let code = render("Widget");
        assert!(code.contains("pub specs : Option < serde_json :: Value >"));
        assert!(code.contains("pub label : String"));
    }

    #[test]
    fn table_name_is_declared_or_derived() {
        assert!(render("Widget").contains("TABLE_NAME : & 'static str = \"widgets\""));
        assert!(render("Comment").contains("\"comments\""));
    }

    // === storage tests ===

    #[test]
    fn uncached_models_have_no_cache() {
        let code = render("Widget");
        assert!(!code.contains("modelsmith :: Cache"));
        assert!(!code.contains("detach"));
        assert!(code.contains("by_key (\"id\" , serde_json :: Value :: from (id))"));
    }

    #[test]
    fn cached_models_detach_cache_writes() {
        let code = render("Post");
        assert!(code.contains("cache : modelsmith :: Cache < Post >"));
        assert!(code.contains("std :: time :: Duration :: from_secs (300u64)"));
        assert!(code.contains("cache . delete (& key)"));
        assert_eq!(code.matches("modelsmith :: detach").count(), 4);
    }

    #[test]
    fn belongs_to_emits_scope_and_filter() {
        let code = render("Comment");
        assert!(code.contains("pub fn comment_filter_by_post (post_id : i64) -> modelsmith :: ScopeFn"));
        assert!(code.contains("if post_id > 0"));
        assert!(code.contains("pub fn filter_comment_by_post (post_id : i64 , list : & [Comment]) -> Vec < Comment >"));
        assert!(code.contains("async fn list_by_post"));
        assert!(code.contains("async fn one_by_post"));
    }

    #[test]
    fn many_to_many_emits_association_methods() {
        let code = render("Post");
        assert!(code.contains("async fn add_tag (& self , id : i64 , tag_name : & str)"));
        assert!(code.contains("async fn delete_tag"));
        assert!(code.contains("async fn list_tags (& self , id : i64) -> Result < Vec < super :: tag :: Tag >"));
        assert!(code.contains("owner_column : \"post_id\" . to_string ()"));
        assert!(code.contains("super :: tag :: Tag :: TABLE_NAME"));
    }

    #[test]
    fn dynamic_tables_take_the_table_per_call() {
        let code = render("Regional");
        assert!(code.contains("async fn one (& self , table_name : & str , account_id : i64 , region : & str)"));
        assert!(code.contains("by_where (\"account_id = ? AND region = ?\""));
        assert!(code.contains("cache_key (& [& table_name , & account_id , & region])"));
        assert!(code.contains("TABLE_NAME : & 'static str = \"regionals\""));
    }

    #[test]
    fn dynamic_owners_take_the_table_in_association_methods() {
        let code = render("Note");
        assert!(code.contains("async fn add_tag (& self , table_name : & str , id : i64 , tag_name : & str)"));
        assert!(code.contains("async fn delete_tag (& self , table_name : & str , id : i64"));
        assert!(code.contains("async fn list_tags (& self , table_name : & str , id : i64)"));
        assert!(code.contains("owner_table : table_name . to_string ()"));

        let post = render("Post");
        assert!(post.contains("owner_table : Post :: TABLE_NAME . to_string ()"));
    }

    #[test]
    fn cached_scoped_fetches_check_the_parent_of_cached_rows() {
        let code = render("Note");
        assert!(code.contains("async fn one_by_post (& self , table_name : & str , post_id : i64 , id : i64)"));
        assert!(code.contains("cached . post_id == post_id"));
        assert!(code.contains("post_id <= 0"));
        // one, add, update, delete and one_by_post
        assert_eq!(code.matches("modelsmith :: detach").count(), 5);

        let uncached = render("Comment");
        assert!(!uncached.contains("cache . get"));
    }

    #[test]
    fn options_add_role_tag_and_media_conversion() {
        let regional = render("Regional");
        assert!(regional.contains("impl modelsmith :: Roler for Regional"));
        assert!(regional.contains("SQL_TAG"));

        let widget = render("Widget");
        assert!(widget.contains("pub fn to_media (& self) -> Result < crate :: app :: Widget , serde_json :: Error >"));
        assert!(!render("Comment").contains("to_media"));
    }

    #[test]
    fn rendered_models_parse() {
        let version = design();
        for user_type in storage_types(&version) {
            let tokens = render_model(user_type, &version, &GeneratorConfig::default()).unwrap();
            assert!(syn::parse2::<syn::File>(tokens).is_ok(), "{} failed to parse", user_type.name);
        }
        assert!(syn::parse2::<syn::File>(render_models_index(&version)).is_ok());
    }

    // === design error tests ===

    #[test]
    fn unkeyed_storage_types_are_rejected() {
        let version = ApiVersion::default_version().user_type(
            UserType::new("Loose", Attribute::object(vec![])).with_storage(StorageOptions::new()),
        );
        let err = render_model(&version.user_types[0], &version, &GeneratorConfig::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::MissingDesignInput(_)));
    }

    #[test]
    fn unknown_parents_are_rejected() {
        let version = ApiVersion::default_version().user_type(
            UserType::new("Orphan", Attribute::object(vec![]))
                .with_storage(StorageOptions::new())
                .with_primary_key(PrimaryKey::integer("id"))
                .with_relationship(Relationship::belongs_to("Ghost", "ghost_id")),
        );
        let err = render_model(&version.user_types[0], &version, &GeneratorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn dynamic_related_types_are_rejected() {
        let version = design().user_type(
            UserType::new("Region", Attribute::object(vec![]))
                .with_storage(StorageOptions::new())
                .with_primary_key(PrimaryKey::integer("id"))
                .with_relationship(Relationship::many_to_many("Regional", "Regional", "regions_regionals")),
        );
        let region = version.user_type_by_name("Region").unwrap();
        let err = render_model(region, &version, &GeneratorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("chosen per call"));
    }

    #[test]
    fn role_capability_needs_a_role_member() {
        let version = ApiVersion::default_version().user_type(
            UserType::new("Member", Attribute::object(vec![]))
                .with_storage(StorageOptions::new().role_capable())
                .with_primary_key(PrimaryKey::integer("id")),
        );
        let err = render_model(&version.user_types[0], &version, &GeneratorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("role"));
    }
}
