//! Resources, actions, routes and responses.
//!
//! An [`Action`] carries everything needed to synthesize a request context:
//! its path/query parameters, headers, optional payload type, routes and
//! responses. A [`Resource`] groups actions and supplies headers and
//! responses shared by all of them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::attribute::Attribute;
use crate::types::UserType;

/// HTTP methods an action route can be mounted on.
///
/// ## Examples
///
/// ```
/// use std::str::FromStr;
/// use modelsmith_define::RestMethod;
///
/// assert_eq!(RestMethod::from_str("GET").unwrap(), RestMethod::Get);
/// assert_eq!(RestMethod::Post.to_string(), "POST");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

/// A verb plus path template. Templates use `:name` or `{name}` segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub verb: RestMethod,
    pub path: String,
}

impl Route {
    pub fn new(verb: RestMethod, path: impl Into<String>) -> Self {
        Self {
            verb,
            path: path.into(),
        }
    }
}

/// A named response an action may send.
///
/// `media_type` holds the identifier of a declared media type, or a plain
/// content type for raw responses. `None` means an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub name: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Response {
    pub fn new(name: impl Into<String>, status: u16) -> Self {
        Self {
            name: name.into(),
            status,
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, identifier: impl Into<String>) -> Self {
        self.media_type = Some(identifier.into());
        self
    }

    pub fn ok() -> Self {
        Self::new("OK", 200)
    }

    pub fn created() -> Self {
        Self::new("Created", 201)
    }

    pub fn no_content() -> Self {
        Self::new("NoContent", 204)
    }

    pub fn bad_request() -> Self {
        Self::new("BadRequest", 400)
    }

    pub fn not_found() -> Self {
        Self::new("NotFound", 404)
    }
}

/// One operation on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Object attribute holding path and query parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Attribute>,
    /// Object attribute holding request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<UserType>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            routes: Vec::new(),
            params: None,
            headers: None,
            payload: None,
            responses: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn route(mut self, verb: RestMethod, path: impl Into<String>) -> Self {
        self.routes.push(Route::new(verb, path));
        self
    }

    pub fn with_params(mut self, params: Attribute) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_headers(mut self, headers: Attribute) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_payload(mut self, payload: UserType) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn response(mut self, response: Response) -> Self {
        self.responses.push(response);
        self
    }
}

/// A group of actions sharing a base path, headers and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub base_path: String,
    /// Identifier of the media type this resource renders by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Action whose first route addresses a single resource instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Attribute>,
    #[serde(default)]
    pub responses: Vec<Response>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            base_path: String::new(),
            media_type: None,
            canonical_action: None,
            headers: None,
            responses: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    pub fn with_media_type(mut self, identifier: impl Into<String>) -> Self {
        self.media_type = Some(identifier.into());
        self
    }

    pub fn with_canonical_action(mut self, action: impl Into<String>) -> Self {
        self.canonical_action = Some(action.into());
        self
    }

    pub fn with_headers(mut self, headers: Attribute) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn response(mut self, response: Response) -> Self {
        self.responses.push(response);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn rest_method_round_trips_through_strings() {
        for method in RestMethod::iter() {
            let parsed: RestMethod = method.to_string().parse().unwrap();
            assert_eq!(parsed, method);
        }
        assert_eq!(RestMethod::iter().count(), 7);
    }

    #[test]
    fn builder_collects_routes_and_responses() {
        let action = Action::new("show")
            .route(RestMethod::Get, "/:bottleID")
            .route(RestMethod::Get, "/bottles/:bottleID")
            .response(Response::ok().with_media_type("application/vnd.bottle+json"))
            .response(Response::not_found());

        assert_eq!(action.routes.len(), 2);
        assert_eq!(action.responses[0].status, 200);
        assert_eq!(action.responses[1].media_type, None);
    }

    #[test]
    fn resource_finds_actions_by_name() {
        let resource = Resource::new("bottle")
            .with_base_path("/bottles")
            .action(Action::new("list"))
            .action(Action::new("show"));
        assert!(resource.find_action("show").is_some());
        assert!(resource.find_action("delete").is_none());
    }
}
