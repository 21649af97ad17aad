//! Response senders, views and hrefs generated for the cellar design.

use modelsmith::{MemoryRequest, RequestAccessor, ResponseError};
use modelsmith_schema::app::{
    Account, Bottle, BottleCollection, BottleView, CheckHealthContext, ListBottleContext,
    RateBottleContext, ShowBottleContext, ShowWidgetContext, Widget,
};
use modelsmith_schema::{app, v1};
use serde_json::json;

fn account() -> Account {
    Account {
        id: 1,
        href: app::hrefs::account_href(1),
        name: "acme".to_string(),
        created_by: Some("owner@acme.test".to_string()),
    }
}

fn bottle() -> Bottle {
    Bottle {
        id: 5,
        href: app::hrefs::bottle_href(1, 5),
        name: "Merlot".to_string(),
        vintage: Some(2015),
        color: Some("red".to_string()),
        sweetness: Some(2),
        account: Some(account()),
        ..Bottle::default()
    }
}

fn show_bottle() -> ShowBottleContext {
    let request = MemoryRequest::new()
        .with_param("accountID", "1")
        .with_param("bottleID", "5")
        .with_header("X-Account", "acme")
        .boxed();
    ShowBottleContext::new(request).unwrap()
}

// === views ===

#[test]
fn tiny_view_renders_its_members_only() {
    let mut context = show_bottle();
    context.ok(&bottle(), BottleView::Tiny).unwrap();

    let sent = context.sent().unwrap();
    assert_eq!(sent.status, 200);
    assert_eq!(sent.content_type(), Some("application/vnd.bottle+json; charset=utf-8"));
    assert_eq!(
        sent.json().unwrap(),
        json!({"id": 5, "href": "/accounts/1/bottles/5", "name": "Merlot"})
    );
}

#[test]
fn nested_media_types_use_the_same_named_view() {
    let value = bottle().project(BottleView::Default);
    assert_eq!(
        value["account"],
        json!({"id": 1, "href": "/accounts/1", "name": "acme", "created_by": "owner@acme.test"})
    );
    assert!(value.get("sweetness").is_none());
}

#[test]
fn nested_media_types_fall_back_to_their_default_view() {
    // Account declares no "full" view.
    let value = bottle().project(BottleView::Full);
    assert_eq!(value["sweetness"], json!(2));
    assert_eq!(value["account"]["created_by"], json!("owner@acme.test"));
}

#[test]
fn absent_optional_members_are_left_out() {
    let bottle = Bottle {
        account: None,
        color: None,
        ..bottle()
    };
    let value = bottle.project(BottleView::Default);
    assert!(value.get("account").is_none());
    assert!(value.get("color").is_none());
    assert_eq!(BottleView::default(), BottleView::Default);
}

#[test]
fn collections_render_each_element() {
    let request = MemoryRequest::new()
        .with_param("accountID", "1")
        .with_param("count", "10")
        .with_header("X-Account", "acme")
        .boxed();
    let mut context = ListBottleContext::new(request).unwrap();
    let bottles = BottleCollection(vec![bottle(), bottle()]);
    context.ok(&bottles, BottleView::Tiny).unwrap();

    let sent = context.sent().unwrap();
    assert_eq!(
        sent.content_type(),
        Some("application/vnd.bottle+json; type=collection; charset=utf-8")
    );
    let body = sent.json().unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0], json!({"id": 5, "href": "/accounts/1/bottles/5", "name": "Merlot"}));
}

#[test]
fn single_view_media_types_take_no_selector() {
    let mut context = ShowWidgetContext::new(MemoryRequest::new().with_param("id", "3").boxed()).unwrap();
    let widget = Widget {
        id: 3,
        label: "gear".to_string(),
    };
    context.ok(&widget).unwrap();
    assert_eq!(context.sent().unwrap().json().unwrap(), json!({"id": 3, "label": "gear"}));
}

// === failures ===

#[test]
fn invalid_values_are_not_sent() {
    let mut context = show_bottle();
    let bottle = Bottle {
        name: "M".to_string(),
        ..bottle()
    };
    let err = context.ok(&bottle, BottleView::Default).unwrap_err();
    assert!(matches!(err, ResponseError::Invalid(_)));
    assert!(context.sent().is_none());
}

#[test]
fn responses_are_sent_once() {
    let mut context = show_bottle();
    context.not_found().unwrap();
    let err = context.ok(&bottle(), BottleView::Tiny).unwrap_err();
    assert!(matches!(err, ResponseError::AlreadySent(404)));
}

// === bodies without media types ===

#[test]
fn empty_responses_carry_only_a_status() {
    let request = MemoryRequest::new()
        .with_param("accountID", "1")
        .with_param("bottleID", "5")
        .with_header("X-Account", "acme")
        .with_payload(json!({"rating": 4}))
        .boxed();
    let mut context = RateBottleContext::new(request).unwrap();
    assert_eq!(context.payload.rating, 4);
    context.no_content().unwrap();

    let sent = context.sent().unwrap();
    assert_eq!(sent.status, 204);
    assert!(sent.body.is_empty());
}

#[test]
fn resource_responses_are_available_on_every_action() {
    let mut context = show_bottle();
    context.bad_request().unwrap();
    assert_eq!(context.sent().unwrap().status, 400);
}

#[test]
fn raw_bodies_are_sent_as_declared() {
    let mut context = CheckHealthContext::new(MemoryRequest::new().boxed()).unwrap();
    context.ok(b"ok".to_vec()).unwrap();
    let sent = context.sent().unwrap();
    assert_eq!(sent.content_type(), Some("text/plain"));
    assert_eq!(sent.body, b"ok");
}

// === versions and hrefs ===

#[test]
fn versions_reuse_default_media_types() {
    let request = MemoryRequest::new().with_param("bottleID", "5").boxed();
    let mut context = v1::ShowBottleContext::new(request).unwrap();
    assert_eq!(context.bottle_id, 5);
    context.ok(&bottle(), app::BottleView::Tiny).unwrap();
    assert_eq!(context.sent().unwrap().status, 200);
}

#[test]
fn hrefs_fill_path_parameters_in_order() {
    assert_eq!(app::hrefs::bottle_href(1, 5), "/accounts/1/bottles/5");
    assert_eq!(app::hrefs::widget_href(3), "/widgets/3");
    assert_eq!(v1::hrefs::bottle_href(9), "/v1/bottles/9");
}
