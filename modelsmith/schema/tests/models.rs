//! Storage models generated for the cellar design, run against the
//! in-memory store.

use std::sync::Arc;
use std::time::Duration;

use modelsmith::store::{Condition, Lookup, Operation, OperationKind};
use modelsmith::{MemoryStore, Roler, Row};
use modelsmith_schema::models::account::{Account, AccountDb, AccountStorage};
use modelsmith_schema::models::bottle::{Bottle, BottleDb, BottleStorage};
use modelsmith_schema::models::comment::{CommentDb, CommentStorage, filter_comment_by_post};
use modelsmith_schema::models::note::{NoteDb, NoteStorage};
use modelsmith_schema::models::post::{Post, PostDb, PostStorage};
use modelsmith_schema::models::stock::{Stock, StockDb, StockStorage};
use modelsmith_schema::models::tag::Tag;
use modelsmith_schema::models::widget::{Widget, WidgetDb, WidgetStorage};
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

/// Lets detached cache tasks run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// === uncached models ===

#[tokio::test]
async fn uncached_lookups_always_hit_the_store() {
    let store = Arc::new(MemoryStore::new());
    store.seed("widgets", row(json!({"id": 7, "label": "gear"})));
    let db = WidgetDb::new(store.clone());

    let widget = db.one(7).await.unwrap();
    assert_eq!(widget.label, "gear");
    db.one(7).await.unwrap();
    assert_eq!(store.count(OperationKind::Find), 2);

    match &store.operations()[0] {
        Operation::Find(query) => {
            assert_eq!(query.table, "widgets");
            assert_eq!(
                query.lookup,
                Lookup::Key {
                    column: "id".to_string(),
                    value: json!(7)
                }
            );
        }
        other => panic!("expected a find, got {other:?}"),
    }
}

#[tokio::test]
async fn uncached_deletes_only_touch_the_store() {
    let store = Arc::new(MemoryStore::new());
    store.seed("widgets", row(json!({"id": 7, "label": "gear"})));
    let db = WidgetDb::new(store.clone());

    db.delete(7).await.unwrap();
    settle().await;
    assert_eq!(store.operations().len(), 1);
    assert!(store.rows("widgets").is_empty());
}

#[tokio::test]
async fn missing_rows_are_not_found() {
    let db = WidgetDb::new(Arc::new(MemoryStore::new()));
    let err = db.one(1).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn add_assigns_keys_and_keeps_json_members() {
    let store = Arc::new(MemoryStore::new());
    let db = WidgetDb::new(store.clone());
    let added = db
        .add(Widget {
            label: "gear".to_string(),
            specs: json!({"teeth": 12}),
            ..Widget::default()
        })
        .await
        .unwrap();
    assert_eq!(added.id, 1);
    assert_eq!(db.one(1).await.unwrap().specs, json!({"teeth": 12}));
}

#[tokio::test]
async fn update_requires_an_existing_row() {
    let store = Arc::new(MemoryStore::new());
    let db = WidgetDb::new(store.clone());
    let missing = Widget {
        id: 3,
        label: "none".to_string(),
        ..Widget::default()
    };
    assert!(db.update(&missing).await.unwrap_err().is_not_found());
    assert_eq!(store.count(OperationKind::Update), 0);

    store.seed("widgets", row(json!({"id": 3, "label": "old"})));
    db.update(&missing).await.unwrap();
    assert_eq!(db.one(3).await.unwrap().label, "none");
}

#[tokio::test]
async fn store_failures_propagate() {
    let store = Arc::new(MemoryStore::new());
    store.fail_on(OperationKind::Insert);
    let db = WidgetDb::new(store.clone());
    assert!(db.add(Widget::default()).await.is_err());
}

// === cached models ===

#[tokio::test]
async fn cached_lookups_are_served_from_the_cache() {
    let store = Arc::new(MemoryStore::new());
    store.seed("posts", row(json!({"id": 1, "title": "Hello"})));
    let db = PostDb::new(store.clone());

    assert_eq!(db.one(1).await.unwrap().title, "Hello");
    settle().await;
    assert_eq!(db.one(1).await.unwrap().title, "Hello");
    assert_eq!(store.count(OperationKind::Find), 1);
}

#[tokio::test]
async fn added_rows_are_cached() {
    let store = Arc::new(MemoryStore::new());
    let db = PostDb::new(store.clone());
    let post = db
        .add(Post {
            title: "Fresh".to_string(),
            ..Post::default()
        })
        .await
        .unwrap();
    settle().await;

    assert_eq!(db.one(post.id).await.unwrap(), post);
    assert_eq!(store.count(OperationKind::Find), 0);
}

#[tokio::test]
async fn deletes_evict_cached_rows() {
    let store = Arc::new(MemoryStore::new());
    store.seed("posts", row(json!({"id": 1, "title": "Hello"})));
    let db = PostDb::new(store.clone());

    db.one(1).await.unwrap();
    settle().await;
    db.delete(1).await.unwrap();
    settle().await;
    assert!(db.one(1).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn updates_refresh_the_cache() {
    let store = Arc::new(MemoryStore::new());
    store.seed("posts", row(json!({"id": 1, "title": "Hello", "body": "first"})));
    let db = PostDb::new(store.clone());

    let mut post = db.one(1).await.unwrap();
    settle().await;
    post.title = "Changed".to_string();
    post.body = None;
    db.update(&post).await.unwrap();
    settle().await;

    let cached = db.one(1).await.unwrap();
    assert_eq!(cached.title, "Changed");
    // Null members are not written.
    assert_eq!(cached.body.as_deref(), Some("first"));
}

#[tokio::test]
async fn failed_writes_leave_the_cache_alone() {
    let store = Arc::new(MemoryStore::new());
    store.seed("posts", row(json!({"id": 1, "title": "Hello"})));
    let db = PostDb::new(store.clone());

    let mut post = db.one(1).await.unwrap();
    settle().await;
    store.fail_on(OperationKind::Update);
    store.fail_on(OperationKind::Delete);

    post.title = "Changed".to_string();
    assert!(db.update(&post).await.is_err());
    assert!(db.delete(1).await.is_err());
    settle().await;

    assert_eq!(db.one(1).await.unwrap().title, "Hello");
    assert_eq!(store.count(OperationKind::Find), 1);
}

// === per-call tables ===

#[tokio::test]
async fn dynamic_tables_are_chosen_per_call() {
    let store = Arc::new(MemoryStore::new());
    let db = StockDb::new(store.clone());
    let stock = Stock {
        cellar_id: 1,
        bin: "A1".to_string(),
        quantity: 6,
        bottle_id: 5,
        ..Stock::default()
    };

    db.add("stock_paris", stock.clone()).await.unwrap();
    db.add("stock_lyon", Stock { quantity: 2, ..stock.clone() }).await.unwrap();
    settle().await;
    assert_eq!(store.rows("stock_paris").len(), 1);
    assert_eq!(store.rows("stock_lyon").len(), 1);

    // Cache keys include the table, so each site keeps its own entry.
    assert_eq!(db.one("stock_paris", 1, "A1").await.unwrap().quantity, 6);
    assert_eq!(db.one("stock_lyon", 1, "A1").await.unwrap().quantity, 2);
    assert_eq!(db.one_by_bottle("stock_paris", 5, 1, "A1").await.unwrap().quantity, 6);
    assert_eq!(store.count(OperationKind::Find), 0);
}

#[tokio::test]
async fn composite_keys_select_with_a_where_clause() {
    let store = Arc::new(MemoryStore::new());
    store.seed("stock_paris", row(json!({"cellar_id": 1, "bin": "A1", "quantity": 6, "bottle_id": 5})));
    store.seed("stock_paris", row(json!({"cellar_id": 1, "bin": "B2", "quantity": 3, "bottle_id": 5})));
    store.seed("stock_lyon", row(json!({"cellar_id": 1, "bin": "A1", "quantity": 2, "bottle_id": 5})));
    let db = StockDb::new(store.clone());

    let mut stock = db.one("stock_paris", 1, "B2").await.unwrap();
    assert_eq!(stock.quantity, 3);
    match &store.operations()[0] {
        Operation::Find(query) => {
            assert_eq!(query.table, "stock_paris");
            assert_eq!(
                query.lookup,
                Lookup::Where {
                    clause: "cellar_id = ? AND bin = ?".to_string(),
                    args: vec![json!(1), json!("B2")],
                }
            );
        }
        other => panic!("expected a find, got {other:?}"),
    }
    settle().await;

    stock.quantity = 12;
    db.update("stock_paris", &stock).await.unwrap();
    settle().await;
    assert_eq!(db.one("stock_paris", 1, "B2").await.unwrap().quantity, 12);
    assert_eq!(db.one("stock_lyon", 1, "A1").await.unwrap().quantity, 2);
    settle().await;

    db.delete("stock_lyon", 1, "A1").await.unwrap();
    settle().await;
    assert!(store.rows("stock_lyon").is_empty());
    assert!(db.one("stock_lyon", 1, "A1").await.unwrap_err().is_not_found());
    assert_eq!(store.rows("stock_paris").len(), 2);
}

// === relationships ===

#[tokio::test]
async fn children_are_listed_per_parent() {
    let store = Arc::new(MemoryStore::new());
    store.seed("comments", row(json!({"id": 1, "body": "a", "post_id": 3})));
    store.seed("comments", row(json!({"id": 2, "body": "b", "post_id": 4})));
    let db = CommentDb::new(store.clone());

    let scoped = db.list_by_post(3).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].body, "a");
    match &store.operations()[0] {
        Operation::List(query) => assert_eq!(
            query.conditions,
            [Condition {
                clause: "post_id = ?".to_string(),
                args: vec![json!(3)],
            }]
        ),
        other => panic!("expected a list, got {other:?}"),
    }

    let all = db.list_by_post(0).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(filter_comment_by_post(4, &all).len(), 1);
}

#[tokio::test]
async fn children_are_fetched_within_their_parent() {
    let store = Arc::new(MemoryStore::new());
    store.seed("bottles", row(json!({"id": 5, "name": "Merlot", "vintage": 2015, "account_id": 1})));
    let db = BottleDb::new(store.clone());

    let bottle: Bottle = db.one_by_account(1, 5).await.unwrap();
    assert_eq!(bottle.name, "Merlot");
    assert!(db.one_by_account(2, 5).await.unwrap_err().is_not_found());
    assert_eq!(Bottle::SQL_TAG, "index");
}

#[tokio::test]
async fn many_to_many_links_go_through_the_join_table() {
    let store = Arc::new(MemoryStore::new());
    store.seed("tags", row(json!({"name": "rust"})));
    store.seed("tags", row(json!({"name": "wine"})));
    let db = PostDb::new(store.clone());

    db.add_tag(1, "rust").await.unwrap();
    db.add_tag(1, "wine").await.unwrap();
    let tags: Vec<Tag> = db.list_tags(1).await.unwrap();
    assert_eq!(tags.len(), 2);

    db.delete_tag(1, "wine").await.unwrap();
    let tags = db.list_tags(1).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "rust");
    assert!(store.operations().iter().all(|op| op.table() == "posts_tags"));
}

#[tokio::test]
async fn scoped_fetches_of_cached_types_use_the_cache() {
    let store = Arc::new(MemoryStore::new());
    store.seed("notes_2024", row(json!({"id": 1, "text": "tannic", "bottle_id": 5})));
    let db = NoteDb::new(store.clone());

    assert_eq!(db.one_by_bottle("notes_2024", 5, 1).await.unwrap().text, "tannic");
    settle().await;
    db.one_by_bottle("notes_2024", 5, 1).await.unwrap();
    db.one("notes_2024", 1).await.unwrap();
    assert_eq!(store.count(OperationKind::Find), 1);

    // A cached row of another bottle is not served.
    assert!(db.one_by_bottle("notes_2024", 6, 1).await.unwrap_err().is_not_found());
    assert_eq!(store.count(OperationKind::Find), 2);

    // A zero parent id is unscoped.
    db.one_by_bottle("notes_2024", 0, 1).await.unwrap();
    assert_eq!(store.count(OperationKind::Find), 2);
}

#[tokio::test]
async fn dynamic_owners_link_tags_per_table() {
    let store = Arc::new(MemoryStore::new());
    store.seed("tags", row(json!({"name": "oaky"})));
    let db = NoteDb::new(store.clone());

    db.add_tag("notes_2024", 1, "oaky").await.unwrap();
    let tags: Vec<Tag> = db.list_tags("notes_2024", 1).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert!(db.list_tags("notes_2025", 1).await.unwrap().is_empty());

    db.delete_tag("notes_2024", 1, "oaky").await.unwrap();
    assert!(db.list_tags("notes_2024", 1).await.unwrap().is_empty());
    assert!(store.operations().iter().all(|op| op.table() == "notes_tags"));
}

// === options ===

#[tokio::test]
async fn accounts_carry_roles_and_convert_to_media() {
    let store = Arc::new(MemoryStore::new());
    let db = AccountDb::new(store.clone());
    let account = db
        .add(Account {
            name: "acme".to_string(),
            role: "owner".to_string(),
            href: "/accounts/1".to_string().into(),
            ..Account::default()
        })
        .await
        .unwrap();
    assert_eq!(Account::TABLE_NAME, "accounts");
    assert_eq!(account.role(), "owner");

    let media = account.to_media().unwrap();
    assert_eq!(media.id, account.id);
    assert_eq!(media.name, "acme");
}
