//! Feed, post, comment and profile endpoints

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{bearer, TestApp};

async fn create_post(app: &TestApp, token: &str, content: &str) -> i64 {
    let response = app
        .server
        .post("/api/index/posts/create")
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&json!({ "content": content }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_post_lifecycle_is_author_scoped() {
    let app = TestApp::new();
    let (alice_id, alice) = app.member("alice", "alice@example.com").await;
    let (_, bob) = app.member("bob", "bob@example.com").await;

    let post_id = create_post(&app, &alice, "First post").await;

    let response = app
        .server
        .put("/api/index/posts/update")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .json(&json!({ "id": post_id, "content": "hijacked" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Post not found or you don't have permission to edit it"
    );

    app.server
        .put("/api/index/posts/update")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": post_id, "content": "Edited post" }))
        .await
        .assert_status_ok();

    let posts: Value = app
        .server
        .get("/api/index/posts")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(posts[0]["content"], "Edited post");
    assert_eq!(posts[0]["user_id"], alice_id);
    assert_eq!(posts[0]["username"], "alice");

    app.server
        .delete("/api/index/posts/delete")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .json(&json!({ "id": post_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete("/api/index/posts/delete")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": post_id }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_post_listing_filters_and_paging() {
    let app = TestApp::new();
    let (_, alice) = app.member("alice", "alice@example.com").await;
    let (bob_id, bob) = app.member("bob", "bob@example.com").await;

    for i in 0..12 {
        create_post(&app, &alice, &format!("note {}", i)).await;
    }
    create_post(&app, &bob, "Learning Rust today").await;

    let page: Value = app
        .server
        .get("/api/index/posts")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(page.as_array().unwrap().len(), 10);
    assert_eq!(page[0]["content"], "Learning Rust today");

    let second: Value = app
        .server
        .get("/api/index/posts")
        .add_query_param("page", 2)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(second.as_array().unwrap().len(), 3);

    let by_keyword: Value = app
        .server
        .get("/api/index/posts")
        .add_query_param("keyword", "RUST")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(by_keyword.as_array().unwrap().len(), 1);

    let by_user: Value = app
        .server
        .get("/api/index/posts")
        .add_query_param("user_id", bob_id)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(by_user.as_array().unwrap().len(), 1);

    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let by_date: Value = app
        .server
        .get("/api/index/posts")
        .add_query_param("date", &today)
        .add_query_param("username", "ali")
        .add_query_param("page_size", 100)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(by_date.as_array().unwrap().len(), 12);

    app.server
        .get("/api/index/posts")
        .add_query_param("page_size", 0)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comments_and_post_author_moderation() {
    let app = TestApp::new();
    let (_, alice) = app.member("alice", "alice@example.com").await;
    let (bob_id, bob) = app.member("bob", "bob@example.com").await;
    let (_, carol) = app.member("carol", "carol@example.com").await;

    let post_id = create_post(&app, &alice, "Discuss").await;

    let response = app
        .server
        .post("/api/index/comments/create")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .json(&json!({ "post_id": post_id, "content": "Nice" }))
        .await;
    response.assert_status_ok();
    let comment: Value = response.json();
    assert_eq!(comment["user_id"], bob_id);
    assert_eq!(comment["username"], "bob");
    let comment_id = comment["id"].as_i64().unwrap();

    app.server
        .put("/api/index/comments/update")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": comment_id, "content": "rewritten" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .put("/api/index/comments/update")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .json(&json!({ "id": comment_id, "content": "Very nice" }))
        .await
        .assert_status_ok();

    // A bystander may not delete it; the post's author may.
    app.server
        .delete("/api/index/comments/delete")
        .add_header(header::AUTHORIZATION, bearer(&carol))
        .json(&json!({ "id": comment_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .delete("/api/index/comments/delete")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": comment_id }))
        .await
        .assert_status_ok();

    let comments: Value = app
        .server
        .get("/api/index/comments")
        .add_header(header::AUTHORIZATION, bearer(&carol))
        .await
        .json();
    assert_eq!(comments, json!([]));
}

#[tokio::test]
async fn test_comment_on_missing_post_is_not_found() {
    let app = TestApp::new();
    let (_, alice) = app.member("alice", "alice@example.com").await;

    app.server
        .post("/api/index/comments/create")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "post_id": 999, "content": "hello?" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_endpoints() {
    let app = TestApp::new();
    let (alice_id, alice) = app.member("alice", "alice@example.com").await;
    let (bob_id, _) = app.member("bob", "bob@example.com").await;
    create_post(&app, &alice, "mine").await;

    let data: Value = app
        .server
        .get("/api/user-profile/data")
        .add_query_param("id", alice_id)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(
        data,
        json!({ "username": "alice", "email": "alice@example.com", "is_admin": false })
    );

    app.server
        .get("/api/user-profile/data")
        .add_query_param("id", 9999)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let posts: Value = app
        .server
        .get("/api/user-profile/posts")
        .add_query_param("id", alice_id)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(posts.as_array().unwrap().len(), 1);

    app.server
        .post("/api/user-profile/edit")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": bob_id, "username": "mallory", "password": "x" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .post("/api/user-profile/edit")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": alice_id, "username": "alice2", "password": "new-password" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Invalid username format"
    );

    app.server
        .post("/api/user-profile/edit")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "id": alice_id, "username": "alicia", "password": "new-password" }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/login")
        .json(&json!({ "email": "alice@example.com", "password": "new-password" }))
        .await
        .assert_status_ok();
}
