//! Admin dashboard and broadcast tests

use axum::http::{header, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{bearer, multipart_body, TestApp};

#[tokio::test]
async fn test_stats_count_users_posts_comments() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let (_, alice) = app.member("alice", "alice@example.com").await;

    let post: Value = app
        .server
        .post("/api/index/posts/create")
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "content": "hello" }))
        .await
        .json();
    app.server
        .post("/api/index/comments/create")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "post_id": post["id"], "content": "welcome" }))
        .await
        .assert_status_ok();

    let stats: Value = app
        .server
        .get("/api/admin/stats")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await
        .json();

    assert_eq!(
        stats,
        json!({
            "total_users": 2,
            "total_posts": 1,
            "total_comments": 1,
            "active_users_24h": 2,
        })
    );
}

#[tokio::test]
async fn test_admin_edits_and_deletes_users() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    let (bob_id, _) = app.member("bob", "bob@example.com").await;

    app.server
        .post("/api/admin/users/edit")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "id": bob_id, "username": "robert", "email": "not-an-email" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/admin/users/edit")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "id": bob_id, "username": "bob1", "email": "bob@example.com" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Invalid username format"
    );

    app.server
        .post("/api/admin/users/edit")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "id": bob_id, "username": "robert", "email": "root@example.com" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .post("/api/admin/users/edit")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "id": bob_id, "username": "robert", "email": "robert@example.com" }))
        .await
        .assert_status_ok();

    let users: Value = app
        .server
        .get("/api/admin/users")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await
        .json();
    let robert = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == bob_id)
        .unwrap();
    assert_eq!(robert["username"], "robert");
    assert_eq!(robert["email"], "robert@example.com");
    assert!(robert.get("password_hash").is_none());

    app.server
        .delete("/api/admin/users/delete")
        .add_query_param("id", bob_id)
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await
        .assert_status_ok();

    app.server
        .delete("/api/admin/users/delete")
        .add_query_param("id", bob_id)
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .delete("/api/admin/users/delete")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_broadcast_sends_in_background_and_drains_on_shutdown() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;
    app.mailer.fail_for("bounce@example.com");

    let (content_type, body) = multipart_body(
        &[
            ("subject", "Maintenance"),
            ("body", "We will be down on Sunday."),
            ("users[]", "alice@example.com"),
            ("users[]", "bounce@example.com"),
            ("users[]", "carol@example.com"),
        ],
        &[("attachment", "schedule.txt", "text/plain", &b"Sunday 02:00 UTC"[..])],
    );

    let response = app
        .server
        .post("/api/admin/broadcast-to-selected")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .content_type(&content_type)
        .bytes(body.into())
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "message": "Emails are being sent" })
    );

    app.state.broadcaster.shutdown().await;

    let sent = app.mailer.sent();
    let recipients: Vec<&str> = sent.iter().map(|m| m.to.as_str()).collect();
    assert_eq!(recipients, vec!["alice@example.com", "carol@example.com"]);

    let attachment = sent[0].attachment.as_ref().expect("attachment forwarded");
    assert_eq!(attachment.filename, "schedule.txt");
    assert_eq!(attachment.content_type, "text/plain");
    assert_eq!(attachment.data, b"Sunday 02:00 UTC".to_vec());
    assert_eq!(sent[1].subject, "Maintenance");
}

#[tokio::test]
async fn test_broadcast_validates_recipients() {
    let app = TestApp::new();
    let (_, admin) = app.admin().await;

    let cases: [&[(&str, &str)]; 3] = [
        &[("subject", "Hi"), ("body", "x")],
        &[("subject", "Hi"), ("body", "x"), ("users[]", "not-an-email")],
        &[("body", "x"), ("users[]", "alice@example.com")],
    ];

    for fields in cases {
        let (content_type, body) = multipart_body(fields, &[]);
        app.server
            .post("/api/admin/broadcast-to-selected")
            .add_header(header::AUTHORIZATION, bearer(&admin))
            .content_type(&content_type)
            .bytes(body.into())
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    app.server
        .post("/api/admin/broadcast-to-selected")
        .add_header(header::AUTHORIZATION, bearer(&admin))
        .json(&json!({ "subject": "not multipart" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.state.broadcaster.shutdown().await;
    assert!(app.mailer.sent().is_empty());
}
