//! Signup, login, tokens, profiles and password changes.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use store_ratings_core::Role;
use store_ratings_integration_tests::TestApp;
use store_ratings_server::db::UserRepository;

#[tokio::test]
async fn test_signup_login_and_rate_end_to_end() {
    let app = TestApp::new();

    let (status, body) = app.signup("Al", "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "a@x.com", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["accessToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refreshToken"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["name"], "Al");
    assert_eq!(body["user"]["role"], "user");

    let al = app.login("a@x.com", "secret1").await;
    let admin = app.user_with_role("Admin", "admin@x.com", Role::Admin).await;
    let store = app.create_store(&admin, "Corner Bakery", None).await;

    let (status, listing) = app.get("/v1/stores", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing[0]["myRating"], serde_json::Value::Null);
    assert_eq!(listing[0]["totalRatings"], 0);

    let (status, body) = app.rate(&al, store, 4).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Rating submitted");
    assert_eq!(body["myRating"], 4);

    let (_, listing) = app.get("/v1/stores", Some(&al.access_token)).await;
    assert_eq!(listing[0]["myRating"], 4);
    assert_eq!(listing[0]["averageRating"].as_f64(), Some(4.0));
    assert_eq!(listing[0]["totalRatings"], 1);

    // Anonymous callers still never see a personal rating
    let (_, listing) = app.get("/v1/stores", None).await;
    assert_eq!(listing[0]["myRating"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new();

    let (status, _) = app.signup("Al", "a@x.com", "secret1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.signup("Other Al", "a@x.com", "secret2").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let admin = app.user_with_role("Admin", "admin@x.com", Role::Admin).await;
    let (_, counts) = app
        .get("/v1/admin/dashboard", Some(&admin.access_token))
        .await;
    assert_eq!(counts["totalUsers"], 2);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/v1/auth/signup", None, json!({ "email": "a@x.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name, email and password are required");

    let (status, _) = app.signup("Al", "not-an-email", "secret1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.signup("Al", "a@x.com", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "Al", "email": "a@x.com", "password": "secret1", "role": "owner" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "Bea", "email": "b@x.com", "password": "secret1", "role": "storeOwner" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "storeOwner");

    let (status, _) = app
        .post(
            "/v1/auth/signup",
            None,
            json!({ "name": "Cy", "email": "c@x.com", "password": "secret1", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.repo().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_login_mismatch_is_generic() {
    let app = TestApp::new();
    app.signup("Al", "a@x.com", "secret1").await;

    let (wrong_password, body) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "a@x.com", "password": "wrong-one" }),
        )
        .await;
    let (unknown_email, other) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "nobody@x.com", "password": "secret1" }),
        )
        .await;

    assert_eq!(wrong_password, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_email, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], other["message"]);
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(other["error"], "unauthenticated");
}

#[tokio::test]
async fn test_refresh_issues_access_token() {
    let app = TestApp::new();
    app.signup("Al", "a@x.com", "secret1").await;
    let al = app.login("a@x.com", "secret1").await;

    let (status, body) = app
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refreshToken": &al.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["accessToken"].as_str().unwrap().to_owned();

    let (status, _) = app
        .get(&format!("/v1/auth/{}", al.id), Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Token kinds are not interchangeable
    let (status, _) = app
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refreshToken": &al.access_token }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .get(&format!("/v1/auth/{}", al.id), Some(&al.refresh_token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_is_self_or_admin() {
    let app = TestApp::new();
    app.signup("Al", "a@x.com", "secret1").await;
    app.signup("Jo", "j@x.com", "secret1").await;
    let al = app.login("a@x.com", "secret1").await;
    let jo = app.login("j@x.com", "secret1").await;
    let admin = app.user_with_role("Admin", "admin@x.com", Role::Admin).await;

    let (status, body) = app
        .get(&format!("/v1/auth/{}", al.id), Some(&al.access_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@x.com");
    assert!(body.get("passwordHash").is_none());

    let (status, _) = app
        .get(&format!("/v1/auth/{}", al.id), Some(&jo.access_token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(&format!("/v1/auth/{}", al.id), Some(&admin.access_token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/v1/auth/{}", al.id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = app
        .get(&format!("/v1/auth/{}", al.id), Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new();
    app.signup("Al", "a@x.com", "secret1").await;
    app.signup("Jo", "j@x.com", "secret1").await;
    let al = app.login("a@x.com", "secret1").await;
    let jo = app.login("j@x.com", "secret1").await;
    let uri = format!("/v1/auth/{}/password", al.id);

    let (status, _) = app
        .put(
            &uri,
            Some(&al.access_token),
            json!({ "oldPassword": "wrong-one", "newPassword": "secret2" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &uri,
            Some(&jo.access_token),
            json!({ "oldPassword": "secret1", "newPassword": "secret2" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .put(
            &uri,
            Some(&al.access_token),
            json!({ "oldPassword": "secret1", "newPassword": "secret2" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated successfully");

    let (status, _) = app
        .post(
            "/v1/auth/login",
            None,
            json!({ "email": "a@x.com", "password": "secret1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    app.login("a@x.com", "secret2").await;
}
