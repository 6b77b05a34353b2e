//! Owner and admin views, and owner-scoped store edits.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use store_ratings_core::Role;
use store_ratings_integration_tests::{Session, TestApp};

/// Bea owns "Corner Bakery" (rated 5 by Al) and "Morning Rolls" (rated 1 by
/// Al and Jo). Sam owns "Fresh Greens" (rated 4 by Jo).
struct Fixture {
    app: TestApp,
    admin: Session,
    bea: Session,
    sam: Session,
    al: Session,
    bakery: i64,
    rolls: i64,
    greens: i64,
}

async fn fixture() -> Fixture {
    let app = TestApp::new();
    let admin = app.user_with_role("Admin", "admin@x.com", Role::Admin).await;
    let bea = app.user_with_role("Bea Baker", "bea@x.com", Role::StoreOwner).await;
    let sam = app.user_with_role("Sam Grocer", "sam@x.com", Role::StoreOwner).await;
    let al = app.user_with_role("Al", "al@x.com", Role::User).await;
    let jo = app.user_with_role("Jo", "jo@x.com", Role::User).await;

    let bakery = app.create_store(&admin, "Corner Bakery", Some(bea.id)).await;
    let rolls = app.create_store(&admin, "Morning Rolls", Some(bea.id)).await;
    let greens = app.create_store(&admin, "Fresh Greens", Some(sam.id)).await;

    app.rate(&al, bakery, 5).await;
    app.rate(&al, rolls, 1).await;
    app.rate(&jo, rolls, 1).await;
    app.rate(&jo, greens, 4).await;

    Fixture {
        app,
        admin,
        bea,
        sam,
        al,
        bakery,
        rolls,
        greens,
    }
}

#[tokio::test]
async fn test_owner_dashboard_pools_ratings() {
    let f = fixture().await;

    let (status, dash) = f
        .app
        .get("/v1/stores/owner/dashboard", Some(&f.bea.access_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["totalStores"], 2);
    assert_eq!(dash["totalRatings"], 3);

    // Mean of all three ratings, not the mean of the two store averages (3.0)
    let avg = dash["avgRating"].as_f64().unwrap();
    assert!((avg - 7.0 / 3.0).abs() < 1e-9, "avgRating {avg}");

    let raters = dash["raters"].as_array().unwrap();
    assert_eq!(raters.len(), 3);
    assert!(raters.iter().all(|r| r["storeId"] != f.greens));
    assert!(raters.iter().any(|r| r["email"] == "al@x.com"));

    let (_, alias) = f
        .app
        .get("/v1/owner/dashboard", Some(&f.bea.access_token))
        .await;
    assert_eq!(alias["totalRatings"], 3);
}

#[tokio::test]
async fn test_owner_dashboard_without_stores() {
    let app = TestApp::new();
    let owner = app.user_with_role("New Owner", "new@x.com", Role::StoreOwner).await;

    let (status, dash) = app
        .get("/v1/owner/dashboard", Some(&owner.access_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["totalStores"], 0);
    assert_eq!(dash["totalRatings"], 0);
    assert_eq!(dash["avgRating"].as_f64(), Some(0.0));
    assert_eq!(dash["raters"], json!([]));
}

#[tokio::test]
async fn test_dashboards_check_roles() {
    let f = fixture().await;

    for uri in ["/v1/owner/dashboard", "/v1/stores/owner/dashboard"] {
        let (status, _) = f.app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = f.app.get(uri, Some(&f.al.access_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "forbidden");

        let (status, _) = f.app.get(uri, Some(&f.admin.access_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    for uri in ["/v1/admin/dashboard", "/v1/admin/users", "/v1/admin/stores"] {
        let (status, _) = f.app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = f.app.get(uri, Some(&f.bea.access_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn test_admin_dashboard_counts() {
    let f = fixture().await;

    let (status, counts) = f
        .app
        .get("/v1/admin/dashboard", Some(&f.admin.access_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        counts,
        json!({ "totalUsers": 5, "totalStores": 3, "totalRatings": 4 })
    );
}

#[tokio::test]
async fn test_admin_user_listing() {
    let f = fixture().await;
    let token = Some(f.admin.access_token.as_str());

    let (status, owners) = f.app.get("/v1/admin/users?role=storeOwner", token).await;
    assert_eq!(status, StatusCode::OK);
    let owners = owners.as_array().unwrap();
    assert_eq!(owners.len(), 2);
    assert_eq!(owners[0]["name"], "Bea Baker");
    assert_eq!(owners[0]["store"]["name"], "Corner Bakery");
    assert_eq!(owners[0]["store"]["averageRating"], "5");
    assert_eq!(owners[1]["store"]["averageRating"], "4");

    let (_, users) = f.app.get("/v1/admin/users?role=user", token).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("store").is_none()));
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let (_, by_name) = f.app.get("/v1/admin/users?name=SAM", token).await;
    assert_eq!(by_name.as_array().map(Vec::len), Some(1));

    let (status, _) = f.app.get("/v1/admin/users?role=owner", token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_store_listing() {
    let f = fixture().await;
    let token = Some(f.admin.access_token.as_str());

    let (status, stores) = f.app.get("/v1/admin/stores", token).await;
    assert_eq!(status, StatusCode::OK);
    let stores = stores.as_array().unwrap();
    assert_eq!(stores.len(), 3);

    let rolls = stores.iter().find(|s| s["id"] == f.rolls).unwrap();
    assert_eq!(rolls["averageRating"], "1");
    assert_eq!(rolls["totalRatings"], 2);
    assert_eq!(rolls["owner"]["email"], "bea@x.com");

    let (_, filtered) = f.app.get("/v1/admin/stores?name=fresh", token).await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(1));
    assert_eq!(filtered[0]["id"], f.greens);
}

#[tokio::test]
async fn test_admin_creates_users_with_any_role() {
    let f = fixture().await;
    let token = Some(f.admin.access_token.as_str());

    let (status, user) = f
        .app
        .post(
            "/v1/admin/users",
            token,
            json!({
                "name": "Nia Owner",
                "email": "nia@x.com",
                "password": "nia-pass",
                "address": "5 High St",
                "role": "storeOwner"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "storeOwner");

    let (status, _) = f
        .app
        .post(
            "/v1/admin/users",
            token,
            json!({ "name": "No Address", "email": "na@x.com", "password": "na-pass", "role": "user" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = f
        .app
        .post(
            "/v1/admin/users",
            token,
            json!({
                "name": "Dup",
                "email": "nia@x.com",
                "password": "dup-pass",
                "address": "x",
                "role": "user"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = f
        .app
        .post(
            "/v1/admin/users",
            Some(&f.al.access_token),
            json!({
                "name": "Sneaky",
                "email": "sneaky@x.com",
                "password": "sneaky-pass",
                "address": "x",
                "role": "admin"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_cannot_touch_foreign_store() {
    let f = fixture().await;

    let (status, body) = f
        .app
        .put(
            &format!("/v1/owner/stores/{}", f.greens),
            Some(&f.bea.access_token),
            json!({ "name": "Taken Over" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Store not found");

    let (status, _) = f
        .app
        .delete(
            &format!("/v1/owner/stores/{}", f.greens),
            Some(&f.bea.access_token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = f.app.get("/v1/stores?search=Fresh", None).await;
    assert_eq!(listing[0]["name"], "Fresh Greens");
    assert_eq!(listing[0]["totalRatings"], 1);

    let (status, _) = f
        .app
        .put(
            &format!("/v1/owner/stores/{}", f.bakery),
            Some(&f.sam.access_token),
            json!({ "name": "Taken Over" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_updates_and_deletes_own_store() {
    let f = fixture().await;

    let (status, store) = f
        .app
        .put(
            &format!("/v1/owner/stores/{}", f.bakery),
            Some(&f.bea.access_token),
            json!({ "name": "Corner Bakery & Cafe", "ownerId": f.sam.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store["name"], "Corner Bakery & Cafe");
    assert_eq!(store["address"], "1 Main St");
    assert_eq!(store["ownerId"], json!(f.bea.id));

    let (status, body) = f
        .app
        .delete(
            &format!("/v1/owner/stores/{}", f.rolls),
            Some(&f.bea.access_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], f.rolls);

    let (status, _) = f.app.get(&format!("/v1/rating/{}", f.rolls), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, dash) = f
        .app
        .get("/v1/owner/dashboard", Some(&f.bea.access_token))
        .await;
    assert_eq!(dash["totalStores"], 1);
    assert_eq!(dash["totalRatings"], 1);
    assert_eq!(dash["avgRating"].as_f64(), Some(5.0));

    let (_, counts) = f
        .app
        .get("/v1/admin/dashboard", Some(&f.admin.access_token))
        .await;
    assert_eq!(counts["totalRatings"], 2);

    // Users can't use owner routes even on stores that exist
    let (status, _) = f
        .app
        .delete(
            &format!("/v1/owner/stores/{}", f.bakery),
            Some(&f.al.access_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
