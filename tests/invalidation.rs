mod support;

use axum::http::{Method, StatusCode};
use serde_json::json as body;

use support::{TestApp, json, seed};

#[tokio::test]
async fn admin_writes_are_visible_on_the_next_read() {
    let (app, _store) = TestApp::new();
    let token = app.admin_token().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/admin/bouquets",
            Some(&token),
            Some(body!({ "name": "Peony Cloud", "price_cents": 5_500, "featured": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json(&created)["id"].as_str().expect("id").to_string();

    let (_, list) = app.get("/api/bouquets").await;
    assert_eq!(json(&list)[0]["name"], "Peony Cloud");
    let (_, featured) = app.get("/api/bouquets?featured=true").await;
    assert_eq!(json(&featured)[0]["price_cents"], 5_500);
    let (_, detail) = app.get(&format!("/api/bouquets/{id}")).await;
    assert_eq!(json(&detail)["name"], "Peony Cloud");
    assert_eq!(app.cached_keys().await.len(), 3);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{id}"),
            Some(&token),
            Some(body!({ "name": "Peony Storm", "price_cents": 6_000, "featured": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cached_keys().await.is_empty());

    let (_, list) = app.get("/api/bouquets").await;
    assert_eq!(json(&list)[0]["name"], "Peony Storm");
    let (_, featured) = app.get("/api/bouquets?featured=true").await;
    assert_eq!(json(&featured)[0]["price_cents"], 6_000);
    let (_, detail) = app.get(&format!("/api/bouquets/{id}")).await;
    assert_eq!(json(&detail)["name"], "Peony Storm");
}

#[tokio::test]
async fn price_change_refreshes_the_category_filtered_listing() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let category = seeded.category.id;

    let (status, created) = app
        .send(
            Method::POST,
            "/api/admin/bouquets",
            Some(&token),
            Some(body!({ "name": "Bridal Cascade", "price_cents": 12_000, "category_id": category })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json(&created)["id"].as_str().expect("id").to_string();

    let uri = format!("/api/bouquets?category={category}");
    let (_, first) = app.get(&uri).await;
    assert_eq!(json(&first)[0]["id"], id.as_str());
    assert_eq!(json(&first)[0]["price_cents"], 12_000);
    let key = format!("bouquets:list:category:{category}:with-flowers");
    assert!(app.cached_keys().await.contains(&key));

    app.catalog.reset_reads();
    app.get(&uri).await;
    assert_eq!(app.catalog.reads(), 0);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{id}"),
            Some(&token),
            Some(body!({ "name": "Bridal Cascade", "price_cents": 13_500, "category_id": category })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.cached_keys().await.contains(&key));

    let (_, second) = app.get(&uri).await;
    assert_eq!(json(&second)[0]["id"], id.as_str());
    assert_eq!(json(&second)[0]["price_cents"], 13_500);
    assert!(app.catalog.reads() > 0);
}

#[tokio::test]
async fn bouquet_delete_drops_detail_and_category_listings() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let bouquet = seeded.bouquet.id;
    let category = seeded.category.id;

    app.get(&format!("/api/bouquets/{bouquet}")).await;
    app.get(&format!("/api/categories/{category}/bouquets")).await;
    app.get("/api/flowers").await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admin/bouquets/{bouquet}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.cached_keys().await, vec!["flowers:list"]);

    let (status, _) = app.get(&format!("/api/bouquets/{bouquet}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listing) = app.get(&format!("/api/categories/{category}/bouquets")).await;
    assert_eq!(&listing[..], b"[]");
}

#[tokio::test]
async fn flower_rename_reaches_embedded_bouquet_copies() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let bouquet = seeded.bouquet.id;
    let rose = seeded.rose.id;

    app.get(&format!("/api/bouquets/{bouquet}")).await;
    app.get("/api/bouquets").await;
    app.get("/api/flowers").await;
    app.get("/api/categories").await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/flowers/{rose}"),
            Some(&token),
            Some(body!({ "name": "Garden Rose", "color": "red", "price_cents": 400 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.cached_keys().await, vec!["categories:list"]);

    let (_, detail) = app.get(&format!("/api/bouquets/{bouquet}")).await;
    assert_eq!(json(&detail)["flowers"][0]["name"], "Garden Rose");
    let (_, flowers) = app.get("/api/flowers").await;
    assert_eq!(json(&flowers)[0]["price_cents"], 400);
}

#[tokio::test]
async fn category_delete_detaches_cached_bouquets() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let bouquet = seeded.bouquet.id;
    let category = seeded.category.id;

    let (_, before) = app.get(&format!("/api/bouquets/{bouquet}")).await;
    assert_eq!(json(&before)["category_id"], category.to_string());
    app.get("/api/categories").await;
    app.get(&format!("/api/categories/{category}")).await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/admin/categories/{category}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.cached_keys().await.is_empty());

    let (_, after) = app.get(&format!("/api/bouquets/{bouquet}")).await;
    assert!(json(&after)["category_id"].is_null());
    let (status, _) = app.get(&format!("/api/categories/{category}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, categories) = app.get("/api/categories").await;
    assert_eq!(&categories[..], b"[]");
}

#[tokio::test]
async fn tag_changes_refresh_bouquet_tag_lists() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let bouquet = seeded.bouquet.id;

    let (status, created) = app
        .send(Method::POST, "/api/admin/tags", Some(&token), Some(body!({ "name": "romance" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let tag = json(&created)["id"].as_str().expect("tag id").to_string();

    let (_, empty) = app.get(&format!("/api/bouquets/{bouquet}/tags")).await;
    assert_eq!(&empty[..], b"[]");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{bouquet}/tags"),
            Some(&token),
            Some(body!({ "tag_ids": [tag, tag] })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tags) = app.get(&format!("/api/bouquets/{bouquet}/tags")).await;
    assert_eq!(json(&tags)[0]["name"], "romance");
    assert_eq!(json(&tags).as_array().map(Vec::len), Some(1));
    app.get("/api/tags").await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/tags/{tag}"),
            Some(&token),
            Some(body!({ "name": "anniversary" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.cached_keys().await.is_empty());

    let (_, tags) = app.get(&format!("/api/bouquets/{bouquet}/tags")).await;
    assert_eq!(json(&tags)[0]["name"], "anniversary");
}

#[tokio::test]
async fn failed_writes_leave_the_cache_alone() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;

    app.get("/api/bouquets").await;
    app.get(&format!("/api/bouquets/{}", seeded.bouquet.id)).await;
    let before = app.cached_keys().await;
    assert_eq!(before.len(), 2);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{missing}"),
            Some(&token),
            Some(body!({ "name": "Ghost", "price_cents": 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, response) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{}", seeded.bouquet.id),
            Some(&token),
            Some(body!({ "name": "   ", "price_cents": 100 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&response)["error"]["code"], "invalid_input");

    let (status, response) = app
        .send(
            Method::PUT,
            &format!("/api/admin/bouquets/{}/tags", seeded.bouquet.id),
            Some(&token),
            Some(body!({ "tag_ids": [missing] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&response)["error"]["code"], "invalid_input");

    let mut after = app.cached_keys().await;
    let mut before = before;
    before.sort();
    after.sort();
    assert_eq!(before, after);
}

#[tokio::test]
async fn duplicate_tag_names_conflict() {
    let (app, _store) = TestApp::new();
    let token = app.admin_token().await;

    let (status, _) = app
        .send(Method::POST, "/api/admin/tags", Some(&token), Some(body!({ "name": "Spring" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) = app
        .send(Method::POST, "/api/admin/tags", Some(&token), Some(body!({ "name": "spring" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&response)["error"]["code"], "duplicate");
}

#[tokio::test]
async fn manual_invalidation_reports_counts_per_request() {
    let (app, _store) = TestApp::new();
    let seeded = seed(&app.catalog).await;
    let token = app.admin_token().await;
    let flower = seeded.rose.id;

    app.get("/api/flowers").await;
    app.get(&format!("/api/flowers/{flower}")).await;
    app.get("/api/categories").await;
    app.get("/api/tags").await;

    let (status, response) = app
        .send(
            Method::POST,
            "/api/cache/invalidate",
            Some(&token),
            Some(body!({
                "keys": ["tags:list", "bouquets:list"],
                "patterns": ["flower*", "featured:*"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&response),
        body!({
            "success": true,
            "results": [
                { "type": "keys", "count": 1 },
                { "type": "pattern", "pattern": "flower*", "count": 2 },
                { "type": "pattern", "pattern": "featured:*", "count": 0 }
            ]
        })
    );
    assert_eq!(app.cached_keys().await, vec!["categories:list"]);
}

#[tokio::test]
async fn manual_invalidation_with_nothing_requested_is_a_no_op() {
    let (app, _store) = TestApp::new();
    let token = app.admin_token().await;
    app.get("/api/tags").await;

    let (status, response) = app
        .send(Method::POST, "/api/cache/invalidate", Some(&token), Some(body!({})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&response), body!({ "success": true, "results": [] }));
    assert_eq!(app.cached_keys().await, vec!["tags:list"]);
}

#[tokio::test]
async fn manual_invalidation_reports_an_empty_key_list() {
    let (app, _store) = TestApp::new();
    let token = app.admin_token().await;
    app.get("/api/tags").await;

    let (status, response) = app
        .send(
            Method::POST,
            "/api/cache/invalidate",
            Some(&token),
            Some(body!({ "keys": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json(&response),
        body!({ "success": true, "results": [{ "type": "keys", "count": 0 }] })
    );
    assert_eq!(app.cached_keys().await, vec!["tags:list"]);
}
