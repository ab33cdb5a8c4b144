//! Scene search and filter options.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

struct Fixture {
    app: axum::Router,
    token: String,
    universe: i64,
    main: i64,
    rain: i64,
    rania: i64,
}

async fn post_id(app: &axum::Router, uri: &str, body: Value, token: &str) -> i64 {
    let response = post_json_auth(app.clone(), uri, body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn fixture(pool: PgPool) -> Fixture {
    let app = common::build_test_app(pool);
    let (_, token) = common::register(&app, "writer").await;
    let universe = common::create_universe(&app, &token, "Saga", false).await;
    let main = common::create_timeline(&app, &token, universe, "Main").await;
    let side = common::create_timeline(&app, &token, universe, "Side").await;

    let rain = post_id(
        &app,
        &format!("/api/v1/universes/{universe}/tags"),
        json!({ "name": "Rain" }),
        &token,
    )
    .await;
    let rania = post_id(
        &app,
        &format!("/api/v1/universes/{universe}/characters"),
        json!({ "name": "Rania" }),
        &token,
    )
    .await;

    common::create_scene(
        &app,
        &token,
        main,
        json!({
            "title": "Station",
            "content": "<p>Rania waits at the station while the rain keeps falling.</p>",
            "mood": "melancholy",
            "tag_ids": [rain],
            "character_ids": [rania],
        }),
    )
    .await;
    common::create_scene(
        &app,
        &token,
        main,
        json!({ "title": "Market", "summary": "Buying fruit at the station market", "mood": "happy" }),
    )
    .await;
    common::create_scene(
        &app,
        &token,
        side,
        json!({ "title": "Rooftop", "content": "Stars", "tag_ids": [rain] }),
    )
    .await;

    Fixture {
        app,
        token,
        universe,
        main,
        rain,
        rania,
    }
}

fn titles(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["title"].as_str().unwrap().to_string())
        .collect()
}

async fn search(f: &Fixture, query: &str) -> Value {
    let response = get_auth(
        f.app.clone(),
        &format!("/api/v1/universes/{}/search?{query}", f.universe),
        &f.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn text_query_returns_context(pool: PgPool) {
    let f = fixture(pool).await;

    let json = search(&f, "q=station&sort=title").await;

    assert_eq!(titles(&json), vec!["Market", "Station"]);
    let market = &json["data"][0];
    assert_eq!(market["match_context"], "Buying fruit at the station market");
    let station = &json["data"][1];
    assert!(station["match_context"]
        .as_str()
        .unwrap()
        .contains("waits at the station"));
    assert_eq!(station["timeline_name"], "Main");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn id_filters_accept_bracketed_keys(pool: PgPool) {
    let f = fixture(pool).await;

    let json = search(&f, &format!("tag_ids[]={}&sort=title", f.rain)).await;
    assert_eq!(titles(&json), vec!["Rooftop", "Station"]);

    let json = search(&f, &format!("tag_ids%5B%5D={}&timeline_id={}", f.rain, f.main)).await;
    assert_eq!(titles(&json), vec!["Station"]);

    let json = search(&f, &format!("character_ids={}", f.rania)).await;
    assert_eq!(titles(&json), vec!["Station"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn mood_filter_and_empty_result(pool: PgPool) {
    let f = fixture(pool).await;

    assert_eq!(titles(&search(&f, "mood=happy").await), vec!["Market"]);
    assert!(titles(&search(&f, "q=submarine").await).is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn filters_list_universe_options(pool: PgPool) {
    let f = fixture(pool).await;

    let response = get_auth(
        f.app.clone(),
        &format!("/api/v1/universes/{}/search/filters", f.universe),
        &f.token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["moods"], json!(["happy", "melancholy"]));
    assert_eq!(json["data"]["tags"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["characters"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["timelines"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_in_someone_elses_private_universe_is_forbidden(pool: PgPool) {
    let f = fixture(pool).await;
    let (_, stranger) = common::register(&f.app, "stranger").await;

    let response = get_auth(
        f.app.clone(),
        &format!("/api/v1/universes/{}/search?q=rain", f.universe),
        &stranger,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
