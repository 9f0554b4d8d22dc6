use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, AppConfig};
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const INDEX: &str = "\
wisata: (1, 3), (2, 2)
pantai: (1, 2), (4, 2)
bali: (1, 1), (4, 3)
indah: (1, 1), (2, 1), (4, 2)
gunung: (2, 3)
bromo: (2, 2)
kuliner: (3, 2)
makanan: (3, 3)
sunset: (4, 1)
museum: (5, 2)
sejarah: (5, 3)
";

const DOCUMENTS: &str = "\
Doc ID,Category,Title_clean,Date,Image URL,URL,Content
1,Wisata,Pantai Bali,2024-01-01,,http://example.com/1,Pantai indah di Bali
2,Wisata,Gunung Bromo,2024-01-02,,http://example.com/2,Gunung yang indah
3,Kuliner,Makanan Indonesia,2024-01-03,,http://example.com/3,Kuliner enak
4,Wisata,Pantai Bali Sunset,2024-01-04,,http://example.com/4,Sunset di Bali
5,Sejarah,Museum Nasional,2024-01-05,,http://example.com/5,Museum sejarah
";

fn write_data(dir: &std::path::Path) {
    fs::write(dir.join("inverted_index.txt"), INDEX).unwrap();
    fs::write(dir.join("merged_combined_data.csv"), DOCUMENTS).unwrap();
}

fn app_with(dir: &std::path::Path, per_page: usize, admin_token: Option<&str>) -> Router {
    let mut config = AppConfig::new(dir);
    config.per_page = per_page;
    config.admin_token = admin_token.map(str::to_string);
    build_app(config).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn ids(json: &Value) -> Vec<u64> {
    json["results"].as_array().unwrap().iter().map(|r| r["content_id"].as_u64().unwrap()).collect()
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let (status, _) = get(app_with(dir.path(), 10, None), "/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 10, None);

    let (status, json) = get(app, "/search?query=pantai+bali&algorithm=cosine").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["algorithm"], "cosine");
    assert_eq!(json["total_results"], 2);
    assert_eq!(ids(&json), vec![4, 1]);
    let first = &json["results"][0];
    assert_eq!(first["title"], "Pantai Bali Sunset");
    assert!(first["similarity_percent"].as_str().unwrap().ends_with('%'));
}

#[tokio::test]
async fn unknown_algorithm_falls_back_to_jaccard() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let (_, json) = get(app_with(dir.path(), 10, None), "/search?query=sunset&algorithm=tfidf").await;
    assert_eq!(json["algorithm"], "jaccard");
    assert_eq!(ids(&json), vec![4]);
    assert_eq!(json["results"][0]["similarity_percent"], "25.00%");
}

#[tokio::test]
async fn category_filter_and_empty_query() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 10, None);

    let (_, json) = get(app.clone(), "/search?query=indah&category=wisata").await;
    assert!(json["results"].as_array().unwrap().iter().all(|r| r["category"] == "Wisata"));
    assert_eq!(json["total_results"], 3);

    let (status, json) = get(app, "/search?query=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_results"], 0);
    assert_eq!(json["total_pages"], 0);
}

#[tokio::test]
async fn pages_are_clamped() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 2, None);

    let (_, json) = get(app.clone(), "/search?query=indah&page=9").await;
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["current_page"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["page_range"], serde_json::json!([1, 2]));

    let (_, json) = get(app, "/search?query=indah&page=abc").await;
    assert_eq!(json["current_page"], 1);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn search_accepts_form_posts() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let req = Request::post("/search?page=1")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("query=museum+sejarah&algorithm=bm25"))
        .unwrap();
    let (status, json) = send(app_with(dir.path(), 10, None), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["algorithm"], "bm25");
    assert_eq!(ids(&json), vec![5]);
    assert_eq!(json["results"][0]["similarity"], 1.0);
}

#[tokio::test]
async fn content_lookup() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 10, None);

    let (status, json) = get(app.clone(), "/content/3?query=kuliner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"]["title"], "Makanan Indonesia");
    assert_eq!(json["query"], "kuliner");

    let (status, _) = get(app.clone(), "/content/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get(app, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn reload_swaps_in_new_data() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 10, Some("secret"));

    let req = Request::post("/admin/reload").body(Body::empty()).unwrap();
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    fs::write(dir.path().join("inverted_index.txt"), format!("{INDEX}lombok: (6, 2)\n")).unwrap();
    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, json) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 6);

    let (_, json) = get(app, "/search?query=lombok").await;
    assert_eq!(ids(&json), vec![6]);
    assert_eq!(json["results"][0]["title"], "Unknown Title");
}

#[tokio::test]
async fn failed_reload_keeps_current_engine() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let app = app_with(dir.path(), 10, Some("secret"));

    fs::write(dir.path().join("inverted_index.txt"), "").unwrap();
    let req = Request::post("/admin/reload").header("X-ADMIN-TOKEN", "secret").body(Body::empty()).unwrap();
    let (status, _) = send(app.clone(), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, json) = get(app, "/search?query=sunset").await;
    assert_eq!(ids(&json), vec![4]);
}

#[tokio::test]
async fn huge_page_number_with_no_hits_is_served() {
    let dir = tempdir().unwrap();
    write_data(dir.path());
    let (status, json) = get(app_with(dir.path(), 10, None), "/search?query=zzzz&page=9223372036854775807").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_results"], 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}
