#![cfg(feature = "inmem-store")]

use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use trivia_api::models::{Category, Id, NewQuestion, Question};
use trivia_api::repo::inmem::InMemRepo;
use trivia_api::repo::{CategoryRepo, QuestionRepo, RepoError, RepoResult};
use trivia_api::{config, AppState};

macro_rules! init_app {
    ($repo:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState { repo: Arc::new($repo) }))
                .configure(config),
        )
        .await
    };
}

fn ids(v: &Value) -> Vec<i64> {
    v["questions"].as_array().unwrap().iter().map(|q| q["id"].as_i64().unwrap()).collect()
}

fn assert_error_body(v: &Value, code: u16, message: &str) {
    assert_eq!(v["success"], false);
    assert_eq!(v["error"], code);
    assert_eq!(v["message"], message);
}

#[actix_web::test]
async fn test_root_greeting() {
    let app = init_app!(InMemRepo::new());
    let req = test::TestRequest::get().uri("/").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(v["message"], "Welcome to trivia API");
}

#[actix_web::test]
async fn test_get_categories() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["total_categories"], 6);
    assert_eq!(v["categories"].as_object().unwrap().len(), 6);
    assert_eq!(v["categories"]["3"], "Geography");
}

#[actix_web::test]
async fn test_get_categories_on_empty_store_is_404() {
    let app = init_app!(InMemRepo::new());
    let req = test::TestRequest::get().uri("/api/categories").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 404, "Page not found");
}

#[actix_web::test]
async fn test_get_questions_paginates_by_id() {
    let app = init_app!(InMemRepo::seeded());

    let req = test::TestRequest::get().uri("/api/questions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["total_questions"], 19);
    assert_eq!(v["current_category"], "Art");
    assert_eq!(v["categories"]["1"], "Science");
    let first = ids(&v);
    assert_eq!(first.len(), 10);
    assert!(first.windows(2).all(|w| w[0] < w[1]));

    let req = test::TestRequest::get().uri("/api/questions?page=2").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    let second = ids(&v);
    assert_eq!(second.len(), 9);
    assert!(first.last().unwrap() < second.first().unwrap());

    // non-numeric page falls back to the first page
    let req = test::TestRequest::get().uri("/api/questions?page=abc").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&v), first);
}

#[actix_web::test]
async fn test_cannot_request_beyond_valid_page() {
    let app = init_app!(InMemRepo::seeded());
    for uri in ["/api/questions?page=1000", "/api/questions?page=0"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{uri}");
        let v: Value = test::read_body_json(resp).await;
        assert_error_body(&v, 404, "Page not found");
    }
}

#[actix_web::test]
async fn test_numeric_pages_past_usize_or_below_one_are_404() {
    let app = init_app!(InMemRepo::seeded());
    for uri in [
        "/api/questions?page=99999999999999999999999",
        "/api/questions?page=-1",
        "/api/categories/3/questions?page=99999999999999999999999",
        "/api/categories/3/questions?page=-1",
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{uri}");
        let v: Value = test::read_body_json(resp).await;
        assert_error_body(&v, 404, "Page not found");
    }
}

#[actix_web::test]
async fn test_delete_question() {
    let repo = InMemRepo::seeded();
    let app = init_app!(repo.clone());

    let req = test::TestRequest::delete().uri("/api/questions/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);
    assert!(matches!(repo.get_question(5).await, Err(RepoError::NotFound)));

    // gone from listings too
    let req = test::TestRequest::get().uri("/api/categories/4/questions").to_request();
    let v: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&v), vec![9, 12, 23]);

    let req = test::TestRequest::delete().uri("/api/questions/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_error_if_question_to_delete_does_not_exist() {
    let app = init_app!(InMemRepo::seeded());
    for uri in ["/api/questions/1000", "/api/questions/abc"] {
        let req = test::TestRequest::delete().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{uri}");
        let v: Value = test::read_body_json(resp).await;
        assert_error_body(&v, 404, "Page not found");
    }
}

#[actix_web::test]
async fn test_delete_store_failure_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trivia.json");
    std::fs::create_dir(&path).unwrap(); // snapshot writes fail
    let repo = InMemRepo::open(&path, true);
    let app = init_app!(repo.clone());

    let req = test::TestRequest::delete().uri("/api/questions/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 500, "Internal server error");
    assert!(repo.get_question(5).await.is_ok());
}

#[actix_web::test]
async fn test_add_new_question() {
    let repo = InMemRepo::seeded();
    let app = init_app!(repo.clone());

    let req = test::TestRequest::post()
        .uri("/api/questions")
        .set_json(json!({
            "question": "Who painted the ceiling of the Sistine Chapel?",
            "answer": "Michelangelo",
            "category": 2,
            "difficulty": 3
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["status"], true);
    let id = v["question"].as_i64().unwrap();

    let stored = repo.get_question(id).await.unwrap();
    assert_eq!(stored.answer, "Michelangelo");
    assert_eq!(stored.category, "2");
    assert_eq!(stored.difficulty, 3);
}

#[actix_web::test]
async fn test_add_question_rejects_bad_payloads() {
    let app = init_app!(InMemRepo::seeded());

    // missing answer/difficulty
    let req = test::TestRequest::post()
        .uri("/api/questions")
        .set_json(json!({"question": "Half a question?", "category": "1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 422, "Unprocessable entity");

    // difficulty of the wrong type
    let req = test::TestRequest::post()
        .uri("/api/questions")
        .set_json(json!({"question": "q", "answer": "a", "category": "1", "difficulty": "hard"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    // not JSON at all
    let req = test::TestRequest::post()
        .uri("/api/questions")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 400, "Bad request");
}

#[actix_web::test]
async fn test_search_question() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::post()
        .uri("/api/questions/search")
        .set_json(json!({"searchTerm": "WHAT"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["total_questions"], 8);
    assert_eq!(ids(&v), vec![2, 4, 6, 9, 13, 17, 20, 22]);
}

#[actix_web::test]
async fn test_search_results_are_paginated() {
    let questions = (1..=12)
        .map(|id| Question {
            id,
            question: format!("Which river is number {id}?"),
            answer: "The Nile".into(),
            category: "3".into(),
            difficulty: 1,
        })
        .collect();
    let app = init_app!(InMemRepo::with_data(vec![Category { id: 3, kind: "Geography".into() }], questions));

    let search = |page: &str| {
        test::TestRequest::post()
            .uri(&format!("/api/questions/search{page}"))
            .set_json(json!({"searchTerm": "river"}))
            .to_request()
    };

    let v: Value = test::call_and_read_body_json(&app, search("")).await;
    assert_eq!(v["total_questions"], 12);
    assert_eq!(ids(&v), (1..=10).collect::<Vec<i64>>());

    let v: Value = test::call_and_read_body_json(&app, search("?page=2")).await;
    assert_eq!(v["total_questions"], 12);
    assert_eq!(ids(&v), vec![11, 12]);

    // matches exist, so a page past them is an empty success
    let resp = test::call_service(&app, search("?page=3")).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["total_questions"], 12);
    assert!(ids(&v).is_empty());
}

#[actix_web::test]
async fn test_search_returns_error_if_not_found() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::post()
        .uri("/api/questions/search")
        .set_json(json!({"searchTerm": "zebra"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 404, "Page not found");
}

#[actix_web::test]
async fn test_get_questions_by_category() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::get().uri("/api/categories/3/questions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["current_category"], "Geography");
    assert_eq!(v["total_questions"], 3);
    for q in v["questions"].as_array().unwrap() {
        assert_eq!(q["category"], "3");
    }
}

#[actix_web::test]
async fn test_cannot_get_questions_by_category_that_dont_exist() {
    let repo = InMemRepo::with_data(
        vec![Category { id: 1, kind: "Science".into() }, Category { id: 7, kind: "Music".into() }],
        vec![Question {
            id: 1,
            question: "What is H2O?".into(),
            answer: "Water".into(),
            category: "1".into(),
            difficulty: 1,
        }],
    );
    let app = init_app!(repo);

    // unknown category, and a known category without questions
    for uri in ["/api/categories/140/questions", "/api/categories/7/questions"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "{uri}");
        let v: Value = test::read_body_json(resp).await;
        assert_error_body(&v, 404, "Page not found");
    }
}

#[actix_web::test]
async fn test_get_random_quiz() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::post()
        .uri("/api/quizzes")
        .set_json(json!({
            "previous_questions": [13],
            "quiz_category": {"id": "3", "type": "Geography"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["success"], true);
    assert_eq!(v["question"]["category"], "3");
    let id = v["question"]["id"].as_i64().unwrap();
    assert!(id == 14 || id == 15);
}

#[actix_web::test]
async fn test_quiz_any_category_samples_remaining_pool() {
    let app = init_app!(InMemRepo::seeded());
    let previous: Vec<i64> = vec![2, 4, 5, 6, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22];
    let req = test::TestRequest::post()
        .uri("/api/quizzes")
        .set_json(json!({"previous_questions": previous, "quiz_category": {"id": 0, "type": "click"}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let v: Value = test::read_body_json(resp).await;
    assert_eq!(v["question"]["id"], 23);
}

#[actix_web::test]
async fn test_quiz_exhausted_pool_is_422() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::post()
        .uri("/api/quizzes")
        .set_json(json!({"previous_questions": [13, 14, 15], "quiz_category": {"id": 3}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 422, "Unprocessable entity");
}

#[actix_web::test]
async fn test_422_get_quiz() {
    let app = init_app!(InMemRepo::seeded());
    let req = test::TestRequest::post()
        .uri("/api/quizzes")
        .set_json(json!({"previous_questions": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 422, "Unprocessable entity");
}

#[actix_web::test]
async fn test_unknown_routes_and_methods() {
    let app = init_app!(InMemRepo::seeded());

    let req = test::TestRequest::put().uri("/api/categories").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 405, "Method not allowed");

    let req = test::TestRequest::get().uri("/api/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 404, "Page not found");
}

#[actix_web::test]
async fn test_unknown_paths_outside_api_are_json_errors() {
    let app = init_app!(InMemRepo::seeded());

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 404, "Page not found");

    let req = test::TestRequest::post().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 405);
    let v: Value = test::read_body_json(resp).await;
    assert_error_body(&v, 405, "Method not allowed");
}

/// Store whose connection pool is exhausted.
struct UnavailableRepo;

#[async_trait]
impl CategoryRepo for UnavailableRepo {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Err(RepoError::Unavailable)
    }

    async fn get_category(&self, _id: Id) -> RepoResult<Category> {
        Err(RepoError::Unavailable)
    }
}

#[async_trait]
impl QuestionRepo for UnavailableRepo {
    async fn list_questions(&self) -> RepoResult<Vec<Question>> {
        Err(RepoError::Unavailable)
    }

    async fn get_question(&self, _id: Id) -> RepoResult<Question> {
        Err(RepoError::Unavailable)
    }

    async fn create_question(&self, _new: NewQuestion) -> RepoResult<Question> {
        Err(RepoError::Unavailable)
    }

    async fn delete_question(&self, _id: Id) -> RepoResult<()> {
        Err(RepoError::Unavailable)
    }

    async fn search_questions(&self, _term: &str) -> RepoResult<Vec<Question>> {
        Err(RepoError::Unavailable)
    }

    async fn questions_in_category(&self, _category: &str) -> RepoResult<Vec<Question>> {
        Err(RepoError::Unavailable)
    }

    async fn quiz_pool(&self, _previous: &[Id], _category: Option<&str>) -> RepoResult<Vec<Question>> {
        Err(RepoError::Unavailable)
    }
}

#[actix_web::test]
async fn test_unavailable_store_is_503() {
    let app = init_app!(UnavailableRepo);
    for uri in ["/api/categories", "/api/questions", "/api/categories/1/questions"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 503, "{uri}");
        let v: Value = test::read_body_json(resp).await;
        assert_error_body(&v, 503, "Server Unavailable");
    }

    let req = test::TestRequest::delete().uri("/api/questions/5").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
}
