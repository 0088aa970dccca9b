use std::sync::Arc;
use actix_web::{web, HttpResponse};
use rand::seq::SliceRandom;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{json_error_handler, method_not_allowed, not_found, path_error_handler, ApiError};
use crate::headers::{api_cors, ApiHeaders};
use crate::models::*;
use crate::pagination::{paginate, PageQuery};
use crate::repo::Repo;

/// Label reported by the unfiltered question listing.
pub const DEFAULT_CURRENT_CATEGORY: &str = "Art";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/").route(web::get().to(index)));
    cfg.default_service(web::to(not_found));
    cfg.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(|_, _| ApiError::BadRequest.into()))
            .service(resource("/categories").route(web::get().to(list_categories)))
            .service(resource("/categories/{id}/questions").route(web::get().to(questions_by_category)))
            .service(
                resource("/questions")
                    .route(web::get().to(list_questions))
                    .route(web::post().to(create_question)),
            )
            // must precede /questions/{id}
            .service(resource("/questions/search").route(web::post().to(search_questions)))
            .service(resource("/questions/{id}").route(web::delete().to(delete_question)))
            .service(resource("/quizzes").route(web::post().to(quiz_question)))
            .default_service(web::to(not_found))
            .wrap(api_cors())
            .wrap(ApiHeaders::default()),
    );
}

// known path, unsupported method -> JSON 405
fn resource(path: &str) -> actix_web::Resource {
    web::resource(path).default_service(web::to(method_not_allowed))
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo> }

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesResponse {
    pub success: bool,
    #[schema(value_type = Object)]
    pub categories: CategoryMap,
    pub total_categories: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionsPage {
    pub success: bool,
    pub questions: Vec<Question>,
    #[schema(value_type = Object)]
    pub categories: CategoryMap,
    pub total_questions: usize,
    pub current_category: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
    #[schema(value_type = i64)]
    pub id: Id,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub status: bool,
    /// id of the new question
    #[schema(value_type = i64)]
    pub question: Id,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryQuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
    pub current_category: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    pub success: bool,
    pub question: Question,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Welcome to trivia API" }))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories keyed by id", body = CategoriesResponse),
        (status = 404, description = "No categories", body = crate::error::ApiErrorBody)
    )
)]
pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let categories = data.repo.list_categories().await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(CategoriesResponse {
        success: true,
        total_categories: categories.len(),
        categories: Category::map(&categories),
    }))
}

#[utoipa::path(
    get,
    path = "/api/questions",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of questions, ordered by id", body = QuestionsPage),
        (status = 404, description = "Page out of range", body = crate::error::ApiErrorBody)
    )
)]
pub async fn list_questions(data: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let questions = data.repo.list_questions().await?;
    let page = paginate(query.page, &questions);
    if page.is_empty() {
        return Err(ApiError::NotFound);
    }
    let categories = data.repo.list_categories().await?;
    Ok(HttpResponse::Ok().json(QuestionsPage {
        success: true,
        questions: page.to_vec(),
        categories: Category::map(&categories),
        total_questions: questions.len(),
        current_category: DEFAULT_CURRENT_CATEGORY.to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    params(("id" = i64, Path, description = "Question id")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Question not found", body = crate::error::ApiErrorBody),
        (status = 500, description = "Store failed to delete", body = crate::error::ApiErrorBody)
    )
)]
pub async fn delete_question(data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    data.repo.get_question(id).await?;
    data.repo.delete_question(id).await.map_err(|e| {
        log::error!("failed to delete question {id}: {e}");
        ApiError::from(e)
    })?;
    Ok(HttpResponse::NoContent().json(DeletedResponse { success: true, id }))
}

#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = NewQuestion,
    responses(
        (status = 201, description = "Question created", body = CreatedResponse),
        (status = 422, description = "Missing/invalid fields or insert failed", body = crate::error::ApiErrorBody)
    )
)]
pub async fn create_question(data: web::Data<AppState>, payload: web::Json<NewQuestion>) -> Result<HttpResponse, ApiError> {
    let question = data.repo.create_question(payload.into_inner()).await.map_err(|e| {
        log::error!("failed to create question: {e}");
        ApiError::Unprocessable
    })?;
    Ok(HttpResponse::Created().json(CreatedResponse { status: true, question: question.id }))
}

#[utoipa::path(
    post,
    path = "/api/questions/search",
    request_body = SearchRequest,
    params(PageQuery),
    responses(
        (status = 200, description = "Matching questions", body = SearchResponse),
        (status = 404, description = "No match", body = crate::error::ApiErrorBody)
    )
)]
pub async fn search_questions(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
    payload: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let matches = data.repo.search_questions(&payload.search_term).await?;
    if matches.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(SearchResponse {
        success: true,
        questions: paginate(query.page, &matches).to_vec(),
        total_questions: matches.len(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/questions",
    params(("id" = i64, Path, description = "Category id"), PageQuery),
    responses(
        (status = 200, description = "Questions in the category", body = CategoryQuestionsResponse),
        (status = 404, description = "Unknown category or empty page", body = crate::error::ApiErrorBody)
    )
)]
pub async fn questions_by_category(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let category = data.repo.get_category(path.into_inner()).await?;
    let questions = data.repo.questions_in_category(&category.id.to_string()).await?;
    let page = paginate(query.page, &questions);
    if page.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(HttpResponse::Ok().json(CategoryQuestionsResponse {
        success: true,
        questions: page.to_vec(),
        total_questions: questions.len(),
        current_category: category.kind,
    }))
}

#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = QuizRequest,
    responses(
        (status = 200, description = "A random unasked question", body = QuizResponse),
        (status = 422, description = "Malformed request or no questions left", body = crate::error::ApiErrorBody)
    )
)]
pub async fn quiz_question(data: web::Data<AppState>, payload: web::Json<QuizRequest>) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let pool = data
        .repo
        .quiz_pool(&req.previous_questions, req.quiz_category.selector())
        .await
        .map_err(|e| {
            log::error!("failed to load quiz pool: {e}");
            ApiError::Unprocessable
        })?;
    let question = pool
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or(ApiError::Unprocessable)?;
    Ok(HttpResponse::Ok().json(QuizResponse { success: true, question }))
}
