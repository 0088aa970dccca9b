use crate::error::ApiErrorBody;
use crate::models::{Category, NewQuestion, Question, QuizCategory, QuizRequest, SearchRequest};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_categories,
        crate::routes::list_questions,
        crate::routes::delete_question,
        crate::routes::create_question,
        crate::routes::search_questions,
        crate::routes::questions_by_category,
        crate::routes::quiz_question,
    ),
    components(schemas(
        Category, Question, NewQuestion, SearchRequest, QuizCategory, QuizRequest, ApiErrorBody,
        crate::routes::CategoriesResponse, crate::routes::QuestionsPage,
        crate::routes::DeletedResponse, crate::routes::CreatedResponse,
        crate::routes::SearchResponse, crate::routes::CategoryQuestionsResponse,
        crate::routes::QuizResponse
    )),
    tags(
        (name = "trivia", description = "Trivia questions, categories and quizzes"),
    )
)]
pub struct ApiDoc;
