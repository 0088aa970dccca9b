use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::deserializers::string_or_number;

pub type Id = i64;

/// Category id -> display label, serialised as a JSON object keyed by id.
pub type CategoryMap = BTreeMap<Id, String>;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    #[schema(value_type = i64)]
    pub id: Id,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

impl Category {
    pub fn map(categories: &[Category]) -> CategoryMap {
        categories.iter().map(|c| (c.id, c.kind.clone())).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Question {
    #[schema(value_type = i64)]
    pub id: Id,
    pub question: String,
    pub answer: String,
    pub category: String, // category id as text
    pub difficulty: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    #[serde(deserialize_with = "string_or_number")]
    #[schema(value_type = String)]
    pub category: String,
    pub difficulty: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SearchRequest {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuizCategory {
    #[serde(deserialize_with = "string_or_number")]
    #[schema(value_type = String)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl QuizCategory {
    /// `None` when the quiz draws from every category (id `0`).
    pub fn selector(&self) -> Option<&str> {
        match self.id.trim().parse::<Id>() {
            Ok(0) => None,
            _ => Some(self.id.trim()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuizRequest {
    #[schema(value_type = Vec<i64>)]
    pub previous_questions: Vec<Id>,
    pub quiz_category: QuizCategory,
}
