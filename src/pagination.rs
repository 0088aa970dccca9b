use serde::Deserialize;
use utoipa::IntoParams;

use crate::deserializers::lenient_page;

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number, defaults to 1
    #[serde(default = "first_page", deserialize_with = "lenient_page")]
    #[param(value_type = Option<u32>)]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: first_page() }
    }
}

/// Slice of `items` shown on `page`. Out-of-range pages (including 0) are empty.
pub fn paginate<T>(page: usize, items: &[T]) -> &[T] {
    let Some(start) = page
        .checked_sub(1)
        .and_then(|p| p.checked_mul(QUESTIONS_PER_PAGE))
    else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = (start + QUESTIONS_PER_PAGE).min(items.len());
    &items[start..end]
}
