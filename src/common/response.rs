// src/common/response.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---
// Envelope padrão de todas as respostas
// ---

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: Utc::now(),
            error_message: None,
        }
    }

    /// 201 + envelope
    pub fn created(data: T) -> (StatusCode, Self) {
        (StatusCode::CREATED, Self::ok(data))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ---
// Paginação
// ---

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_desc: Option<bool>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    pub fn size(&self) -> i64 {
        self.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Satura em vez de estourar com `?page=` absurdo: a página simplesmente vem vazia.
    pub fn offset(&self) -> i64 {
        self.page().saturating_mul(self.size())
    }

    /// Termo de busca normalizado (trim + minúsculas); vazio vira None.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn descending(&self) -> bool {
        self.sort_desc.unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
    pub number_of_elements: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, query: &PageQuery, total_elements: i64) -> Self {
        let size = query.size();
        let number = query.page();
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        let number_of_elements = content.len() as i64;
        Self {
            empty: content.is_empty(),
            content,
            number,
            size,
            total_elements,
            total_pages,
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
            number_of_elements,
        }
    }

    /// Fatia uma lista já filtrada e ordenada em memória.
    pub fn slice(items: Vec<T>, query: &PageQuery) -> Self {
        let total = items.len() as i64;
        let content = items
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.size() as usize)
            .collect();
        Self::new(content, query, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            first: self.first,
            last: self.last,
            empty: self.empty,
            number_of_elements: self.number_of_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_size() {
        let q = PageQuery { size: Some(1000), page: Some(-2), ..Default::default() };
        assert_eq!(q.size(), MAX_PAGE_SIZE);
        assert_eq!(q.page(), 0);
        assert_eq!(PageQuery::default().size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn slices_and_reports_metadata() {
        let q = PageQuery { page: Some(1), size: Some(2), ..Default::default() };
        let page = Page::slice(vec![1, 2, 3, 4, 5], &q);
        assert_eq!(page.content, vec![3, 4]);
        assert_eq!(page.total_pages, 3);
        assert!(!page.first);
        assert!(!page.last);

        let empty = Page::<i32>::slice(vec![], &PageQuery::default());
        assert!(empty.empty && empty.first && empty.last);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn huge_page_numbers_yield_an_empty_last_page() {
        let q = PageQuery { page: Some(i64::MAX / 2), size: Some(10), ..Default::default() };
        assert_eq!(q.offset(), i64::MAX);

        let page = Page::slice(vec![1, 2, 3], &q);
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 3);
        assert!(page.last);

        let max = PageQuery { page: Some(i64::MAX), ..Default::default() };
        assert!(Page::slice(vec![1], &max).last);
    }
}
