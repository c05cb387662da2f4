use super::{ApiError, AppState};
use crate::db::models::{ProductDetail, ProductPage};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

pub const DEFAULT_PER_PAGE: i64 = 12;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub per_page: Option<i64>,
}

pub async fn list_jeans(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>, ApiError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if page < 1 {
        return Err(ApiError::BadRequest("page must be at least 1".to_string()));
    }
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(ApiError::BadRequest(format!(
            "per_page must be between 1 and {}",
            MAX_PER_PAGE
        )));
    }

    if (page - 1).checked_mul(per_page).is_none() {
        return Err(ApiError::BadRequest("page is out of range".to_string()));
    }

    let search = params.search.unwrap_or_default();
    let listing = state.db.list_products(&search, page, per_page)?;
    Ok(Json(listing))
}

pub async fn get_jean(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductDetail>, ApiError> {
    state
        .db
        .get_product(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))
}
