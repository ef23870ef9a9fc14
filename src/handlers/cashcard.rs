use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::AppJson;
use crate::auth::Principal;
use crate::error::ApiError;
use crate::store::{CashCard, PageRequest, SortDir, SortField};
use crate::AppState;

/// Client-writable card fields. Any `id` or `owner` key in a request body is
/// ignored; those values only ever come from the server side.
#[derive(Debug, Deserialize)]
pub struct CardRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

/// GET /cashcard/:id - one of the caller's cards, or 404.
///
/// A card owned by someone else yields the same 404 as a missing one; the
/// store query conjoins id and owner, so handlers never see foreign rows.
pub async fn card_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match state.store.find_one(id, &principal.username).await? {
        Some(card) => Ok(Json(card)),
        None => Err(ApiError::not_found("Cash card not found")),
    }
}

/// GET /cashcard?page=&size=&sort= - one page of the caller's cards.
pub async fn card_list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = page_request(&query)?;
    let cards = state.store.find_page(&principal.username, &page).await?;
    Ok(Json(cards))
}

/// POST /cashcard - create a card owned by the caller.
pub async fn card_create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(request): AppJson<CardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let card = CashCard {
        id: None,
        amount: request.amount,
        owner: principal.username.clone(),
    };

    let saved = state.store.save(card).await?;
    let id = saved
        .id
        .ok_or_else(|| ApiError::internal_server_error("Store returned a card without an id"))?;

    Ok((StatusCode::CREATED, [(header::LOCATION, format!("/cashcard/{}", id))]))
}

/// PUT /cashcard/:id - strict replace of the amount.
///
/// The stored id and owner are reused from the existing record, never taken
/// from the body or the path alone; no upsert for unknown ids.
pub async fn card_put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    AppJson(request): AppJson<CardRequest>,
) -> Result<StatusCode, ApiError> {
    let existing = state
        .store
        .find_one(id, &principal.username)
        .await?
        .ok_or_else(|| ApiError::not_found("Cash card not found"))?;

    let updated = CashCard {
        id: existing.id,
        amount: request.amount,
        owner: existing.owner,
    };
    state.store.save(updated).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cashcard/:id - delete one of the caller's cards.
pub async fn card_delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.exists(id, &principal.username).await? {
        return Err(ApiError::not_found("Cash card not found"));
    }

    state.store.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn page_request(query: &ListQuery) -> Result<PageRequest, ApiError> {
    let config = crate::config::config();

    let page = query.page.unwrap_or(0).max(0);
    let size = query
        .size
        .unwrap_or(config.pagination.default_size)
        .clamp(1, config.pagination.max_size);

    let (sort, dir) = match query.sort.as_deref() {
        Some(raw) => parse_sort(raw).map_err(ApiError::bad_request)?,
        None => (SortField::Amount, SortDir::Asc),
    };

    Ok(PageRequest { page, size, sort, dir })
}

/// Parse a `field,direction` sort parameter (direction optional, default
/// ascending). Unknown fields and directions are rejected.
fn parse_sort(raw: &str) -> Result<(SortField, SortDir), String> {
    let mut parts = raw.splitn(2, ',');

    let field = match parts.next().unwrap_or("").trim() {
        "amount" => SortField::Amount,
        "id" => SortField::Id,
        "owner" => SortField::Owner,
        other => return Err(format!("unknown sort field '{}'", other)),
    };

    let dir = match parts.next().map(str::trim) {
        None | Some("") | Some("asc") => SortDir::Asc,
        Some("desc") => SortDir::Desc,
        Some(other) => return Err(format!("unknown sort direction '{}'", other)),
    };

    Ok((field, dir))
}
