use axum::{
    extract::{FromRef, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::instrument;

use crate::{
    auth::extractors::authorize,
    error::AppError,
    resources::{service::ResourceService, Operation, Record, Resource},
    response::{ApiJson, ApiResponse},
    state::AppState,
};

// Bodies are taken as `Result` and only unwrapped after the access check.

async fn gate<R: Resource>(
    state: &AppState,
    headers: &HeaderMap,
    op: Operation,
) -> Result<ResourceService<R>, AppError> {
    authorize(state, headers, R::access(op)).await?;
    Ok(ResourceService::from_ref(state))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table()))]
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<Record<R>>>>, AppError> {
    let service = gate::<R>(&state, &headers, Operation::List).await?;
    Ok(Json(ApiResponse::list(service.list().await?)))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table(), id = %id))]
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Record<R>>>, AppError> {
    let service = gate::<R>(&state, &headers, Operation::Get).await?;
    Ok(Json(ApiResponse::data(service.get(&id).await?)))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table()))]
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<ApiJson<R::Input>, AppError>,
) -> Result<(StatusCode, Json<ApiResponse<Record<R>>>), AppError> {
    let service = gate::<R>(&state, &headers, Operation::Create).await?;
    let ApiJson(input) = body?;
    let record = service.create(input).await?;
    let message = format!("{} created successfully", R::COLLECTION.label());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(record).with_message(message)),
    ))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table(), id = %id))]
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Result<ApiJson<R::Input>, AppError>,
) -> Result<Json<ApiResponse<Record<R>>>, AppError> {
    let service = gate::<R>(&state, &headers, Operation::Update).await?;
    let ApiJson(input) = body?;
    let record = service.update(&id, input).await?;
    let message = format!("{} updated successfully", R::COLLECTION.label());
    Ok(Json(ApiResponse::data(record).with_message(message)))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table(), id = %id))]
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Record<R>>>, AppError> {
    let service = gate::<R>(&state, &headers, Operation::Delete).await?;
    let record = service.delete(&id).await?;
    let message = format!("{} deleted successfully", R::COLLECTION.label());
    Ok(Json(ApiResponse::data(record).with_message(message)))
}

#[instrument(skip_all, fields(collection = R::COLLECTION.table()))]
pub async fn delete_all<R: Resource>(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let service = gate::<R>(&state, &headers, Operation::DeleteAll).await?;
    let removed = service.delete_all().await?;
    let message = format!("Successfully deleted {removed} {}", R::COLLECTION.table());
    Ok(Json(ApiResponse::count(removed, message)))
}
