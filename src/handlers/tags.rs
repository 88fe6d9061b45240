// src/handlers/tags.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::tag::{CreateTagPayload, Tag},
    services::permissions::{Action, ActionContext, Actor, ensure},
};

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "Tags",
    responses((status = 200, description = "Lista de tags", body = Vec<Tag>)),
    security(("api_jwt" = []))
)]
pub async fn list_tags(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = app_state.tag_repo.list().await?;
    Ok(Json(tags))
}

#[utoipa::path(
    post,
    path = "/api/tags",
    tag = "Tags",
    request_body = CreateTagPayload,
    responses(
        (status = 201, description = "Tag criada", body = Tag),
        (status = 409, description = "Nome já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure(&Actor::from(&user), Action::ManageTags, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let tag = app_state
        .tag_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.color.as_deref().unwrap_or("#e2e8f0"),
            payload.text_color.as_deref().unwrap_or("#1a202c"),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    tag = "Tags",
    params(("id" = i32, Path, description = "ID da tag")),
    responses((status = 200, description = "Tag excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure(&Actor::from(&user), Action::ManageTags, &ActionContext::Global)?;

    app_state
        .tag_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag".to_string()))?;

    app_state.tag_repo.delete(&app_state.db_pool, id).await?;
    Ok(Json(serde_json::json!({ "message": "Tag excluída." })))
}
