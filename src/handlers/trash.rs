// src/handlers/trash.rs

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{document::Document, trash::TrashItem},
};

#[utoipa::path(
    get,
    path = "/api/lixeira",
    tag = "Lixeira",
    responses((status = 200, description = "Itens na janela de retenção visíveis para o usuário", body = Vec<TrashItem>)),
    security(("api_jwt" = []))
)]
pub async fn list_trash(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<TrashItem>>, AppError> {
    let items = app_state.trash_service.list(&user).await?;
    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/api/lixeira/{id}/restaurar",
    tag = "Lixeira",
    params(("id" = i32, Path, description = "ID do item na lixeira")),
    responses(
        (status = 200, description = "Documento restaurado", body = Document),
        (status = 404, description = "Item inexistente ou fora da janela de retenção")
    ),
    security(("api_jwt" = []))
)]
pub async fn restore_trash_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Document>, AppError> {
    let document = app_state.trash_service.restore_document(&user, id).await?;
    Ok(Json(document))
}
