// src/handlers/users.rs

// Gestão de usuários, restrita a admin. Exclusão é desativação + snapshot
// na lixeira.

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
    models::{
        auth::{CreateUserPayload, UpdateUserPayload, User},
        document::DocumentVisibility,
        trash::TrashItemType,
    },
    services::{
        permissions::{Action, ActionContext, Actor, ensure},
        trash::ArchiveRequest,
    },
};

#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "Usuários",
    responses((status = 200, description = "Lista de usuários", body = Vec<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<User>>, AppError> {
    ensure(&Actor::from(&user), Action::ManageUsers, &ActionContext::Global)?;
    let users = app_state.user_repo.list().await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Usuários",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 409, description = "E-mail já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure(&Actor::from(&user), Action::ManageUsers, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let password_hash = app_state.auth_service.hash_password(&payload.password).await?;
    let created = app_state
        .user_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            &payload.email,
            &password_hash,
            payload.role,
            payload.department_id,
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "CRIAR_USUARIO", "User", created.id, &created.name)
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/usuarios/{id}",
    tag = "Usuários",
    request_body = UpdateUserPayload,
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<User>, AppError> {
    ensure(&Actor::from(&user), Action::ManageUsers, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state
        .user_repo
        .update(
            &app_state.db_pool,
            id,
            payload.name.as_deref(),
            payload.email.as_deref(),
            payload.role,
            payload.department_id,
            payload.active,
        )
        .await?;

    // Papel ou ativação mudaram: o token antigo não pode continuar valendo
    // com dados velhos.
    app_state.auth_service.invalidate_cached(id);

    app_state
        .audit_service
        .log_entity(user.id, "ATUALIZAR_USUARIO", "User", updated.id, &updated.name)
        .await;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/usuarios/{id}",
    tag = "Usuários",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário desativado e enviado para a lixeira"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure(&Actor::from(&user), Action::ManageUsers, &ActionContext::Global)?;

    if user.id == id {
        return Err(AppError::Conflict(
            "Não é possível excluir a própria conta.".to_string(),
        ));
    }

    let target = app_state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário".to_string()))?;

    let warning = app_state
        .trash_service
        .archive_best_effort(
            user.id,
            ArchiveRequest {
                item_type: TrashItemType::User,
                original_item_id: target.id,
                // password_hash nunca entra no snapshot (skip_serializing).
                payload: serde_json::to_value(&target)
                    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?,
                item_name: &target.name,
                item_description: Some(&target.email),
                process_id: None,
                department_id: target.department_id,
                company_id: None,
                visibility: DocumentVisibility::None,
                allowed_roles: &[],
                allowed_user_ids: &[],
            },
        )
        .await;

    app_state.user_repo.deactivate(&app_state.db_pool, id).await?;
    app_state.auth_service.invalidate_cached(id);

    app_state
        .audit_service
        .log_entity(user.id, "EXCLUIR_USUARIO", "User", target.id, &target.name)
        .await;

    Ok(Json(serde_json::json!({
        "message": "Usuário desativado e enviado para a lixeira.",
        "warning": warning,
    })))
}
