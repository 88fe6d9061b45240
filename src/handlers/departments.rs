// src/handlers/departments.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        department::{CreateDepartmentPayload, Department, UpdateDepartmentPayload},
        document::DocumentVisibility,
        trash::TrashItemType,
    },
    services::{
        permissions::{Action, ActionContext, Actor, ensure},
        trash::ArchiveRequest,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDepartmentsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(
    get,
    path = "/api/departamentos",
    tag = "Departamentos",
    responses((status = 200, description = "Lista de departamentos", body = Vec<Department>)),
    security(("api_jwt" = []))
)]
pub async fn list_departments(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Query(query): Query<ListDepartmentsQuery>,
) -> Result<Json<Vec<Department>>, AppError> {
    let departments = app_state
        .department_repo
        .list(!query.include_inactive)
        .await?;
    Ok(Json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID do departamento")),
    responses(
        (status = 200, description = "Departamento", body = Department),
        (status = 404, description = "Departamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_department(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<Department>, AppError> {
    let department = app_state
        .department_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Departamento".to_string()))?;
    Ok(Json(department))
}

#[utoipa::path(
    post,
    path = "/api/departamentos",
    tag = "Departamentos",
    request_body = CreateDepartmentPayload,
    responses((status = 201, description = "Departamento criado", body = Department)),
    security(("api_jwt" = []))
)]
pub async fn create_department(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateDepartmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure(&Actor::from(&user), Action::ManageDepartments, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let department = app_state
        .department_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.description.as_deref(),
            payload.color.as_deref(),
            payload.icon.as_deref(),
            payload.display_order,
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "CRIAR_DEPARTAMENTO", "Department", department.id, &department.name)
        .await;

    Ok((StatusCode::CREATED, Json(department)))
}

#[utoipa::path(
    put,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    request_body = UpdateDepartmentPayload,
    params(("id" = i32, Path, description = "ID do departamento")),
    responses((status = 200, description = "Departamento atualizado", body = Department)),
    security(("api_jwt" = []))
)]
pub async fn update_department(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDepartmentPayload>,
) -> Result<Json<Department>, AppError> {
    ensure(&Actor::from(&user), Action::ManageDepartments, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let department = app_state
        .department_repo
        .update(
            &app_state.db_pool,
            id,
            payload.name.as_deref(),
            payload.description.as_deref(),
            payload.color.as_deref(),
            payload.icon.as_deref(),
            payload.display_order,
            payload.active,
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "ATUALIZAR_DEPARTAMENTO", "Department", department.id, &department.name)
        .await;

    Ok(Json(department))
}

#[utoipa::path(
    delete,
    path = "/api/departamentos/{id}",
    tag = "Departamentos",
    params(("id" = i32, Path, description = "ID do departamento")),
    responses(
        (status = 200, description = "Departamento desativado"),
        (status = 409, description = "Departamento em uso por processos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_department(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure(&Actor::from(&user), Action::ManageDepartments, &ActionContext::Global)?;

    let department = app_state
        .department_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Departamento".to_string()))?;

    if app_state.department_repo.referenced_by_processes(id).await? {
        return Err(AppError::Conflict(
            "Departamento em uso por processos ativos.".to_string(),
        ));
    }

    let warning = app_state
        .trash_service
        .archive_best_effort(
            user.id,
            ArchiveRequest {
                item_type: TrashItemType::Department,
                original_item_id: department.id,
                payload: serde_json::to_value(&department)
                    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?,
                item_name: &department.name,
                item_description: department.description.as_deref(),
                process_id: None,
                department_id: Some(department.id),
                company_id: None,
                visibility: DocumentVisibility::None,
                allowed_roles: &[],
                allowed_user_ids: &[],
            },
        )
        .await;

    app_state
        .department_repo
        .deactivate(&app_state.db_pool, id)
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "EXCLUIR_DEPARTAMENTO", "Department", department.id, &department.name)
        .await;

    Ok(Json(serde_json::json!({
        "message": "Departamento desativado e enviado para a lixeira.",
        "warning": warning,
    })))
}
