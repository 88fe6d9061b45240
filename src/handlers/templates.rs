// src/handlers/templates.rs

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
        auth::Role,
        document::DocumentVisibility,
        template::{CreateTemplatePayload, Template},
        trash::TrashItemType,
    },
    services::{flow::validate_flow, trash::ArchiveRequest},
};

#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses((status = 200, description = "Lista de templates", body = Vec<Template>)),
    security(("api_jwt" = []))
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<Template>>, AppError> {
    let templates = app_state.template_repo.list().await?;
    Ok(Json(templates))
}

#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = CreateTemplatePayload,
    responses(
        (status = 201, description = "Template criado", body = Template),
        (status = 400, description = "Fluxo inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    if user.role == Role::User {
        return Err(AppError::Forbidden(
            "Sem permissão para criar templates".to_string(),
        ));
    }
    payload.validate().map_err(AppError::ValidationError)?;
    validate_flow(&payload.department_flow)?;

    let distinct: std::collections::HashSet<i32> =
        payload.department_flow.iter().copied().collect();
    if app_state
        .department_repo
        .count_existing(&payload.department_flow)
        .await?
        != distinct.len() as i64
    {
        return Err(AppError::NotFound("Departamento do fluxo".to_string()));
    }

    let template = app_state
        .template_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.description.as_deref(),
            &payload.department_flow,
            payload.questionnaires_by_department.as_ref(),
            user.id,
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "CRIAR_TEMPLATE", "Template", template.id, &template.name)
        .await;

    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    delete,
    path = "/api/templates/{id}",
    tag = "Templates",
    params(("id" = i32, Path, description = "ID do template")),
    responses((status = 200, description = "Template excluído e enviado para a lixeira")),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    if user.role == Role::User {
        return Err(AppError::Forbidden(
            "Sem permissão para excluir templates".to_string(),
        ));
    }

    let template = app_state
        .template_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template".to_string()))?;

    let warning = app_state
        .trash_service
        .archive_best_effort(
            user.id,
            ArchiveRequest {
                item_type: TrashItemType::Template,
                original_item_id: template.id,
                payload: serde_json::to_value(&template)
                    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?,
                item_name: &template.name,
                item_description: template.description.as_deref(),
                process_id: None,
                department_id: None,
                company_id: None,
                visibility: DocumentVisibility::None,
                allowed_roles: &[],
                allowed_user_ids: &[],
            },
        )
        .await;

    app_state.template_repo.delete(&app_state.db_pool, id).await?;

    app_state
        .audit_service
        .log_entity(user.id, "EXCLUIR_TEMPLATE", "Template", template.id, &template.name)
        .await;

    Ok(Json(serde_json::json!({
        "message": "Template excluído e enviado para a lixeira.",
        "warning": warning,
    })))
}
