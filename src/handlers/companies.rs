// src/handlers/companies.rs

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
        company::{Company, CreateCompanyPayload, UpdateCompanyPayload},
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
    path = "/api/empresas",
    tag = "Empresas",
    responses((status = 200, description = "Lista de empresas", body = Vec<Company>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
) -> Result<Json<Vec<Company>>, AppError> {
    let companies = app_state.company_repo.list().await?;
    Ok(Json(companies))
}

#[utoipa::path(
    post,
    path = "/api/empresas",
    tag = "Empresas",
    request_body = CreateCompanyPayload,
    responses(
        (status = 201, description = "Empresa criada", body = Company),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure(&Actor::from(&user), Action::CreateCompany, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let company = app_state
        .company_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.cnpj.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "CRIAR_EMPRESA", "Company", company.id, &company.name)
        .await;

    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    put,
    path = "/api/empresas/{id}",
    tag = "Empresas",
    request_body = UpdateCompanyPayload,
    params(("id" = i32, Path, description = "ID da empresa")),
    responses((status = 200, description = "Empresa atualizada", body = Company)),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<Json<Company>, AppError> {
    ensure(&Actor::from(&user), Action::EditCompany, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let company = app_state
        .company_repo
        .update(
            &app_state.db_pool,
            id,
            payload.name.as_deref(),
            payload.cnpj.as_deref(),
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;

    app_state
        .audit_service
        .log_entity(user.id, "ATUALIZAR_EMPRESA", "Company", company.id, &company.name)
        .await;

    Ok(Json(company))
}

#[utoipa::path(
    delete,
    path = "/api/empresas/{id}",
    tag = "Empresas",
    params(("id" = i32, Path, description = "ID da empresa")),
    responses((status = 200, description = "Empresa excluída e enviada para a lixeira")),
    security(("api_jwt" = []))
)]
pub async fn delete_company(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    // O mesmo gate da criação: só admin apaga empresa.
    ensure(&Actor::from(&user), Action::CreateCompany, &ActionContext::Global)?;

    let company = app_state
        .company_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Empresa".to_string()))?;

    let warning = app_state
        .trash_service
        .archive_best_effort(
            user.id,
            ArchiveRequest {
                item_type: TrashItemType::Company,
                original_item_id: company.id,
                payload: serde_json::to_value(&company)
                    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?,
                item_name: &company.name,
                item_description: company.cnpj.as_deref(),
                process_id: None,
                department_id: None,
                company_id: Some(company.id),
                visibility: DocumentVisibility::None,
                allowed_roles: &[],
                allowed_user_ids: &[],
            },
        )
        .await;

    app_state.company_repo.delete(&app_state.db_pool, id).await?;

    app_state
        .audit_service
        .log_entity(user.id, "EXCLUIR_EMPRESA", "Company", company.id, &company.name)
        .await;

    Ok(Json(serde_json::json!({
        "message": "Empresa excluída e enviada para a lixeira.",
        "warning": warning,
    })))
}
