// src/handlers/processes.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        auth::Role,
        document::DocumentVisibility,
        process::{
            Comment, CreateCommentPayload, CreateProcessPayload, FinalizeProcessPayload,
            FlowStep, HistoryEvent, HistoryEventType, Process, ProcessFilter, ProcessResponse,
        },
        tag::ApplyTagPayload,
        trash::TrashItemType,
    },
    services::{
        permissions::{Action, ActionContext, Actor, ensure},
        trash::ArchiveRequest,
    },
};

/// Detalhe completo para a tela do processo: posição, passos e linha do tempo.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDetail {
    #[serde(flatten)]
    pub process: Process,
    pub flow_steps: Vec<FlowStep>,
    pub history: Vec<HistoryEvent>,
}

#[utoipa::path(
    get,
    path = "/api/processos",
    tag = "Processos",
    params(
        ("status" = Option<String>, Query, description = "IN_PROGRESS ou FINALIZED"),
        ("departmentId" = Option<i32>, Query, description = "Departamento atual"),
        ("companyId" = Option<i32>, Query, description = "Empresa")
    ),
    responses((status = 200, description = "Lista de processos", body = Vec<Process>)),
    security(("api_jwt" = []))
)]
pub async fn list_processes(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Query(filter): Query<ProcessFilter>,
) -> Result<Json<Vec<Process>>, AppError> {
    let processes = app_state.process_repo.list(&filter).await?;
    Ok(Json(processes))
}

#[utoipa::path(
    get,
    path = "/api/processos/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Detalhe do processo", body = ProcessDetail),
        (status = 404, description = "Processo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_process(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ProcessDetail>, AppError> {
    let process = app_state
        .process_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
    let flow_steps = app_state.process_repo.list_flow_steps(id).await?;
    let history = app_state.process_repo.list_events(id).await?;

    Ok(Json(ProcessDetail {
        process,
        flow_steps,
        history,
    }))
}

#[utoipa::path(
    post,
    path = "/api/processos",
    tag = "Processos",
    request_body = CreateProcessPayload,
    responses(
        (status = 201, description = "Processo criado", body = ProcessResponse),
        (status = 400, description = "Fluxo inválido"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_process(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateProcessPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let response = app_state.flow_service.create_process(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/processos/{id}/avancar",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo avançado", body = ProcessResponse),
        (status = 400, description = "Já está no último departamento"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn advance_process(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<ProcessResponse>, AppError> {
    let response = app_state.flow_service.advance(&user, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/processos/{id}/finalizar",
    tag = "Processos",
    request_body = FinalizeProcessPayload,
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo finalizado", body = ProcessResponse),
        (status = 400, description = "Ainda não está no último departamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn finalize_process(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<FinalizeProcessPayload>,
) -> Result<Json<ProcessResponse>, AppError> {
    let response = app_state.flow_service.finalize(&user, id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/processos/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do processo")),
    responses(
        (status = 200, description = "Processo excluído"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_process(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let process = app_state
        .process_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

    ensure(
        &Actor::from(&user),
        Action::DeleteProcess,
        &ActionContext::InDepartment {
            current_department: Some(process.current_department),
        },
    )?;

    app_state.process_repo.delete(&app_state.db_pool, id).await?;

    app_state
        .audit_service
        .log_entity(user.id, "EXCLUIR_PROCESSO", "Process", process.id, &process.name)
        .await;

    Ok(Json(serde_json::json!({ "message": "Processo excluído." })))
}

// =============================================================================
//  COMENTÁRIOS
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/processos/{id}/comentarios",
    tag = "Processos",
    request_body = CreateCommentPayload,
    params(("id" = i32, Path, description = "ID do processo")),
    responses((status = 201, description = "Comentário criado", body = Comment)),
    security(("api_jwt" = []))
)]
pub async fn create_comment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure(&Actor::from(&user), Action::Comment, &ActionContext::Global)?;
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .process_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

    let mut tx = app_state.db_pool.begin().await?;
    let comment = app_state
        .process_repo
        .create_comment(&mut *tx, id, user.id, &payload.content)
        .await?;
    app_state
        .process_repo
        .append_event(
            &mut *tx,
            id,
            HistoryEventType::Comment,
            "Comentário adicionado",
            None,
            user.id,
        )
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/comentarios/{id}",
    tag = "Processos",
    params(("id" = i32, Path, description = "ID do comentário")),
    responses(
        (status = 200, description = "Comentário excluído e enviado para a lixeira"),
        (status = 403, description = "Só o autor ou admin excluem")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_comment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let comment = app_state
        .process_repo
        .find_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comentário".to_string()))?;

    if user.role != Role::Admin && comment.author_id != user.id {
        return Err(AppError::Forbidden(
            "Só o autor ou um admin podem excluir o comentário".to_string(),
        ));
    }

    let warning = app_state
        .trash_service
        .archive_best_effort(
            user.id,
            ArchiveRequest {
                item_type: TrashItemType::Comment,
                original_item_id: comment.id,
                payload: serde_json::to_value(&comment)
                    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?,
                item_name: "Comentário",
                item_description: Some(&comment.content),
                process_id: Some(comment.process_id),
                department_id: None,
                company_id: None,
                visibility: DocumentVisibility::None,
                allowed_roles: &[],
                allowed_user_ids: &[],
            },
        )
        .await;

    let mut tx = app_state.db_pool.begin().await?;
    app_state.process_repo.delete_comment(&mut *tx, id).await?;
    app_state
        .process_repo
        .append_event(
            &mut *tx,
            comment.process_id,
            HistoryEventType::Comment,
            "Comentário excluído",
            None,
            user.id,
        )
        .await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "message": "Comentário excluído e enviado para a lixeira.",
        "warning": warning,
    })))
}

// =============================================================================
//  TAGS DO PROCESSO
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/processos/{id}/tags",
    tag = "Processos",
    request_body = ApplyTagPayload,
    params(("id" = i32, Path, description = "ID do processo")),
    responses((status = 200, description = "Tag aplicada")),
    security(("api_jwt" = []))
)]
pub async fn apply_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<ApplyTagPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure(&Actor::from(&user), Action::ApplyTags, &ActionContext::Global)?;

    app_state
        .process_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
    app_state
        .tag_repo
        .find_by_id(payload.tag_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tag".to_string()))?;

    app_state
        .process_repo
        .apply_tag(&app_state.db_pool, id, payload.tag_id)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Tag aplicada." })))
}

#[utoipa::path(
    delete,
    path = "/api/processos/{id}/tags/{tag_id}",
    tag = "Processos",
    params(
        ("id" = i32, Path, description = "ID do processo"),
        ("tag_id" = i32, Path, description = "ID da tag")
    ),
    responses((status = 200, description = "Tag removida")),
    security(("api_jwt" = []))
)]
pub async fn remove_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, tag_id)): Path<(i32, i32)>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure(&Actor::from(&user), Action::ApplyTags, &ActionContext::Global)?;

    app_state
        .process_repo
        .remove_tag(&app_state.db_pool, id, tag_id)
        .await?;

    Ok(Json(serde_json::json!({ "message": "Tag removida." })))
}
