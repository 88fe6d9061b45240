// src/handlers/documents.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::document::{DeleteDocumentResponse, Document, DocumentVisibility, SignedReference},
    services::document::UploadRequest,
};

#[utoipa::path(
    post,
    path = "/api/documentos",
    tag = "Documentos",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Documento anexado", body = Document),
        (status = 400, description = "Arquivo ausente"),
        (status = 403, description = "Fora do departamento atual do processo")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut process_id: Option<i32> = None;
    let mut department_id: Option<i32> = None;
    let mut question_id: Option<i32> = None;
    let mut category: Option<String> = None;
    let mut visibility: Option<DocumentVisibility> = None;
    let mut allowed_roles: Vec<String> = Vec::new();
    let mut allowed_user_ids: Vec<i32> = Vec::new();
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::StorageFailure(format!("Multipart inválido: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("documento")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::StorageFailure(format!("Falha lendo arquivo: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            "processId" => {
                let text = field.text().await.unwrap_or_default();
                process_id = text.trim().parse().ok();
            }
            "departmentId" => {
                let text = field.text().await.unwrap_or_default();
                department_id = text.trim().parse().ok();
            }
            "questionId" => {
                let text = field.text().await.unwrap_or_default();
                question_id = text.trim().parse().ok();
            }
            "category" => {
                let text = field.text().await.unwrap_or_default();
                if !text.trim().is_empty() {
                    category = Some(text);
                }
            }
            "visibility" => {
                let text = field.text().await.unwrap_or_default();
                visibility = match text.trim().to_uppercase().as_str() {
                    "PUBLIC" => Some(DocumentVisibility::Public),
                    "ROLES" => Some(DocumentVisibility::Roles),
                    "USERS" => Some(DocumentVisibility::Users),
                    "NONE" => Some(DocumentVisibility::None),
                    _ => None,
                };
            }
            "allowedRoles" => {
                let text = field.text().await.unwrap_or_default();
                allowed_roles = text
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "allowedUserIds" => {
                let text = field.text().await.unwrap_or_default();
                allowed_user_ids = text
                    .split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect();
            }
            _ => {}
        }
    }

    let process_id = process_id.ok_or_else(|| {
        AppError::ValidationError({
            let mut errors = validator::ValidationErrors::new();
            errors.add("processId", validator::ValidationError::new("required"));
            errors
        })
    })?;
    let (file_name, content_type, bytes) = file.ok_or_else(|| {
        AppError::ValidationError({
            let mut errors = validator::ValidationErrors::new();
            errors.add("file", validator::ValidationError::new("required"));
            errors
        })
    })?;

    let document = app_state
        .document_service
        .upload(
            &user,
            UploadRequest {
                process_id,
                department_id,
                question_id,
                file_name,
                content_type,
                category,
                bytes,
                visibility,
                allowed_roles,
                allowed_user_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/processos/{id}/documentos",
    tag = "Documentos",
    params(
        ("id" = i32, Path, description = "ID do processo"),
        ("departamentoId" = Option<i32>, Query, description = "Filtra por departamento")
    ),
    responses((status = 200, description = "Documentos visíveis para o usuário", body = Vec<Document>)),
    security(("api_jwt" = []))
)]
pub async fn list_process_documents(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = app_state
        .document_service
        .list_for_process(&user, id, query.departamento_id)
        .await?;
    Ok(Json(documents))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQuery {
    pub departamento_id: Option<i32>,
}

// Cada chamada emite uma referência nova; a URL devolvida morre sozinha em
// poucos minutos.
#[utoipa::path(
    get,
    path = "/api/documentos/{id}",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Referência assinada de curta duração", body = SignedReference),
        (status = 403, description = "Sem acesso ao documento")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<SignedReference>, AppError> {
    let reference = app_state.document_service.resolve(&user, id).await?;
    Ok(Json(reference))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: String,
}

// Rota sem middleware de auth: o token assinado É a credencial.
#[utoipa::path(
    get,
    path = "/api/documentos/arquivo",
    tag = "Documentos",
    params(("token" = String, Query, description = "Token de download assinado")),
    responses(
        (status = 200, description = "Bytes do arquivo"),
        (status = 401, description = "Token vencido ou adulterado")
    )
)]
pub async fn download_document(
    State(app_state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (document, bytes) = app_state.document_service.download(&query.token).await?;

    let headers = [
        (header::CONTENT_TYPE, document.doc_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.name),
        ),
    ];
    Ok((headers, bytes))
}

#[utoipa::path(
    delete,
    path = "/api/documentos/{id}",
    tag = "Documentos",
    params(("id" = i32, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Documento enviado para a lixeira", body = DeleteDocumentResponse),
        (status = 403, description = "Sem acesso ao documento")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<DeleteDocumentResponse>, AppError> {
    let response = app_state.document_service.delete(&user, id).await?;
    Ok(Json(response))
}
