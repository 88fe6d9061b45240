// src/models/document.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::serialize::i64_safe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_visibility", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentVisibility {
    Public,
    Roles,
    Users,
    /// Somente uploader e admin.
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i32,
    pub process_id: i32,
    pub department_id: Option<i32>,
    /// Preenchido quando o documento responde uma pergunta do tipo FILE.
    pub question_id: Option<i32>,
    #[schema(example = "contrato-social.pdf")]
    pub name: String,
    pub doc_type: String,
    pub category: Option<String>,
    #[serde(serialize_with = "i64_safe")]
    #[schema(value_type = i64)]
    pub size_bytes: i64,
    /// Path interno no storage. Nunca exposto como URL pública permanente;
    /// o acesso é sempre via referência assinada de curta duração.
    #[serde(skip_serializing)]
    pub path: String,
    pub visibility: DocumentVisibility,
    pub allowed_roles: Vec<String>,
    pub allowed_user_ids: Vec<i32>,
    pub uploaded_by_id: i32,
    pub uploaded_at: DateTime<Utc>,
}

/// Referência assinada de curta duração para download.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedReference {
    #[schema(example = "/api/documentos/arquivo?token=...")]
    pub url: String,
    pub expires_in_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentResponse {
    pub message: String,
    pub days_until_purge: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
