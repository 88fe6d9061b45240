// src/models/trash.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::document::DocumentVisibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "trash_item_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrashItemType {
    User,
    Department,
    Company,
    CompanyDocument,
    Template,
    Comment,
    ProcessDocument,
}

/// Snapshot de uma entidade apagada, recuperável dentro da janela de
/// retenção. `payload` guarda o JSON completo pré-exclusão; os campos
/// de visibilidade espelham os da entidade viva para a listagem respeitar
/// as mesmas regras de acesso.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrashItem {
    pub id: i32,
    pub item_type: TrashItemType,
    pub original_item_id: i32,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub item_name: String,
    pub item_description: Option<String>,
    pub process_id: Option<i32>,
    pub department_id: Option<i32>,
    pub company_id: Option<i32>,
    pub visibility: DocumentVisibility,
    pub allowed_roles: Vec<String>,
    pub allowed_user_ids: Vec<i32>,
    pub deleted_by_id: i32,
    pub deleted_at: DateTime<Utc>,
    /// deleted_at + 15 dias. Itens vencidos ficam elegíveis para expurgo
    /// por rotina externa.
    pub expires_at: DateTime<Utc>,
}
