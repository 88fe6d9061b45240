// src/models/process.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::serialize::i64_safe;
use crate::models::questionnaire::IncomingQuestion;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "process_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    InProgress,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "process_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "flow_step_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStepStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "history_event_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryEventType {
    Start,
    Movement,
    Document,
    Finalize,
    Comment,
    Interlink,
}

// --- Entidade central do workflow ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: i32,
    #[schema(example = "Abertura de empresa - Padaria Central")]
    pub name: String,
    pub service_name: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<i32>,
    pub status: ProcessStatus,
    pub priority: ProcessPriority,
    /// Departamento onde o processo está parado agora.
    pub current_department: i32,
    /// Posição no fluxo. É este campo que manda; `progress` é só informativo.
    pub current_department_index: i32,
    /// Sequência imutável de departamentos depois que o processo inicia.
    pub department_flow: Vec<i32>,
    #[schema(example = 67)]
    pub progress: i32,
    pub description: Option<String>,
    pub creator_notes: Option<String>,
    /// Flag guardada mas sem efeito no avanço: o fluxo é sempre sequencial.
    pub independent_departments: bool,
    pub interlinked_process_id: Option<i32>,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Uma passagem do processo por um departamento (HistoricoFluxo).
/// No máximo um step por processo fica `InProgress` enquanto o processo vive.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub id: i32,
    pub process_id: i32,
    pub department_id: i32,
    pub position: i32,
    pub status: FlowStepStatus,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
}

/// Evento da linha do tempo. Append-only: nunca editado nem apagado por ação
/// de usuário.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub id: i32,
    pub process_id: i32,
    pub event_type: HistoryEventType,
    #[schema(example = "Processo movido de \"Fiscal\" para \"Contábil\"")]
    pub action: String,
    pub department_name: Option<String>,
    pub actor_id: i32,
    pub occurred_at: DateTime<Utc>,
    #[serde(serialize_with = "i64_safe")]
    #[schema(value_type = i64)]
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    pub process_id: i32,
    pub author_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub service_name: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<i32>,
    pub priority: Option<ProcessPriority>,
    /// Fluxo explícito (solicitação personalizada) ou herdado de um template.
    pub department_flow: Option<Vec<i32>>,
    pub template_id: Option<i32>,
    pub description: Option<String>,
    pub creator_notes: Option<String>,
    #[serde(default)]
    pub independent_departments: bool,
    /// Criação personalizada exige permissão própria (usuário comum só cria
    /// a partir de template).
    #[serde(default)]
    pub custom: bool,
    /// Questionários por departamento: { "3": [perguntas...] }. Ids das
    /// perguntas aqui são temporários do front e serão remapeados.
    pub questionnaires_by_department: Option<std::collections::HashMap<String, Vec<IncomingQuestion>>>,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeProcessPayload {
    /// Interligação opcional: dispara um processo sucessor a partir de um
    /// template ao finalizar este.
    pub interlink: Option<InterlinkPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterlinkPayload {
    pub template_id: i32,
    #[serde(default)]
    pub reuse_company_data: bool,
    #[serde(default)]
    pub independent_departments: bool,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentPayload {
    #[validate(length(min = 1, message = "required"))]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessFilter {
    pub status: Option<ProcessStatus>,
    pub department_id: Option<i32>,
    pub company_id: Option<i32>,
}

/// Resposta de mutação com aviso não-fatal (efeito best-effort que falhou).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    #[serde(flatten)]
    pub process: Process,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
