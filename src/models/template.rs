// src/models/template.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Modelo de fluxo reutilizável: sequência de departamentos nomeada, com
/// questionários opcionais por departamento. Usado na criação via template
/// e na interligação de processos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i32,
    #[schema(example = "Abertura de Empresa")]
    pub name: String,
    pub description: Option<String>,
    pub department_flow: Vec<i32>,
    /// Presets de perguntas por departamento, { "3": [perguntas...] }.
    /// Guardado como chegou do front; é materializado em cada processo
    /// criado a partir deste template.
    #[schema(value_type = Object)]
    pub questionnaires_by_department: Option<serde_json::Value>,
    pub created_by_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatePayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "O fluxo precisa de ao menos um departamento."))]
    pub department_flow: Vec<i32>,
    #[schema(value_type = Object)]
    pub questionnaires_by_department: Option<serde_json::Value>,
}
