// src/models/questionnaire.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "question_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Text,
    Textarea,
    Number,
    Date,
    Boolean,
    Select,
    File,
    Phone,
    Email,
}

impl QuestionType {
    /// Aceita os nomes minúsculos que o front envia ("textarea", "select"...).
    /// Tipo desconhecido cai em TEXT, igual ao comportamento histórico.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "textarea" => QuestionType::Textarea,
            "number" => QuestionType::Number,
            "date" => QuestionType::Date,
            "boolean" => QuestionType::Boolean,
            "select" => QuestionType::Select,
            "file" => QuestionType::File,
            "phone" => QuestionType::Phone,
            "email" => QuestionType::Email,
            _ => QuestionType::Text,
        }
    }
}

/// Pergunta persistida. Quando `process_id` é NULL a pergunta é global do
/// departamento; preenchido, é personalização de um processo específico.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i32,
    pub department_id: i32,
    pub process_id: Option<i32>,
    #[schema(example = "Possui certificado digital?")]
    pub label: String,
    pub question_type: QuestionType,
    pub required: bool,
    pub display_order: i32,
    pub options: Vec<String>,
    /// Condição de exibição. Referência pendurada nunca é persistida:
    /// vira NULL e a pergunta fica sempre visível.
    pub condition_question_id: Option<i32>,
    pub condition_operator: Option<String>,
    pub condition_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pergunta como chega do front na criação do processo, com id temporário
/// (o front usa Date.now()). Condições referenciam esses ids temporários.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingQuestion {
    pub id: Option<i64>,
    pub label: String,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub display_order: Option<i32>,
    #[serde(default)]
    pub options: Vec<String>,
    pub condition: Option<IncomingCondition>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCondition {
    pub question_id: i64,
    pub operator: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i32,
    pub process_id: i32,
    pub question_id: i32,
    pub value: String,
    pub answered_by_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnswersPayload {
    pub process_id: i32,
    pub department_id: i32,
    /// { "42": valor }. Valores não-string são serializados como JSON antes
    /// de ir para o banco.
    pub answers: std::collections::HashMap<String, serde_json::Value>,
}

/// Pergunta efetiva servida para a UI: inclui resposta atual, se está
/// respondida e se a condição de exibição está satisfeita.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub answer: Option<String>,
    pub answered: bool,
    pub visible: bool,
}
