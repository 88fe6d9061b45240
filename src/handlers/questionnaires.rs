// src/handlers/questionnaires.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::questionnaire::{Answer, EffectiveQuestion, SaveAnswersPayload},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireQuery {
    pub departamento_id: i32,
}

#[utoipa::path(
    get,
    path = "/api/processos/{id}/questionario",
    tag = "Questionários",
    params(
        ("id" = i32, Path, description = "ID do processo"),
        ("departamentoId" = i32, Query, description = "Departamento do questionário")
    ),
    responses((status = 200, description = "Perguntas efetivas com respostas e visibilidade", body = Vec<EffectiveQuestion>)),
    security(("api_jwt" = []))
)]
pub async fn get_questionnaire(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(query): Query<QuestionnaireQuery>,
) -> Result<Json<Vec<EffectiveQuestion>>, AppError> {
    let questions = app_state
        .questionnaire_service
        .effective_questions(&user, id, query.departamento_id)
        .await?;
    Ok(Json(questions))
}

#[utoipa::path(
    post,
    path = "/api/questionarios/salvar-respostas",
    tag = "Questionários",
    request_body = SaveAnswersPayload,
    responses(
        (status = 200, description = "Respostas salvas", body = Vec<Answer>),
        (status = 403, description = "Fora do departamento atual do processo")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_answers(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SaveAnswersPayload>,
) -> Result<Json<Vec<Answer>>, AppError> {
    let answers = app_state
        .questionnaire_service
        .save_answers(&user, payload)
        .await?;
    Ok(Json(answers))
}
