// src/db/questionnaire_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::questionnaire::{Answer, Question, QuestionType},
};

#[derive(Clone)]
pub struct QuestionnaireRepository {
    pool: PgPool,
}

impl QuestionnaireRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Perguntas efetivas de um departamento para um processo: as globais do
    /// departamento mais as personalizadas daquele processo.
    pub async fn effective_questions(
        &self,
        process_id: i32,
        department_id: i32,
    ) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions
             WHERE department_id = $2
               AND (process_id IS NULL OR process_id = $1)
             ORDER BY display_order, id",
        )
        .bind(process_id)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Question>, AppError> {
        let question = sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    /// Insere a pergunta sem condição — a condição é resolvida num segundo
    /// passo, depois que todos os ids persistentes existem.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_question<'e, E>(
        &self,
        executor: E,
        process_id: Option<i32>,
        department_id: i32,
        label: &str,
        question_type: QuestionType,
        required: bool,
        display_order: i32,
        options: &[String],
    ) -> Result<Question, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO questions
                (process_id, department_id, label, question_type, required, display_order, options)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(process_id)
        .bind(department_id)
        .bind(label)
        .bind(question_type)
        .bind(required)
        .bind(display_order)
        .bind(options)
        .fetch_one(executor)
        .await?;
        Ok(question)
    }

    pub async fn set_condition<'e, E>(
        &self,
        executor: E,
        question_id: i32,
        condition_question_id: Option<i32>,
        operator: Option<&str>,
        value: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE questions SET
                condition_question_id = $2,
                condition_operator = $3,
                condition_value = $4
             WHERE id = $1",
        )
        .bind(question_id)
        .bind(condition_question_id)
        .bind(operator)
        .bind(value)
        .execute(executor)
        .await?;
        Ok(())
    }

    // =========================================================================
    //  ANSWERS — unicidade em (processo, pergunta)
    // =========================================================================

    pub async fn upsert_answer<'e, E>(
        &self,
        executor: E,
        process_id: i32,
        question_id: i32,
        value: &str,
        answered_by_id: i32,
    ) -> Result<Answer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let answer = sqlx::query_as::<_, Answer>(
            "INSERT INTO answers (process_id, question_id, value, answered_by_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT answers_process_question_key
             DO UPDATE SET value = $3, answered_by_id = $4, updated_at = NOW()
             RETURNING *",
        )
        .bind(process_id)
        .bind(question_id)
        .bind(value)
        .bind(answered_by_id)
        .fetch_one(executor)
        .await?;
        Ok(answer)
    }

    pub async fn answers_for_process(&self, process_id: i32) -> Result<Vec<Answer>, AppError> {
        let answers = sqlx::query_as::<_, Answer>(
            "SELECT * FROM answers WHERE process_id = $1",
        )
        .bind(process_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    /// Ids de perguntas FILE já "respondidas" por documento anexado. Documento
    /// sem departamento definido ainda conta para a pergunta.
    pub async fn question_ids_with_documents(
        &self,
        process_id: i32,
        department_id: i32,
    ) -> Result<Vec<i32>, AppError> {
        let rows: Vec<(i32,)> = sqlx::query_as(
            "SELECT DISTINCT question_id FROM documents
             WHERE process_id = $1
               AND question_id IS NOT NULL
               AND (department_id IS NULL OR department_id = $2)",
        )
        .bind(process_id)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
