// src/db/template_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::template::Template};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Template>, AppError> {
        let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    pub async fn list(&self) -> Result<Vec<Template>, AppError> {
        let templates =
            sqlx::query_as::<_, Template>("SELECT * FROM templates ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(templates)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        department_flow: &[i32],
        questionnaires_by_department: Option<&serde_json::Value>,
        created_by_id: i32,
    ) -> Result<Template, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, Template>(
            "INSERT INTO templates
                (name, description, department_flow, questionnaires_by_department, created_by_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(department_flow)
        .bind(questionnaires_by_department)
        .bind(created_by_id)
        .fetch_one(executor)
        .await?;
        Ok(template)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
