// src/db/department_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::department::Department,
};

#[derive(Clone)]
pub struct DepartmentRepository {
    pool: PgPool,
}

impl DepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Department>, AppError> {
        let dept = sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(dept)
    }

    pub async fn list(&self, only_active: bool) -> Result<Vec<Department>, AppError> {
        let depts = sqlx::query_as::<_, Department>(
            "SELECT * FROM departments
             WHERE active OR NOT $1
             ORDER BY display_order, name",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(depts)
    }

    /// Quantos dos ids informados existem e estão ativos. Usado para validar
    /// um department_flow antes de iniciar um processo.
    pub async fn count_existing(&self, ids: &[i32]) -> Result<i64, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT id) FROM departments WHERE id = ANY($1) AND active",
        )
        .bind(ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
        color: Option<&str>,
        icon: Option<&str>,
        display_order: i32,
    ) -> Result<Department, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let dept = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name, description, color, icon, display_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(icon)
        .bind(display_order)
        .fetch_one(executor)
        .await?;
        Ok(dept)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        name: Option<&str>,
        description: Option<&str>,
        color: Option<&str>,
        icon: Option<&str>,
        display_order: Option<i32>,
        active: Option<bool>,
    ) -> Result<Department, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let dept = sqlx::query_as::<_, Department>(
            "UPDATE departments SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                color = COALESCE($4, color),
                icon = COALESCE($5, icon),
                display_order = COALESCE($6, display_order),
                active = COALESCE($7, active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(color)
        .bind(icon)
        .bind(display_order)
        .bind(active)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Departamento".to_string()))?;
        Ok(dept)
    }

    /// Departamentos referenciados por processos não somem fisicamente.
    pub async fn deactivate<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("UPDATE departments SET active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(executor)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Departamento".to_string()));
        }
        Ok(())
    }

    pub async fn referenced_by_processes(&self, id: i32) -> Result<bool, AppError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM processes
             WHERE current_department = $1 OR $1 = ANY(department_flow)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0 > 0)
    }
}
