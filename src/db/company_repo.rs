// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::company::Company};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        Ok(companies)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        cnpj: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (name, cnpj, email, phone)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(name)
        .bind(cnpj)
        .bind(email)
        .bind(phone)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("Já existe empresa com este CNPJ.".to_string());
                }
            }
            e.into()
        })?;
        Ok(company)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        name: Option<&str>,
        cnpj: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "UPDATE companies SET
                name = COALESCE($2, name),
                cnpj = COALESCE($3, cnpj),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(cnpj)
        .bind(email)
        .bind(phone)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Empresa".to_string()))?;
        Ok(company)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
