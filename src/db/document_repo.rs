// src/db/document_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::document::{Document, DocumentVisibility},
};

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

pub struct NewDocument<'a> {
    pub process_id: i32,
    pub department_id: Option<i32>,
    pub question_id: Option<i32>,
    pub name: &'a str,
    pub doc_type: &'a str,
    pub category: Option<&'a str>,
    pub size_bytes: i64,
    pub path: &'a str,
    pub visibility: DocumentVisibility,
    pub allowed_roles: &'a [String],
    pub allowed_user_ids: &'a [i32],
    pub uploaded_by_id: i32,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Document>, AppError> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(doc)
    }

    pub async fn list_for_process(
        &self,
        process_id: i32,
        department_id: Option<i32>,
    ) -> Result<Vec<Document>, AppError> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents
             WHERE process_id = $1
               AND ($2::int IS NULL OR department_id = $2)
             ORDER BY uploaded_at DESC",
        )
        .bind(process_id)
        .bind(department_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    pub async fn create<'e, E>(&self, executor: E, new: NewDocument<'_>) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (
                process_id, department_id, question_id, name, doc_type, category,
                size_bytes, path, visibility, allowed_roles, allowed_user_ids, uploaded_by_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(new.process_id)
        .bind(new.department_id)
        .bind(new.question_id)
        .bind(new.name)
        .bind(new.doc_type)
        .bind(new.category)
        .bind(new.size_bytes)
        .bind(new.path)
        .bind(new.visibility)
        .bind(new.allowed_roles)
        .bind(new.allowed_user_ids)
        .bind(new.uploaded_by_id)
        .fetch_one(executor)
        .await?;
        Ok(doc)
    }

    /// Remove só a linha. O objeto no storage fica, para permitir restauração
    /// a partir da lixeira.
    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Reinsere um documento restaurado da lixeira preservando o id original.
    pub async fn restore<'e, E>(&self, executor: E, doc: &Document) -> Result<Document, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let restored = sqlx::query_as::<_, Document>(
            "INSERT INTO documents (
                id, process_id, department_id, question_id, name, doc_type, category,
                size_bytes, path, visibility, allowed_roles, allowed_user_ids,
                uploaded_by_id, uploaded_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             ON CONFLICT (id) DO NOTHING
             RETURNING *",
        )
        .bind(doc.id)
        .bind(doc.process_id)
        .bind(doc.department_id)
        .bind(doc.question_id)
        .bind(&doc.name)
        .bind(&doc.doc_type)
        .bind(&doc.category)
        .bind(doc.size_bytes)
        .bind(&doc.path)
        .bind(doc.visibility)
        .bind(&doc.allowed_roles)
        .bind(&doc.allowed_user_ids)
        .bind(doc.uploaded_by_id)
        .bind(doc.uploaded_at)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| {
            AppError::Conflict("Já existe um documento com este id.".to_string())
        })?;
        Ok(restored)
    }
}
