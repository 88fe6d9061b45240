// src/db/trash_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::document::DocumentVisibility,
    models::trash::{TrashItem, TrashItemType},
};

#[derive(Clone)]
pub struct TrashRepository {
    pool: PgPool,
}

pub struct NewTrashItem<'a> {
    pub item_type: TrashItemType,
    pub original_item_id: i32,
    pub payload: serde_json::Value,
    pub item_name: &'a str,
    pub item_description: Option<&'a str>,
    pub process_id: Option<i32>,
    pub department_id: Option<i32>,
    pub company_id: Option<i32>,
    pub visibility: DocumentVisibility,
    pub allowed_roles: &'a [String],
    pub allowed_user_ids: &'a [i32],
    pub deleted_by_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl TrashRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, new: NewTrashItem<'_>) -> Result<TrashItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, TrashItem>(
            "INSERT INTO trash_items (
                item_type, original_item_id, payload, item_name, item_description,
                process_id, department_id, company_id,
                visibility, allowed_roles, allowed_user_ids,
                deleted_by_id, expires_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING *",
        )
        .bind(new.item_type)
        .bind(new.original_item_id)
        .bind(new.payload)
        .bind(new.item_name)
        .bind(new.item_description)
        .bind(new.process_id)
        .bind(new.department_id)
        .bind(new.company_id)
        .bind(new.visibility)
        .bind(new.allowed_roles)
        .bind(new.allowed_user_ids)
        .bind(new.deleted_by_id)
        .bind(new.expires_at)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<TrashItem>, AppError> {
        let item = sqlx::query_as::<_, TrashItem>("SELECT * FROM trash_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Só itens ainda dentro da janela de retenção.
    pub async fn list_active(&self) -> Result<Vec<TrashItem>, AppError> {
        let items = sqlx::query_as::<_, TrashItem>(
            "SELECT * FROM trash_items WHERE expires_at > NOW() ORDER BY deleted_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM trash_items WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
