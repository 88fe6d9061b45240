// src/db/audit_repo.rs

use sqlx::PgPool;

use crate::common::error::AppError;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

/// Campos de um lançamento no log global de auditoria. Tudo opcional menos
/// quem fez e o quê.
#[derive(Debug, Default)]
pub struct AuditEntry<'a> {
    pub action: &'a str,
    pub entity: &'a str,
    pub entity_id: Option<i32>,
    pub entity_name: Option<&'a str>,
    pub field: Option<&'a str>,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub details: Option<&'a str>,
    pub process_id: Option<i32>,
    pub company_id: Option<i32>,
    pub department_id: Option<i32>,
    pub ip: Option<&'a str>,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Grava fora da transação principal de propósito: auditoria é
    // best-effort e nunca desfaz a mutação primária.
    pub async fn insert(&self, user_id: i32, entry: AuditEntry<'_>) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO audit_logs (
                user_id, action, entity, entity_id, entity_name, field,
                old_value, new_value, details, process_id, company_id, department_id, ip
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(user_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(entry.entity_id)
        .bind(entry.entity_name)
        .bind(entry.field)
        .bind(entry.old_value)
        .bind(entry.new_value)
        .bind(entry.details)
        .bind(entry.process_id)
        .bind(entry.company_id)
        .bind(entry.department_id)
        .bind(entry.ip)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
