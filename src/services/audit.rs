// src/services/audit.rs

// Fachada best-effort sobre o log global de auditoria: falha vira
// tracing::warn, nunca erro para o chamador.

use crate::{
    db::{AuditRepository, audit_repo::AuditEntry},
    models::process::Process,
};

#[derive(Clone)]
pub struct AuditService {
    repo: AuditRepository,
}

impl AuditService {
    pub fn new(repo: AuditRepository) -> Self {
        Self { repo }
    }

    pub async fn log(
        &self,
        user_id: i32,
        action: &str,
        entity: &str,
        entity_id: Option<i32>,
        details: Option<&str>,
    ) {
        let entry = AuditEntry {
            action,
            entity,
            entity_id,
            details,
            ..Default::default()
        };
        if let Err(e) = self.repo.insert(user_id, entry).await {
            tracing::warn!("Falha ao gravar auditoria ({} {}): {}", action, entity, e);
        }
    }

    /// Lançamento padrão para mutações de processo, com os campos de escopo
    /// preenchidos a partir da entidade.
    pub async fn log_process(&self, user_id: i32, action: &str, process: &Process) {
        let entry = AuditEntry {
            action,
            entity: "Process",
            entity_id: Some(process.id),
            entity_name: Some(&process.name),
            process_id: Some(process.id),
            company_id: process.company_id,
            department_id: Some(process.current_department),
            ..Default::default()
        };
        if let Err(e) = self.repo.insert(user_id, entry).await {
            tracing::warn!(
                "Falha ao gravar auditoria ({} processo {}): {}",
                action,
                process.id,
                e
            );
        }
    }

    pub async fn log_entity(
        &self,
        user_id: i32,
        action: &str,
        entity: &str,
        entity_id: i32,
        entity_name: &str,
    ) {
        let entry = AuditEntry {
            action,
            entity,
            entity_id: Some(entity_id),
            entity_name: Some(entity_name),
            ..Default::default()
        };
        if let Err(e) = self.repo.insert(user_id, entry).await {
            tracing::warn!("Falha ao gravar auditoria ({} {}): {}", action, entity, e);
        }
    }
}
