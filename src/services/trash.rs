// src/services/trash.rs

// Lixeira: snapshot JSON da entidade apagada com janela de retenção.
// O arquivamento é sempre best-effort a partir do chamador; falhar em
// arquivar nunca impede a exclusão que o disparou.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, TrashRepository, trash_repo::NewTrashItem},
    models::{
        auth::{Role, User},
        document::{Document, DocumentVisibility},
        trash::{TrashItem, TrashItemType},
    },
    services::permissions::Actor,
};

pub const RETENTION_DAYS: i64 = 15;

pub fn retention_expiry(deleted_at: DateTime<Utc>) -> DateTime<Utc> {
    deleted_at + Duration::days(RETENTION_DAYS)
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "ADMIN",
        Role::Manager => "MANAGER",
        Role::User => "USER",
    }
}

/// Regras de visibilidade da listagem, espelhando as do documento vivo.
/// Admin e quem apagou sempre veem o item.
pub fn can_view_item(actor: &Actor, item: &TrashItem) -> bool {
    if actor.role == Role::Admin || item.deleted_by_id == actor.id {
        return true;
    }
    match item.visibility {
        DocumentVisibility::Public => true,
        DocumentVisibility::Roles => {
            !item.allowed_roles.is_empty()
                && item
                    .allowed_roles
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(role_name(actor.role)))
        }
        DocumentVisibility::Users => item.allowed_user_ids.contains(&actor.id),
        DocumentVisibility::None => false,
    }
}

/// Campos que cada chamador fornece ao arquivar. O resto (expiração,
/// visibilidade padrão) é preenchido aqui.
pub struct ArchiveRequest<'a> {
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
}

#[derive(Clone)]
pub struct TrashService {
    repo: TrashRepository,
    document_repo: DocumentRepository,
    pool: PgPool,
}

impl TrashService {
    pub fn new(repo: TrashRepository, document_repo: DocumentRepository, pool: PgPool) -> Self {
        Self {
            repo,
            document_repo,
            pool,
        }
    }

    pub async fn archive(
        &self,
        deleted_by_id: i32,
        request: ArchiveRequest<'_>,
    ) -> Result<TrashItem, AppError> {
        self.repo
            .insert(
                &self.pool,
                NewTrashItem {
                    item_type: request.item_type,
                    original_item_id: request.original_item_id,
                    payload: request.payload,
                    item_name: request.item_name,
                    item_description: request.item_description,
                    process_id: request.process_id,
                    department_id: request.department_id,
                    company_id: request.company_id,
                    visibility: request.visibility,
                    allowed_roles: request.allowed_roles,
                    allowed_user_ids: request.allowed_user_ids,
                    deleted_by_id,
                    expires_at: retention_expiry(Utc::now()),
                },
            )
            .await
    }

    /// Versão que nunca falha: erro vira log e um aviso para a resposta.
    pub async fn archive_best_effort(
        &self,
        deleted_by_id: i32,
        request: ArchiveRequest<'_>,
    ) -> Option<String> {
        let label = request.item_name.to_string();
        match self.archive(deleted_by_id, request).await {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Falha ao mover \"{}\" para a lixeira: {}", label, e);
                Some(format!(
                    "\"{}\" foi excluído, mas não pôde ser enviado para a lixeira.",
                    label
                ))
            }
        }
    }

    pub async fn list(&self, user: &User) -> Result<Vec<TrashItem>, AppError> {
        let actor = Actor::from(user);
        let items = self.repo.list_active().await?;
        Ok(items
            .into_iter()
            .filter(|item| can_view_item(&actor, item))
            .collect())
    }

    /// Restaura um documento de processo a partir do snapshot, preservando o
    /// id original, e remove o item da lixeira.
    pub async fn restore_document(&self, user: &User, trash_id: i32) -> Result<Document, AppError> {
        let item = self
            .repo
            .find_by_id(trash_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Item da lixeira".to_string()))?;

        if user.role != Role::Admin && item.deleted_by_id != user.id {
            return Err(AppError::Forbidden(
                "Sem permissão para restaurar este item".to_string(),
            ));
        }
        if item.expires_at <= Utc::now() {
            return Err(AppError::NotFound("Item da lixeira".to_string()));
        }
        if item.item_type != TrashItemType::ProcessDocument {
            return Err(AppError::InvalidTransition(
                "Apenas documentos podem ser restaurados".to_string(),
            ));
        }

        let document: Document = serde_json::from_value(item.payload.clone())
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e)))?;

        let mut tx = self.pool.begin().await?;
        let restored = self.document_repo.restore(&mut *tx, &document).await?;
        self.repo.delete(&mut *tx, item.id).await?;
        tx.commit().await?;

        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(
        visibility: DocumentVisibility,
        allowed_roles: Vec<String>,
        allowed_user_ids: Vec<i32>,
        deleted_by_id: i32,
    ) -> TrashItem {
        TrashItem {
            id: 1,
            item_type: TrashItemType::ProcessDocument,
            original_item_id: 10,
            payload: serde_json::json!({}),
            item_name: "contrato.pdf".to_string(),
            item_description: None,
            process_id: Some(5),
            department_id: None,
            company_id: None,
            visibility,
            allowed_roles,
            allowed_user_ids,
            deleted_by_id,
            deleted_at: Utc::now(),
            expires_at: retention_expiry(Utc::now()),
        }
    }

    fn actor(id: i32, role: Role) -> Actor {
        Actor {
            id,
            role,
            department_id: Some(1),
        }
    }

    #[test]
    fn retencao_de_quinze_dias() {
        let deleted = Utc::now();
        let expires = retention_expiry(deleted);
        assert_eq!((expires - deleted).num_days(), 15);
    }

    #[test]
    fn admin_e_quem_apagou_sempre_veem() {
        let i = item(DocumentVisibility::None, vec![], vec![], 7);
        assert!(can_view_item(&actor(99, Role::Admin), &i));
        assert!(can_view_item(&actor(7, Role::User), &i));
        assert!(!can_view_item(&actor(8, Role::User), &i));
    }

    #[test]
    fn visibilidade_por_role_exige_lista_nao_vazia() {
        let vazio = item(DocumentVisibility::Roles, vec![], vec![], 1);
        assert!(!can_view_item(&actor(2, Role::Manager), &vazio));

        let com_role = item(
            DocumentVisibility::Roles,
            vec!["manager".to_string()],
            vec![],
            1,
        );
        assert!(can_view_item(&actor(2, Role::Manager), &com_role));
        assert!(!can_view_item(&actor(2, Role::User), &com_role));
    }

    #[test]
    fn visibilidade_por_usuario() {
        let i = item(DocumentVisibility::Users, vec![], vec![3, 4], 1);
        assert!(can_view_item(&actor(3, Role::User), &i));
        assert!(!can_view_item(&actor(5, Role::User), &i));
    }

    #[test]
    fn publico_visivel_para_qualquer_autenticado() {
        let i = item(DocumentVisibility::Public, vec![], vec![], 1);
        assert!(can_view_item(&actor(42, Role::User), &i));
    }
}
