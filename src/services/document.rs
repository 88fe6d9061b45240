// src/services/document.rs

// Anexos de processo: upload para o storage, regras de acesso e referência
// assinada de curta duração. O path interno nunca vira URL pública; todo
// download passa por um token HS256 que expira em minutos.

use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, storage::DocumentStorage},
    db::{DocumentRepository, ProcessRepository, document_repo::NewDocument},
    models::{
        auth::{Role, User},
        document::{DeleteDocumentResponse, Document, DocumentVisibility, SignedReference},
        process::HistoryEventType,
    },
    services::{
        audit::AuditService,
        permissions::{Action, ActionContext, Actor, ensure},
        trash::{self, ArchiveRequest, TrashService},
    },
};

pub const SIGNED_URL_TTL_SECS: u64 = 300;

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "ADMIN",
        Role::Manager => "MANAGER",
        Role::User => "USER",
    }
}

/// Regras de acesso a um documento. Uploader e admin sempre; o resto segue
/// a visibilidade declarada. Lista de roles vazia nega, nunca libera.
pub fn can_access(actor: &Actor, document: &Document) -> bool {
    if document.uploaded_by_id == actor.id || actor.role == Role::Admin {
        return true;
    }
    match document.visibility {
        DocumentVisibility::Public => true,
        DocumentVisibility::Roles => {
            !document.allowed_roles.is_empty()
                && document
                    .allowed_roles
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(role_name(actor.role)))
        }
        DocumentVisibility::Users => document.allowed_user_ids.contains(&actor.id),
        DocumentVisibility::None => false,
    }
}

/// Claims do token de download. `sub` é o id do documento.
#[derive(Debug, Serialize, Deserialize)]
struct DownloadClaims {
    sub: i32,
    exp: usize,
}

pub struct UploadRequest {
    pub process_id: i32,
    pub department_id: Option<i32>,
    pub question_id: Option<i32>,
    pub file_name: String,
    pub content_type: String,
    pub category: Option<String>,
    pub bytes: Vec<u8>,
    pub visibility: Option<DocumentVisibility>,
    pub allowed_roles: Vec<String>,
    pub allowed_user_ids: Vec<i32>,
}

#[derive(Clone)]
pub struct DocumentService {
    repo: DocumentRepository,
    process_repo: ProcessRepository,
    trash_service: TrashService,
    audit_service: AuditService,
    storage: Arc<dyn DocumentStorage>,
    jwt_secret: String,
    pool: PgPool,
}

impl DocumentService {
    pub fn new(
        repo: DocumentRepository,
        process_repo: ProcessRepository,
        trash_service: TrashService,
        audit_service: AuditService,
        storage: Arc<dyn DocumentStorage>,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            process_repo,
            trash_service,
            audit_service,
            storage,
            jwt_secret,
            pool,
        }
    }

    pub async fn upload(&self, user: &User, request: UploadRequest) -> Result<Document, AppError> {
        let actor = Actor::from(user);

        let process = self
            .process_repo
            .find_by_id(request.process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

        ensure(
            &actor,
            Action::UploadDocument,
            &ActionContext::InDepartment {
                current_department: Some(process.current_department),
            },
        )?;

        // Nome sanitizado: o path no storage é interno e nunca derivado de
        // input sem filtro.
        let safe_name: String = request
            .file_name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let path = format!("processos/{}/{}-{}", process.id, Uuid::new_v4(), safe_name);

        self.storage.store(&path, &request.bytes).await?;

        let mut tx = self.pool.begin().await?;
        let document = self
            .repo
            .create(
                &mut *tx,
                NewDocument {
                    process_id: process.id,
                    department_id: request.department_id,
                    question_id: request.question_id,
                    name: &request.file_name,
                    doc_type: &request.content_type,
                    category: request.category.as_deref(),
                    size_bytes: request.bytes.len() as i64,
                    path: &path,
                    visibility: request.visibility.unwrap_or(DocumentVisibility::Public),
                    allowed_roles: &request.allowed_roles,
                    allowed_user_ids: &request.allowed_user_ids,
                    uploaded_by_id: user.id,
                },
            )
            .await?;

        self.process_repo
            .append_event(
                &mut *tx,
                process.id,
                HistoryEventType::Document,
                &format!("Documento anexado: {}", request.file_name),
                None,
                user.id,
            )
            .await?;
        tx.commit().await?;

        self.audit_service
            .log_entity(user.id, "ANEXAR_DOCUMENTO", "Document", document.id, &document.name)
            .await;

        Ok(document)
    }

    pub async fn list_for_process(
        &self,
        user: &User,
        process_id: i32,
        department_id: Option<i32>,
    ) -> Result<Vec<Document>, AppError> {
        let actor = Actor::from(user);
        let documents = self.repo.list_for_process(process_id, department_id).await?;
        Ok(documents
            .into_iter()
            .filter(|d| can_access(&actor, d))
            .collect())
    }

    /// Emite uma referência assinada nova a cada chamada. A URL anterior
    /// expira sozinha; nada aqui é reaproveitável ou permanente.
    pub async fn resolve(&self, user: &User, document_id: i32) -> Result<SignedReference, AppError> {
        let actor = Actor::from(user);
        let document = self
            .repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Documento".to_string()))?;

        if !can_access(&actor, &document) {
            return Err(AppError::Forbidden(
                "Sem permissão para acessar este documento".to_string(),
            ));
        }

        let exp = chrono::Utc::now()
            .timestamp() as usize
            + SIGNED_URL_TTL_SECS as usize;
        let claims = DownloadClaims {
            sub: document.id,
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?;

        Ok(SignedReference {
            url: format!("/api/documentos/arquivo?token={token}"),
            expires_in_secs: SIGNED_URL_TTL_SECS,
        })
    }

    /// Troca um token válido pelos bytes do objeto. Token vencido ou
    /// adulterado cai em InvalidToken.
    pub async fn download(&self, token: &str) -> Result<(Document, Vec<u8>), AppError> {
        let claims = decode::<DownloadClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?
        .claims;

        let document = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("Documento".to_string()))?;

        let bytes = self.storage.read(&document.path).await?;
        Ok((document, bytes))
    }

    /// Exclui a linha, arquiva o snapshot na lixeira e mantém o objeto no
    /// storage para uma eventual restauração.
    pub async fn delete(
        &self,
        user: &User,
        document_id: i32,
    ) -> Result<DeleteDocumentResponse, AppError> {
        let actor = Actor::from(user);
        let document = self
            .repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Documento".to_string()))?;

        if !can_access(&actor, &document) {
            return Err(AppError::Forbidden(
                "Sem permissão para excluir este documento".to_string(),
            ));
        }

        let warning = self
            .trash_service
            .archive_best_effort(
                user.id,
                ArchiveRequest {
                    item_type: crate::models::trash::TrashItemType::ProcessDocument,
                    original_item_id: document.id,
                    payload: snapshot(&document),
                    item_name: &document.name,
                    item_description: document.category.as_deref(),
                    process_id: Some(document.process_id),
                    department_id: document.department_id,
                    company_id: None,
                    visibility: document.visibility,
                    allowed_roles: &document.allowed_roles,
                    allowed_user_ids: &document.allowed_user_ids,
                },
            )
            .await;

        let mut tx = self.pool.begin().await?;
        self.repo.delete(&mut *tx, document.id).await?;
        self.process_repo
            .append_event(
                &mut *tx,
                document.process_id,
                HistoryEventType::Document,
                &format!("Documento excluído: {}", document.name),
                None,
                user.id,
            )
            .await?;
        tx.commit().await?;

        self.audit_service
            .log_entity(user.id, "EXCLUIR_DOCUMENTO", "Document", document.id, &document.name)
            .await;

        Ok(DeleteDocumentResponse {
            message: format!("\"{}\" foi movido para a lixeira.", document.name),
            days_until_purge: trash::RETENTION_DAYS,
            warning,
        })
    }
}

/// Snapshot completo para a lixeira. Serializar a entidade direto perderia o
/// `path` (marcado skip_serializing), então os campos vão um a um.
fn snapshot(document: &Document) -> serde_json::Value {
    serde_json::json!({
        "id": document.id,
        "processId": document.process_id,
        "departmentId": document.department_id,
        "questionId": document.question_id,
        "name": document.name,
        "docType": document.doc_type,
        "category": document.category,
        "sizeBytes": document.size_bytes,
        "path": document.path,
        "visibility": document.visibility,
        "allowedRoles": document.allowed_roles,
        "allowedUserIds": document.allowed_user_ids,
        "uploadedById": document.uploaded_by_id,
        "uploadedAt": document.uploaded_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(
        visibility: DocumentVisibility,
        allowed_roles: Vec<String>,
        allowed_user_ids: Vec<i32>,
        uploaded_by_id: i32,
    ) -> Document {
        Document {
            id: 1,
            process_id: 5,
            department_id: Some(2),
            question_id: None,
            name: "contrato.pdf".to_string(),
            doc_type: "application/pdf".to_string(),
            category: None,
            size_bytes: 1024,
            path: "processos/5/x-contrato.pdf".to_string(),
            visibility,
            allowed_roles,
            allowed_user_ids,
            uploaded_by_id,
            uploaded_at: Utc::now(),
        }
    }

    fn actor(id: i32, role: Role) -> Actor {
        Actor {
            id,
            role,
            department_id: Some(2),
        }
    }

    #[test]
    fn uploader_e_admin_sempre_acessam() {
        let d = doc(DocumentVisibility::None, vec![], vec![], 7);
        assert!(can_access(&actor(7, Role::User), &d));
        assert!(can_access(&actor(99, Role::Admin), &d));
        assert!(!can_access(&actor(8, Role::Manager), &d));
    }

    #[test]
    fn publico_acessivel_para_autenticados() {
        let d = doc(DocumentVisibility::Public, vec![], vec![], 1);
        assert!(can_access(&actor(42, Role::User), &d));
    }

    #[test]
    fn roles_com_lista_vazia_nega() {
        let d = doc(DocumentVisibility::Roles, vec![], vec![], 1);
        assert!(!can_access(&actor(2, Role::Manager), &d));
    }

    #[test]
    fn roles_compara_sem_caixa() {
        let d = doc(
            DocumentVisibility::Roles,
            vec!["manager".to_string()],
            vec![],
            1,
        );
        assert!(can_access(&actor(2, Role::Manager), &d));
        assert!(!can_access(&actor(3, Role::User), &d));
    }

    #[test]
    fn users_exige_id_na_lista() {
        let d = doc(DocumentVisibility::Users, vec![], vec![3], 1);
        assert!(can_access(&actor(3, Role::User), &d));
        assert!(!can_access(&actor(4, Role::User), &d));
    }

    #[test]
    fn snapshot_preserva_o_path_e_restaura() {
        let original = doc(DocumentVisibility::Public, vec![], vec![], 7);
        let value = snapshot(&original);
        let parsed: Document = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.path, original.path);
        assert_eq!(parsed.id, original.id);
        assert_eq!(parsed.size_bytes, original.size_bytes);
    }
}
