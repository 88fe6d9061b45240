// src/services/notification.rs

// Notificações internas de movimentação: gestores do departamento destino e
// o criador do processo, nunca quem executou a ação. Tudo best-effort.

use crate::{
    db::{NotificationRepository, UserRepository},
    models::{notification::Notification, process::Process},
};

#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    user_repo: UserRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, user_repo: UserRepository) -> Self {
        Self { repo, user_repo }
    }

    /// Notifica a chegada de um processo no departamento destino. Retorna um
    /// aviso para a resposta quando algo falhou no meio.
    pub async fn on_process_moved(
        &self,
        process: &Process,
        destination_name: &str,
        actor_id: i32,
    ) -> Option<String> {
        let mut recipients: Vec<i32> = match self
            .user_repo
            .managers_of_department(process.current_department)
            .await
        {
            Ok(managers) => managers.into_iter().map(|m| m.id).collect(),
            Err(e) => {
                tracing::warn!(
                    "Falha ao listar gestores do departamento {}: {}",
                    process.current_department,
                    e
                );
                return Some("Processo movido, mas as notificações falharam.".to_string());
            }
        };
        recipients.push(process.created_by_id);
        recipients.sort_unstable();
        recipients.dedup();
        recipients.retain(|id| *id != actor_id);

        let title = format!("Processo \"{}\" chegou em {}", process.name, destination_name);
        let mut failed = false;
        for user_id in recipients {
            if let Err(e) = self
                .repo
                .insert(user_id, Some(process.id), &title, None)
                .await
            {
                tracing::warn!("Falha ao notificar usuário {}: {}", user_id, e);
                failed = true;
            }
        }

        failed.then(|| "Processo movido, mas as notificações falharam.".to_string())
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Notification>, crate::common::error::AppError> {
        self.repo.list_for_user(user_id).await
    }

    pub async fn mark_read(&self, id: i32, user_id: i32) -> Result<(), crate::common::error::AppError> {
        self.repo.mark_read(id, user_id).await
    }
}
