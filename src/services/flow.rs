// src/services/flow.rs

// Máquina de estados do fluxo: posição do processo na sequência de
// departamentos, regras de avanço/finalização e interligação. O plano de
// transição é função pura; o serviço só cola plano + transação + efeitos.

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        DepartmentRepository, ProcessRepository, TemplateRepository,
        process_repo::NewProcess,
    },
    models::{
        auth::User,
        process::{
            CreateProcessPayload, FinalizeProcessPayload, HistoryEventType, Process,
            ProcessPriority, ProcessResponse, ProcessStatus,
        },
        questionnaire::IncomingQuestion,
    },
    services::{
        audit::AuditService,
        notification::NotificationService,
        permissions::{Action, ActionContext, Actor, ensure},
        questionnaire::{QuestionnaireService, parse_questionnaire_presets},
    },
};

/// Resultado puro do planejamento de um avanço.
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionPlan {
    pub next_index: i32,
    pub next_department: i32,
    pub progress: i32,
}

/// `current_department_index` é a autoridade; `progress` é derivado e
/// meramente informativo.
pub fn compute_progress(index: usize, flow_len: usize) -> i32 {
    (((index + 1) as f64 / flow_len as f64) * 100.0).round() as i32
}

// Fluxo vazio ou com id malformado falha fechado, nunca avança em silêncio.
pub fn validate_flow(flow: &[i32]) -> Result<(), AppError> {
    if flow.is_empty() {
        return Err(AppError::InvalidTransition(
            "O fluxo de departamentos está vazio".to_string(),
        ));
    }
    if flow.iter().any(|id| *id <= 0) {
        return Err(AppError::InvalidTransition(
            "O fluxo de departamentos contém id inválido".to_string(),
        ));
    }
    Ok(())
}

pub fn plan_advance(flow: &[i32], current_index: i32) -> Result<TransitionPlan, AppError> {
    validate_flow(flow)?;

    let next_index = current_index + 1;
    if next_index < 0 || next_index as usize >= flow.len() {
        return Err(AppError::InvalidTransition(
            "Processo já está no último departamento".to_string(),
        ));
    }

    Ok(TransitionPlan {
        next_index,
        next_department: flow[next_index as usize],
        progress: compute_progress(next_index as usize, flow.len()),
    })
}

pub fn is_last_department(flow: &[i32], current_index: i32) -> bool {
    !flow.is_empty() && current_index as usize == flow.len() - 1
}

#[derive(Clone)]
pub struct FlowService {
    repo: ProcessRepository,
    department_repo: DepartmentRepository,
    template_repo: TemplateRepository,
    questionnaire_service: QuestionnaireService,
    notification_service: NotificationService,
    audit_service: AuditService,
    pool: PgPool,
}

impl FlowService {
    pub fn new(
        repo: ProcessRepository,
        department_repo: DepartmentRepository,
        template_repo: TemplateRepository,
        questionnaire_service: QuestionnaireService,
        notification_service: NotificationService,
        audit_service: AuditService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            department_repo,
            template_repo,
            questionnaire_service,
            notification_service,
            audit_service,
            pool,
        }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    pub async fn create_process(
        &self,
        user: &User,
        payload: CreateProcessPayload,
    ) -> Result<ProcessResponse, AppError> {
        let actor = Actor::from(user);

        // Personalizada exige permissão própria; via template basta a comum.
        if payload.custom {
            ensure(&actor, Action::CreateCustomProcess, &ActionContext::Global)?;
        } else {
            ensure(&actor, Action::CreateProcess, &ActionContext::Global)?;
        }

        let (flow, template_presets) = match payload.template_id {
            Some(template_id) => {
                let template = self
                    .template_repo
                    .find_by_id(template_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Template".to_string()))?;
                (template.department_flow, template.questionnaires_by_department)
            }
            None => (payload.department_flow.clone().unwrap_or_default(), None),
        };
        validate_flow(&flow)?;

        // Não-admin só abre processo cujo primeiro departamento é o seu.
        if !matches!(user.role, crate::models::auth::Role::Admin)
            && actor.department_id != Some(flow[0])
        {
            return Err(AppError::Forbidden(
                "Sem permissão para criar solicitação para outro departamento".to_string(),
            ));
        }

        let distinct: std::collections::HashSet<i32> = flow.iter().copied().collect();
        if self.department_repo.count_existing(&flow).await? != distinct.len() as i64 {
            return Err(AppError::NotFound("Departamento do fluxo".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let process = self
            .repo
            .create(
                &mut *tx,
                NewProcess {
                    name: &payload.name,
                    service_name: payload.service_name.as_deref(),
                    company_name: payload.company_name.as_deref(),
                    contact_name: payload.contact_name.as_deref(),
                    email: payload.email.as_deref(),
                    phone: payload.phone.as_deref(),
                    company_id: payload.company_id,
                    priority: payload.priority.unwrap_or(ProcessPriority::Medium),
                    department_flow: &flow,
                    description: payload.description.as_deref(),
                    creator_notes: payload.creator_notes.as_deref(),
                    independent_departments: payload.independent_departments,
                    created_by_id: user.id,
                    delivery_date: payload.delivery_date,
                    progress: compute_progress(0, flow.len()),
                },
            )
            .await?;

        self.repo
            .open_flow_step(&mut *tx, process.id, flow[0], 0)
            .await?;

        let action = format!(
            "Solicitação criada: {}",
            payload.service_name.as_deref().unwrap_or(&payload.name)
        );
        self.repo
            .append_event(
                &mut *tx,
                process.id,
                HistoryEventType::Start,
                &action,
                None,
                user.id,
            )
            .await?;

        tx.commit().await?;

        // Questionários do payload têm precedência; sem eles entram os
        // presets do template, se houver.
        let presets = payload
            .questionnaires_by_department
            .or_else(|| self.parse_presets(&template_presets));
        let warning = self.materialize_best_effort(process.id, presets).await;

        self.audit_service
            .log_process(user.id, "CRIAR", &process)
            .await;

        Ok(ProcessResponse { process, warning })
    }

    // =========================================================================
    //  AVANÇO
    // =========================================================================

    pub async fn advance(&self, user: &User, process_id: i32) -> Result<ProcessResponse, AppError> {
        let actor = Actor::from(user);

        // Checagem rápida antes de abrir transação: permissão e validação
        // falham sem nenhum estado parcial.
        let process = self
            .repo
            .find_by_id(process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        self.ensure_move(&actor, &process)?;

        let mut tx = self.pool.begin().await?;

        // Releitura com lock: um avanço concorrente no mesmo processo
        // serializa aqui e o perdedor falha no plano, não em estado parcial.
        let process = self
            .repo
            .find_by_id_for_update(&mut *tx, process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        self.ensure_move(&actor, &process)?;

        let plan = plan_advance(&process.department_flow, process.current_department_index)?;

        let next_department = self
            .department_repo
            .find_by_id(plan.next_department)
            .await?
            .ok_or_else(|| AppError::NotFound("Próximo departamento".to_string()))?;
        let current_department = self
            .department_repo
            .find_by_id(process.current_department)
            .await?;

        let updated = self
            .repo
            .advance_position(
                &mut *tx,
                process.id,
                plan.next_department,
                plan.next_index,
                plan.progress,
            )
            .await?;

        self.repo.close_active_flow_step(&mut *tx, process.id).await?;
        self.repo
            .open_flow_step(&mut *tx, process.id, plan.next_department, plan.next_index)
            .await?;

        let current_name = current_department
            .map(|d| d.name)
            .unwrap_or_else(|| "N/A".to_string());
        let action = format!(
            "Processo movido de \"{}\" para \"{}\"",
            current_name, next_department.name
        );
        self.repo
            .append_event(
                &mut *tx,
                process.id,
                HistoryEventType::Movement,
                &action,
                Some(&next_department.name),
                user.id,
            )
            .await?;

        tx.commit().await?;

        // Efeitos pós-commit, cada um isolado: falha vira log + warning,
        // nunca rollback.
        let warning = self
            .notification_service
            .on_process_moved(&updated, &next_department.name, user.id)
            .await;

        self.audit_service
            .log_process(user.id, "AVANCAR", &updated)
            .await;

        Ok(ProcessResponse {
            process: updated,
            warning,
        })
    }

    fn ensure_move(&self, actor: &Actor, process: &Process) -> Result<(), AppError> {
        if process.status == ProcessStatus::Finalized {
            return Err(AppError::InvalidTransition(
                "Processo já está finalizado".to_string(),
            ));
        }
        ensure(
            actor,
            Action::MoveProcess,
            &ActionContext::InDepartment {
                current_department: Some(process.current_department),
            },
        )
    }

    // =========================================================================
    //  FINALIZAÇÃO (+ interligação opcional)
    // =========================================================================

    pub async fn finalize(
        &self,
        user: &User,
        process_id: i32,
        payload: FinalizeProcessPayload,
    ) -> Result<ProcessResponse, AppError> {
        let actor = Actor::from(user);

        let process = self
            .repo
            .find_by_id(process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        self.ensure_finalize(&actor, &process)?;

        let mut tx = self.pool.begin().await?;

        let process = self
            .repo
            .find_by_id_for_update(&mut *tx, process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;
        self.ensure_finalize(&actor, &process)?;

        let finalized = self.repo.finalize(&mut *tx, process.id).await?;
        self.repo.close_active_flow_step(&mut *tx, process.id).await?;

        let action = format!(
            "Processo finalizado: {}",
            finalized.service_name.as_deref().unwrap_or(&finalized.name)
        );
        self.repo
            .append_event(
                &mut *tx,
                process.id,
                HistoryEventType::Finalize,
                &action,
                None,
                user.id,
            )
            .await?;

        // Interligação: dispara o sucessor a partir de um template, ainda na
        // mesma transação. A permissão de finalizar já cobre o disparo, então
        // a regra do primeiro-departamento não se aplica aqui.
        let mut successor_presets: Option<(i32, Option<serde_json::Value>)> = None;
        if let Some(interlink) = payload.interlink {
            let template = self
                .template_repo
                .find_by_id(interlink.template_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Template".to_string()))?;
            validate_flow(&template.department_flow)?;

            let successor_name = interlink
                .name
                .unwrap_or_else(|| format!("{} (continuação)", finalized.name));

            let successor = self
                .repo
                .create(
                    &mut *tx,
                    NewProcess {
                        name: &successor_name,
                        service_name: Some(template.name.as_str()),
                        company_name: interlink
                            .reuse_company_data
                            .then_some(finalized.company_name.as_deref())
                            .flatten(),
                        contact_name: interlink
                            .reuse_company_data
                            .then_some(finalized.contact_name.as_deref())
                            .flatten(),
                        email: interlink
                            .reuse_company_data
                            .then_some(finalized.email.as_deref())
                            .flatten(),
                        phone: interlink
                            .reuse_company_data
                            .then_some(finalized.phone.as_deref())
                            .flatten(),
                        company_id: interlink
                            .reuse_company_data
                            .then_some(finalized.company_id)
                            .flatten(),
                        priority: finalized.priority,
                        department_flow: &template.department_flow,
                        description: None,
                        creator_notes: None,
                        independent_departments: interlink.independent_departments,
                        created_by_id: user.id,
                        delivery_date: None,
                        progress: compute_progress(0, template.department_flow.len()),
                    },
                )
                .await?;

            self.repo
                .open_flow_step(&mut *tx, successor.id, template.department_flow[0], 0)
                .await?;
            self.repo
                .append_event(
                    &mut *tx,
                    successor.id,
                    HistoryEventType::Start,
                    &format!("Solicitação criada por interligação: {}", template.name),
                    None,
                    user.id,
                )
                .await?;

            self.repo
                .set_interlinked(&mut *tx, finalized.id, successor.id)
                .await?;
            self.repo
                .append_event(
                    &mut *tx,
                    finalized.id,
                    HistoryEventType::Interlink,
                    &format!("Processo interligado ao sucessor #{}", successor.id),
                    None,
                    user.id,
                )
                .await?;

            successor_presets = Some((successor.id, template.questionnaires_by_department));
        }

        tx.commit().await?;

        // O sucessor herda os presets de questionário do template.
        let mut warning = None;
        if let Some((successor_id, raw)) = successor_presets {
            warning = self
                .materialize_best_effort(successor_id, self.parse_presets(&raw))
                .await
                .map(|_| {
                    "Processo finalizado, mas os questionários do sucessor não foram salvos."
                        .to_string()
                });
        }

        // O pointer de interligação é gravado na transação; refetch devolve o
        // estado completo.
        let finalized = self
            .repo
            .find_by_id(process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

        self.audit_service
            .log_process(user.id, "FINALIZAR", &finalized)
            .await;

        Ok(ProcessResponse {
            process: finalized,
            warning,
        })
    }

    fn ensure_finalize(&self, actor: &Actor, process: &Process) -> Result<(), AppError> {
        if process.status == ProcessStatus::Finalized {
            return Err(AppError::InvalidTransition(
                "Processo já está finalizado".to_string(),
            ));
        }
        validate_flow(&process.department_flow)?;

        let is_last = is_last_department(
            &process.department_flow,
            process.current_department_index,
        );
        if !is_last {
            return Err(AppError::InvalidTransition(
                "Processo ainda não está no último departamento".to_string(),
            ));
        }

        ensure(
            actor,
            Action::FinalizeProcess,
            &ActionContext::Finalize {
                current_department: Some(process.current_department),
                is_last_department: Some(is_last),
            },
        )
    }

    fn parse_presets(
        &self,
        raw: &Option<serde_json::Value>,
    ) -> Option<std::collections::HashMap<String, Vec<IncomingQuestion>>> {
        let value = raw.as_ref()?;
        let parsed = parse_questionnaire_presets(value);
        if parsed.is_none() {
            tracing::warn!("Presets de questionário do template estão malformados, ignorando");
        }
        parsed
    }

    // Materialização fora da transação de criação: falha não desfaz o
    // processo, vira warning na resposta.
    async fn materialize_best_effort(
        &self,
        process_id: i32,
        presets: Option<std::collections::HashMap<String, Vec<IncomingQuestion>>>,
    ) -> Option<String> {
        let map = presets?;
        if let Err(e) = self
            .questionnaire_service
            .materialize_for_process(process_id, &map)
            .await
        {
            tracing::warn!("Falha ao persistir questionários do processo {}: {}", process_id, e);
            return Some("Processo criado, mas os questionários não foram salvos.".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avancar_no_meio_do_fluxo() {
        // Fluxo [1,2,3] no índice 0: avança para o departamento 2, índice 1,
        // progresso 67.
        let plan = plan_advance(&[1, 2, 3], 0).unwrap();
        assert_eq!(
            plan,
            TransitionPlan {
                next_index: 1,
                next_department: 2,
                progress: 67,
            }
        );
    }

    #[test]
    fn avancar_no_ultimo_departamento_falha() {
        let err = plan_advance(&[1, 2, 3], 2).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn fluxo_vazio_falha_fechado() {
        assert!(matches!(
            plan_advance(&[], 0).unwrap_err(),
            AppError::InvalidTransition(_)
        ));
        assert!(validate_flow(&[]).is_err());
    }

    #[test]
    fn fluxo_com_id_malformado_falha_fechado() {
        assert!(validate_flow(&[1, 0, 3]).is_err());
        assert!(validate_flow(&[1, -2]).is_err());
        assert!(validate_flow(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn progresso_arredonda_para_o_inteiro_mais_proximo() {
        assert_eq!(compute_progress(0, 3), 33);
        assert_eq!(compute_progress(1, 3), 67);
        assert_eq!(compute_progress(2, 3), 100);
        assert_eq!(compute_progress(0, 1), 100);
        assert_eq!(compute_progress(2, 7), 43);
    }

    #[test]
    fn ultimo_departamento() {
        assert!(is_last_department(&[1, 2, 3], 2));
        assert!(!is_last_department(&[1, 2, 3], 1));
        assert!(!is_last_department(&[], 0));
    }

    #[test]
    fn avancar_para_frente_do_fim_nunca_indexa_fora() {
        // Índices fora da faixa (corrompidos) falham em vez de estourar.
        assert!(plan_advance(&[1, 2, 3], 5).is_err());
        assert!(plan_advance(&[1, 2, 3], -2).is_err());
    }
}
