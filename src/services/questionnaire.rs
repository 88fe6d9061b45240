// src/services/questionnaire.rs

// Questionários por departamento: materialização na criação do processo
// (com remapeamento de ids temporários do front), respostas com upsert e
// montagem das perguntas efetivas para a UI.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ProcessRepository, QuestionnaireRepository},
    models::{
        auth::User,
        process::ProcessStatus,
        questionnaire::{
            Answer, EffectiveQuestion, IncomingQuestion, Question, QuestionType,
            SaveAnswersPayload,
        },
    },
    services::{
        audit::AuditService,
        permissions::{Action, ActionContext, Actor, ensure},
    },
};

/// Condição remapeada para ids persistentes. Referência a um id temporário
/// inexistente vira `None` e a pergunta fica sempre visível.
pub fn remap_condition(
    question: &IncomingQuestion,
    id_map: &HashMap<i64, i32>,
) -> Option<(i32, String, String)> {
    let condition = question.condition.as_ref()?;
    let persistent = id_map.get(&condition.question_id)?;
    Some((
        *persistent,
        condition
            .operator
            .clone()
            .unwrap_or_else(|| "equals".to_string()),
        condition.value.clone().unwrap_or_default(),
    ))
}

/// Avalia a condição de exibição contra a resposta da pergunta-pai.
/// Sem condição, pergunta sempre visível. Com condição e pai sem resposta,
/// fica oculta até o pai ser respondido.
pub fn condition_satisfied(
    operator: &str,
    expected: &str,
    parent_answer: Option<&str>,
) -> bool {
    let Some(answer) = parent_answer else {
        return false;
    };
    let answer = answer.trim();
    let expected = expected.trim();
    match operator {
        "not_equals" => !answer.eq_ignore_ascii_case(expected),
        "contains" => answer.to_lowercase().contains(&expected.to_lowercase()),
        // "equals" e qualquer operador desconhecido caem na igualdade.
        _ => answer.eq_ignore_ascii_case(expected),
    }
}

/// Presets de questionário guardados em um template, convertidos de volta
/// para o formato de materialização. JSON malformado vira `None` e é logado
/// pelo chamador.
pub fn parse_questionnaire_presets(
    value: &serde_json::Value,
) -> Option<HashMap<String, Vec<IncomingQuestion>>> {
    serde_json::from_value(value.clone()).ok()
}

/// Valor JSON vindo do front normalizado para texto. String vai crua; o
/// resto é serializado como JSON.
pub fn answer_value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Clone)]
pub struct QuestionnaireService {
    repo: QuestionnaireRepository,
    process_repo: ProcessRepository,
    audit_service: AuditService,
    pool: PgPool,
}

impl QuestionnaireService {
    pub fn new(
        repo: QuestionnaireRepository,
        process_repo: ProcessRepository,
        audit_service: AuditService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            process_repo,
            audit_service,
            pool,
        }
    }

    /// Persiste os questionários personalizados enviados na criação do
    /// processo. Dois passos: primeiro todas as perguntas (sem condição),
    /// depois as condições com os ids já persistentes.
    pub async fn materialize_for_process(
        &self,
        process_id: i32,
        by_department: &HashMap<String, Vec<IncomingQuestion>>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // id temporário do front -> id persistente
        let mut id_map: HashMap<i64, i32> = HashMap::new();
        let mut created: Vec<(Question, IncomingQuestion)> = Vec::new();

        for (department_key, questions) in by_department {
            let Ok(department_id) = department_key.parse::<i32>() else {
                tracing::warn!(
                    "Chave de departamento inválida em questionário: {}",
                    department_key
                );
                continue;
            };

            for (position, incoming) in questions.iter().enumerate() {
                let question_type = incoming
                    .question_type
                    .as_deref()
                    .map(QuestionType::parse_loose)
                    .unwrap_or(QuestionType::Text);

                let question = self
                    .repo
                    .create_question(
                        &mut *tx,
                        Some(process_id),
                        department_id,
                        &incoming.label,
                        question_type,
                        incoming.required,
                        incoming.display_order.unwrap_or(position as i32),
                        &incoming.options,
                    )
                    .await?;

                if let Some(temp_id) = incoming.id {
                    id_map.insert(temp_id, question.id);
                }
                created.push((question, incoming.clone()));
            }
        }

        for (question, incoming) in &created {
            match remap_condition(incoming, &id_map) {
                Some((condition_question_id, operator, value)) => {
                    self.repo
                        .set_condition(
                            &mut *tx,
                            question.id,
                            Some(condition_question_id),
                            Some(&operator),
                            Some(&value),
                        )
                        .await?;
                }
                None if incoming.condition.is_some() => {
                    // Referência pendurada: persiste sem condição.
                    tracing::warn!(
                        "Condição da pergunta {} referencia id temporário inexistente",
                        question.id
                    );
                }
                None => {}
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Perguntas efetivas de um departamento para a UI, com resposta atual,
    /// estado de respondida e visibilidade condicional resolvida.
    pub async fn effective_questions(
        &self,
        user: &User,
        process_id: i32,
        department_id: i32,
    ) -> Result<Vec<EffectiveQuestion>, AppError> {
        let actor = Actor::from(user);
        ensure(&actor, Action::ViewQuestionnaire, &ActionContext::Global)?;

        self.process_repo
            .find_by_id(process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

        let questions = self.repo.effective_questions(process_id, department_id).await?;
        let answers = self.repo.answers_for_process(process_id).await?;
        let with_documents = self
            .repo
            .question_ids_with_documents(process_id, department_id)
            .await?;

        let answer_by_question: HashMap<i32, &Answer> =
            answers.iter().map(|a| (a.question_id, a)).collect();

        let effective = questions
            .into_iter()
            .map(|question| {
                let answer = answer_by_question
                    .get(&question.id)
                    .map(|a| a.value.clone());

                // FILE conta como respondida por documento anexado; as demais
                // por valor não-vazio depois de trim.
                let answered = if question.question_type == QuestionType::File {
                    with_documents.contains(&question.id)
                        || answer.as_deref().is_some_and(|v| !v.trim().is_empty())
                } else {
                    answer.as_deref().is_some_and(|v| !v.trim().is_empty())
                };

                let visible = match (
                    question.condition_question_id,
                    question.condition_operator.as_deref(),
                    question.condition_value.as_deref(),
                ) {
                    (Some(parent_id), operator, value) => {
                        let parent_answer = answer_by_question
                            .get(&parent_id)
                            .map(|a| a.value.as_str());
                        condition_satisfied(
                            operator.unwrap_or("equals"),
                            value.unwrap_or(""),
                            parent_answer,
                        )
                    }
                    _ => true,
                };

                EffectiveQuestion {
                    question,
                    answer,
                    answered,
                    visible,
                }
            })
            .collect();

        Ok(effective)
    }

    /// Salva um lote de respostas. A permissão é avaliada contra o
    /// departamento ATUAL do processo, não contra o enviado no payload.
    pub async fn save_answers(
        &self,
        user: &User,
        payload: SaveAnswersPayload,
    ) -> Result<Vec<Answer>, AppError> {
        let actor = Actor::from(user);

        let process = self
            .process_repo
            .find_by_id(payload.process_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processo".to_string()))?;

        if process.status == ProcessStatus::Finalized {
            return Err(AppError::InvalidTransition(
                "Processo já está finalizado".to_string(),
            ));
        }

        ensure(
            &actor,
            Action::FillQuestionnaire,
            &ActionContext::InDepartment {
                current_department: Some(process.current_department),
            },
        )?;

        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(payload.answers.len());

        for (question_key, value) in &payload.answers {
            let Ok(question_id) = question_key.parse::<i32>() else {
                tracing::warn!("Chave de pergunta inválida: {}", question_key);
                continue;
            };

            let question = self
                .repo
                .find_by_id(question_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Pergunta".to_string()))?;
            if let Some(owner) = question.process_id {
                if owner != payload.process_id {
                    return Err(AppError::Forbidden(
                        "Pergunta não pertence a este processo".to_string(),
                    ));
                }
            }

            let text = answer_value_to_text(value);
            let answer = self
                .repo
                .upsert_answer(&mut *tx, payload.process_id, question_id, &text, user.id)
                .await?;
            saved.push(answer);
        }

        tx.commit().await?;

        self.audit_service
            .log(
                user.id,
                "RESPONDER_QUESTIONARIO",
                "Process",
                Some(payload.process_id),
                None,
            )
            .await;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::questionnaire::IncomingCondition;

    fn incoming(id: i64, condition: Option<IncomingCondition>) -> IncomingQuestion {
        IncomingQuestion {
            id: Some(id),
            label: format!("Pergunta {id}"),
            question_type: None,
            required: false,
            display_order: None,
            options: vec![],
            condition,
        }
    }

    #[test]
    fn remapeia_condicao_para_id_persistente() {
        let mut map = HashMap::new();
        map.insert(1_700_000_000_001_i64, 41);
        map.insert(1_700_000_000_002_i64, 42);

        let q = incoming(
            1_700_000_000_002,
            Some(IncomingCondition {
                question_id: 1_700_000_000_001,
                operator: Some("equals".to_string()),
                value: Some("Sim".to_string()),
            }),
        );

        assert_eq!(
            remap_condition(&q, &map),
            Some((41, "equals".to_string(), "Sim".to_string()))
        );
    }

    #[test]
    fn condicao_pendurada_vira_none() {
        let map = HashMap::from([(10_i64, 41)]);
        let q = incoming(
            11,
            Some(IncomingCondition {
                question_id: 999,
                operator: None,
                value: Some("Sim".to_string()),
            }),
        );
        assert_eq!(remap_condition(&q, &map), None);
    }

    #[test]
    fn sem_condicao_vira_none() {
        let map = HashMap::new();
        assert_eq!(remap_condition(&incoming(1, None), &map), None);
    }

    #[test]
    fn operadores_de_visibilidade() {
        assert!(condition_satisfied("equals", "Sim", Some("sim")));
        assert!(!condition_satisfied("equals", "Sim", Some("Não")));
        assert!(condition_satisfied("not_equals", "Sim", Some("Não")));
        assert!(condition_satisfied("contains", "cert", Some("Tenho certificado")));
        assert!(!condition_satisfied("contains", "cert", Some("Nenhum")));
        // Pai sem resposta: oculta.
        assert!(!condition_satisfied("equals", "Sim", None));
        // Operador desconhecido cai em igualdade.
        assert!(condition_satisfied("???", "x", Some("x")));
    }

    #[test]
    fn preset_de_template_parseia_com_condicao() {
        let preset = serde_json::json!({
            "3": [
                { "id": 1_700_000_000_001_i64, "label": "Tem certificado digital?", "options": ["Sim", "Não"] },
                {
                    "id": 1_700_000_000_002_i64,
                    "label": "Qual a validade?",
                    "condition": { "questionId": 1_700_000_000_001_i64, "operator": "equals", "value": "Sim" }
                }
            ]
        });

        let parsed = parse_questionnaire_presets(&preset).unwrap();
        let questions = &parsed["3"];
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].label, "Tem certificado digital?");

        // A condição do preset segue remapeável como na criação direta.
        let mut ids = HashMap::new();
        ids.insert(1_700_000_000_001_i64, 77);
        let remapped = remap_condition(&questions[1], &ids).unwrap();
        assert_eq!(remapped, (77, "equals".to_string(), "Sim".to_string()));
    }

    #[test]
    fn preset_malformado_vira_none() {
        assert!(
            parse_questionnaire_presets(&serde_json::json!({ "3": "não é lista" })).is_none()
        );
    }

    #[test]
    fn valor_json_vira_texto() {
        assert_eq!(answer_value_to_text(&serde_json::json!("abc")), "abc");
        assert_eq!(answer_value_to_text(&serde_json::json!(42)), "42");
        assert_eq!(answer_value_to_text(&serde_json::json!(true)), "true");
        assert_eq!(
            answer_value_to_text(&serde_json::json!(["a", "b"])),
            "[\"a\",\"b\"]"
        );
    }
}
