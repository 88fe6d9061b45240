// src/services/permissions.rs

// Avaliador de permissões. Função pura: (papel, departamento do ator, ação,
// departamento contextual do alvo) -> permitido/negado. Nenhum estado;
// consumido por todos os serviços.

use crate::common::error::AppError;
use crate::models::auth::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProcess,
    CreateCustomProcess,
    EditProcess,
    DeleteProcess,
    MoveProcess,
    FinalizeProcess,
    ManageUsers,
    ManageDepartments,
    CreateCompany,
    EditCompany,
    ManageTags,
    ApplyTags,
    Comment,
    FillQuestionnaire,
    ViewQuestionnaire,
    UploadDocument,
    ViewAnalytics,
}

/// Recorte do usuário que o avaliador enxerga.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: i32,
    pub role: Role,
    pub department_id: Option<i32>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            role: user.role,
            department_id: user.department_id,
        }
    }
}

/// Contexto discriminado por ação: campo faltando é questão de tipo, não
/// de runtime.
#[derive(Debug, Clone, Copy)]
pub enum ActionContext {
    Global,
    /// Ações gated pelo departamento atual do alvo.
    InDepartment { current_department: Option<i32> },
    /// Finalização carrega também se o processo está no último departamento.
    Finalize {
        current_department: Option<i32>,
        is_last_department: Option<bool>,
    },
}

impl ActionContext {
    fn current_department(&self) -> Option<i32> {
        match self {
            ActionContext::Global => None,
            ActionContext::InDepartment { current_department }
            | ActionContext::Finalize {
                current_department, ..
            } => *current_department,
        }
    }
}

// Igualdade estrita de departamento. Id ausente ou malformado de qualquer
// lado nega: "desconhecido" nunca vira "permitido".
fn department_match(actor: &Actor, context: &ActionContext) -> bool {
    match (actor.department_id, context.current_department()) {
        (Some(mine), Some(target)) if mine > 0 && target > 0 => mine == target,
        _ => false,
    }
}

pub fn can_perform(actor: Option<&Actor>, action: Action, context: &ActionContext) -> bool {
    let Some(actor) = actor else {
        // Ator não autenticado: nada.
        return false;
    };

    match actor.role {
        // Admin tem acesso total, incondicionalmente.
        Role::Admin => true,

        Role::Manager => match action {
            Action::ManageUsers | Action::ManageDepartments => false,
            Action::EditProcess => false,
            Action::CreateCompany => false,

            Action::DeleteProcess | Action::MoveProcess => department_match(actor, context),

            Action::FinalizeProcess => {
                if !department_match(actor, context) {
                    return false;
                }
                // is_last_department, quando informado, precisa ser true.
                match context {
                    ActionContext::Finalize {
                        is_last_department: Some(last),
                        ..
                    } => *last,
                    _ => true,
                }
            }

            Action::FillQuestionnaire | Action::UploadDocument => {
                department_match(actor, context)
            }

            Action::CreateProcess
            | Action::CreateCustomProcess
            | Action::EditCompany
            | Action::ManageTags
            | Action::ApplyTags
            | Action::Comment
            | Action::ViewQuestionnaire
            | Action::ViewAnalytics => true,
        },

        Role::User => match action {
            Action::ViewAnalytics
            | Action::CreateProcess
            | Action::Comment
            | Action::ApplyTags
            | Action::ViewQuestionnaire => true,

            Action::FillQuestionnaire | Action::UploadDocument => {
                department_match(actor, context)
            }

            Action::CreateCustomProcess
            | Action::EditProcess
            | Action::DeleteProcess
            | Action::MoveProcess
            | Action::FinalizeProcess
            | Action::ManageUsers
            | Action::ManageDepartments
            | Action::CreateCompany
            | Action::EditCompany
            | Action::ManageTags => false,
        },
    }
}

/// Variante que devolve `Forbidden` pronto para propagar com `?`.
pub fn ensure(actor: &Actor, action: Action, context: &ActionContext) -> Result<(), AppError> {
    if can_perform(Some(actor), action, context) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Sem permissão para realizar esta ação".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, department_id: Option<i32>) -> Actor {
        Actor {
            id: 1,
            role,
            department_id,
        }
    }

    fn in_dept(dept: Option<i32>) -> ActionContext {
        ActionContext::InDepartment {
            current_department: dept,
        }
    }

    #[test]
    fn admin_pode_tudo() {
        let admin = actor(Role::Admin, None);
        for action in [
            Action::MoveProcess,
            Action::FinalizeProcess,
            Action::ManageUsers,
            Action::ManageDepartments,
            Action::CreateCompany,
            Action::DeleteProcess,
            Action::CreateCustomProcess,
        ] {
            assert!(can_perform(Some(&admin), action, &ActionContext::Global));
        }
    }

    #[test]
    fn anonimo_nao_pode_nada() {
        assert!(!can_perform(None, Action::ViewQuestionnaire, &ActionContext::Global));
        assert!(!can_perform(None, Action::CreateProcess, &ActionContext::Global));
    }

    #[test]
    fn gerente_move_apenas_no_proprio_departamento() {
        let gerente = actor(Role::Manager, Some(3));
        assert!(can_perform(Some(&gerente), Action::MoveProcess, &in_dept(Some(3))));
        assert!(!can_perform(Some(&gerente), Action::MoveProcess, &in_dept(Some(4))));
    }

    #[test]
    fn departamento_ausente_nega_em_vez_de_permitir() {
        let gerente = actor(Role::Manager, Some(3));
        assert!(!can_perform(Some(&gerente), Action::MoveProcess, &in_dept(None)));

        let sem_departamento = actor(Role::Manager, None);
        assert!(!can_perform(
            Some(&sem_departamento),
            Action::MoveProcess,
            &in_dept(Some(3))
        ));
    }

    #[test]
    fn id_de_departamento_malformado_nega() {
        let gerente = actor(Role::Manager, Some(0));
        assert!(!can_perform(Some(&gerente), Action::MoveProcess, &in_dept(Some(0))));
        let gerente = actor(Role::Manager, Some(-5));
        assert!(!can_perform(Some(&gerente), Action::DeleteProcess, &in_dept(Some(-5))));
    }

    #[test]
    fn gerente_nao_gerencia_usuarios_nem_departamentos_nem_edita_processo() {
        let gerente = actor(Role::Manager, Some(3));
        assert!(!can_perform(Some(&gerente), Action::ManageUsers, &ActionContext::Global));
        assert!(!can_perform(
            Some(&gerente),
            Action::ManageDepartments,
            &ActionContext::Global
        ));
        assert!(!can_perform(Some(&gerente), Action::EditProcess, &in_dept(Some(3))));
        assert!(!can_perform(Some(&gerente), Action::CreateCompany, &ActionContext::Global));
        assert!(can_perform(Some(&gerente), Action::EditCompany, &ActionContext::Global));
    }

    #[test]
    fn gerente_finaliza_somente_no_ultimo_departamento() {
        let gerente = actor(Role::Manager, Some(3));

        let ultimo = ActionContext::Finalize {
            current_department: Some(3),
            is_last_department: Some(true),
        };
        assert!(can_perform(Some(&gerente), Action::FinalizeProcess, &ultimo));

        let nao_ultimo = ActionContext::Finalize {
            current_department: Some(3),
            is_last_department: Some(false),
        };
        assert!(!can_perform(Some(&gerente), Action::FinalizeProcess, &nao_ultimo));

        // Campo não informado: só o match de departamento decide.
        let sem_flag = ActionContext::Finalize {
            current_department: Some(3),
            is_last_department: None,
        };
        assert!(can_perform(Some(&gerente), Action::FinalizeProcess, &sem_flag));
    }

    #[test]
    fn usuario_comum_nunca_move_nem_finaliza() {
        let usuario = actor(Role::User, Some(3));
        assert!(!can_perform(Some(&usuario), Action::MoveProcess, &in_dept(Some(3))));
        assert!(!can_perform(Some(&usuario), Action::FinalizeProcess, &in_dept(Some(3))));
        assert!(!can_perform(Some(&usuario), Action::EditProcess, &in_dept(Some(3))));
        assert!(!can_perform(Some(&usuario), Action::DeleteProcess, &in_dept(Some(3))));
    }

    #[test]
    fn usuario_comum_cria_por_template_mas_nao_personalizada() {
        let usuario = actor(Role::User, Some(3));
        assert!(can_perform(Some(&usuario), Action::CreateProcess, &ActionContext::Global));
        assert!(!can_perform(
            Some(&usuario),
            Action::CreateCustomProcess,
            &ActionContext::Global
        ));
    }

    #[test]
    fn usuario_comum_preenche_questionario_so_no_proprio_departamento() {
        let usuario = actor(Role::User, Some(3));
        assert!(can_perform(Some(&usuario), Action::FillQuestionnaire, &in_dept(Some(3))));
        assert!(!can_perform(Some(&usuario), Action::FillQuestionnaire, &in_dept(Some(7))));
    }

    #[test]
    fn usuario_comum_permissoes_basicas() {
        let usuario = actor(Role::User, Some(3));
        assert!(can_perform(Some(&usuario), Action::Comment, &ActionContext::Global));
        assert!(can_perform(Some(&usuario), Action::ApplyTags, &ActionContext::Global));
        assert!(can_perform(Some(&usuario), Action::ViewQuestionnaire, &ActionContext::Global));
        assert!(can_perform(Some(&usuario), Action::ViewAnalytics, &ActionContext::Global));
        assert!(!can_perform(Some(&usuario), Action::ManageTags, &ActionContext::Global));
        assert!(!can_perform(Some(&usuario), Action::ManageUsers, &ActionContext::Global));
    }
}
