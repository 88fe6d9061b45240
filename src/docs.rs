// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Usuários ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Departamentos ---
        handlers::departments::list_departments,
        handlers::departments::get_department,
        handlers::departments::create_department,
        handlers::departments::update_department,
        handlers::departments::delete_department,

        // --- Empresas ---
        handlers::companies::list_companies,
        handlers::companies::create_company,
        handlers::companies::update_company,
        handlers::companies::delete_company,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::create_template,
        handlers::templates::delete_template,

        // --- Processos ---
        handlers::processes::list_processes,
        handlers::processes::get_process,
        handlers::processes::create_process,
        handlers::processes::delete_process,
        handlers::processes::advance_process,
        handlers::processes::finalize_process,
        handlers::processes::create_comment,
        handlers::processes::delete_comment,
        handlers::processes::apply_tag,
        handlers::processes::remove_tag,

        // --- Questionários ---
        handlers::questionnaires::get_questionnaire,
        handlers::questionnaires::save_answers,

        // --- Documentos ---
        handlers::documents::upload_document,
        handlers::documents::list_process_documents,
        handlers::documents::resolve_document,
        handlers::documents::download_document,
        handlers::documents::delete_document,

        // --- Lixeira ---
        handlers::trash::list_trash,
        handlers::trash::restore_trash_item,

        // --- Notificações ---
        handlers::notifications::list_notifications,
        handlers::notifications::mark_notification_read,

        // --- Tags ---
        handlers::tags::list_tags,
        handlers::tags::create_tag,
        handlers::tags::delete_tag,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,

            // --- Departamentos ---
            models::department::Department,
            models::department::CreateDepartmentPayload,
            models::department::UpdateDepartmentPayload,

            // --- Empresas ---
            models::company::Company,
            models::company::CreateCompanyPayload,
            models::company::UpdateCompanyPayload,

            // --- Templates ---
            models::template::Template,
            models::template::CreateTemplatePayload,

            // --- Processos ---
            models::process::ProcessStatus,
            models::process::ProcessPriority,
            models::process::FlowStepStatus,
            models::process::HistoryEventType,
            models::process::Process,
            models::process::FlowStep,
            models::process::HistoryEvent,
            models::process::Comment,
            models::process::CreateProcessPayload,
            models::process::FinalizeProcessPayload,
            models::process::InterlinkPayload,
            models::process::CreateCommentPayload,
            models::process::ProcessResponse,
            handlers::processes::ProcessDetail,

            // --- Questionários ---
            models::questionnaire::QuestionType,
            models::questionnaire::Question,
            models::questionnaire::IncomingQuestion,
            models::questionnaire::IncomingCondition,
            models::questionnaire::Answer,
            models::questionnaire::SaveAnswersPayload,
            models::questionnaire::EffectiveQuestion,

            // --- Documentos ---
            models::document::DocumentVisibility,
            models::document::Document,
            models::document::SignedReference,
            models::document::DeleteDocumentResponse,

            // --- Lixeira ---
            models::trash::TrashItemType,
            models::trash::TrashItem,
            models::notification::Notification,

            // --- Tags ---
            models::tag::Tag,
            models::tag::CreateTagPayload,
            models::tag::ApplyTagPayload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registro e login"),
        (name = "Usuários", description = "Gestão de usuários (admin)"),
        (name = "Departamentos", description = "Departamentos do fluxo"),
        (name = "Empresas", description = "Clientes do escritório"),
        (name = "Templates", description = "Modelos de fluxo"),
        (name = "Processos", description = "Workflow de solicitações"),
        (name = "Questionários", description = "Perguntas e respostas por departamento"),
        (name = "Documentos", description = "Anexos com acesso assinado"),
        (name = "Lixeira", description = "Exclusões recuperáveis"),
        (name = "Notificações", description = "Sino da UI"),
        (name = "Tags", description = "Etiquetas de processos"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
