// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    common::storage::{DocumentStorage, FsStorage},
    db::{
        AuditRepository, CompanyRepository, DepartmentRepository, DocumentRepository,
        NotificationRepository, ProcessRepository, QuestionnaireRepository, TagRepository,
        TemplateRepository, TrashRepository, UserRepository,
    },
    services::{
        audit::AuditService,
        auth::{AuthService, UserCache},
        document::DocumentService,
        flow::FlowService,
        notification::NotificationService,
        questionnaire::QuestionnaireService,
        trash::TrashService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub flow_service: FlowService,
    pub questionnaire_service: QuestionnaireService,
    pub document_service: DocumentService,
    pub trash_service: TrashService,
    pub notification_service: NotificationService,
    pub audit_service: AuditService,
    pub user_repo: UserRepository,
    pub department_repo: DepartmentRepository,
    pub process_repo: ProcessRepository,
    pub company_repo: CompanyRepository,
    pub template_repo: TemplateRepository,
    pub tag_repo: TagRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let storage_dir =
            env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let storage: Arc<dyn DocumentStorage> = Arc::new(FsStorage::new(storage_dir));

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let department_repo = DepartmentRepository::new(db_pool.clone());
        let process_repo = ProcessRepository::new(db_pool.clone());
        let questionnaire_repo = QuestionnaireRepository::new(db_pool.clone());
        let document_repo = DocumentRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let template_repo = TemplateRepository::new(db_pool.clone());
        let tag_repo = TagRepository::new(db_pool.clone());
        let trash_repo = TrashRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            jwt_secret.clone(),
            UserCache::new(Duration::from_secs(60)),
        );
        let audit_service = AuditService::new(audit_repo);
        let notification_service =
            NotificationService::new(notification_repo, user_repo.clone());
        let trash_service = TrashService::new(
            trash_repo,
            document_repo.clone(),
            db_pool.clone(),
        );
        let questionnaire_service = QuestionnaireService::new(
            questionnaire_repo,
            process_repo.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );
        let document_service = DocumentService::new(
            document_repo,
            process_repo.clone(),
            trash_service.clone(),
            audit_service.clone(),
            storage,
            jwt_secret,
            db_pool.clone(),
        );
        let flow_service = FlowService::new(
            process_repo.clone(),
            department_repo.clone(),
            template_repo.clone(),
            questionnaire_service.clone(),
            notification_service.clone(),
            audit_service.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            flow_service,
            questionnaire_service,
            document_service,
            trash_service,
            notification_service,
            audit_service,
            user_repo,
            department_repo,
            process_repo,
            company_repo,
            template_repo,
            tag_repo,
        })
    }
}
