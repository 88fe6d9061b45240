pub mod user_repo;
pub use user_repo::UserRepository;
pub mod department_repo;
pub use department_repo::DepartmentRepository;
pub mod process_repo;
pub use process_repo::ProcessRepository;
pub mod questionnaire_repo;
pub use questionnaire_repo::QuestionnaireRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod template_repo;
pub use template_repo::TemplateRepository;
pub mod tag_repo;
pub use tag_repo::TagRepository;
pub mod trash_repo;
pub use trash_repo::TrashRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
