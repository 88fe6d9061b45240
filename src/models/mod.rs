pub mod auth;
pub mod company;
pub mod department;
pub mod document;
pub mod notification;
pub mod process;
pub mod questionnaire;
pub mod tag;
pub mod template;
pub mod trash;
