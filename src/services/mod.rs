pub mod audit;
pub mod auth;
pub mod document;
pub mod flow;
pub mod notification;
pub mod permissions;
pub mod questionnaire;
pub mod trash;
