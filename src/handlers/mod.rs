pub mod auth;
pub mod companies;
pub mod departments;
pub mod documents;
pub mod notifications;
pub mod processes;
pub mod questionnaires;
pub mod tags;
pub mod templates;
pub mod trash;
pub mod users;
