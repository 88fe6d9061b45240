//src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_middleware;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas: autenticação e o download por token assinado (o token
    // é a credencial).
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        );

    let department_routes = Router::new()
        .route(
            "/",
            get(handlers::departments::list_departments)
                .post(handlers::departments::create_department),
        )
        .route(
            "/{id}",
            get(handlers::departments::get_department)
                .put(handlers::departments::update_department)
                .delete(handlers::departments::delete_department),
        );

    let company_routes = Router::new()
        .route(
            "/",
            get(handlers::companies::list_companies).post(handlers::companies::create_company),
        )
        .route(
            "/{id}",
            put(handlers::companies::update_company).delete(handlers::companies::delete_company),
        );

    let template_routes = Router::new()
        .route(
            "/",
            get(handlers::templates::list_templates).post(handlers::templates::create_template),
        )
        .route("/{id}", axum::routing::delete(handlers::templates::delete_template));

    let process_routes = Router::new()
        .route(
            "/",
            get(handlers::processes::list_processes).post(handlers::processes::create_process),
        )
        .route(
            "/{id}",
            get(handlers::processes::get_process).delete(handlers::processes::delete_process),
        )
        .route("/{id}/avancar", post(handlers::processes::advance_process))
        .route("/{id}/finalizar", post(handlers::processes::finalize_process))
        .route("/{id}/comentarios", post(handlers::processes::create_comment))
        .route("/{id}/questionario", get(handlers::questionnaires::get_questionnaire))
        .route("/{id}/documentos", get(handlers::documents::list_process_documents))
        .route(
            "/{id}/tags",
            post(handlers::processes::apply_tag),
        )
        .route(
            "/{id}/tags/{tag_id}",
            axum::routing::delete(handlers::processes::remove_tag),
        );

    let questionnaire_routes = Router::new().route(
        "/salvar-respostas",
        post(handlers::questionnaires::save_answers),
    );

    let document_routes = Router::new()
        .route("/", post(handlers::documents::upload_document))
        .route(
            "/{id}",
            get(handlers::documents::resolve_document)
                .delete(handlers::documents::delete_document),
        );

    let trash_routes = Router::new()
        .route("/", get(handlers::trash::list_trash))
        .route("/{id}/restaurar", post(handlers::trash::restore_trash_item));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route(
            "/{id}/marcar-lida",
            post(handlers::notifications::mark_notification_read),
        );

    let tag_routes = Router::new()
        .route(
            "/",
            get(handlers::tags::list_tags).post(handlers::tags::create_tag),
        )
        .route("/{id}", axum::routing::delete(handlers::tags::delete_tag));

    // Tudo que exige usuário autenticado passa pelo middleware de token.
    let protected = Router::new()
        .nest("/api/usuarios", user_routes)
        .nest("/api/departamentos", department_routes)
        .nest("/api/empresas", company_routes)
        .nest("/api/templates", template_routes)
        .nest("/api/processos", process_routes)
        .nest("/api/questionarios", questionnaire_routes)
        .nest("/api/documentos", document_routes)
        .nest("/api/lixeira", trash_routes)
        .nest("/api/notificacoes", notification_routes)
        .nest("/api/tags", tag_routes)
        .route(
            "/api/comentarios/{id}",
            axum::routing::delete(handlers::processes::delete_comment),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .route(
            "/api/documentos/arquivo",
            get(handlers::documents::download_document),
        )
        .merge(protected)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
