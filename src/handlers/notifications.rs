// src/handlers/notifications.rs

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::notification::Notification,
};

#[utoipa::path(
    get,
    path = "/api/notificacoes",
    tag = "Notificações",
    responses((status = 200, description = "Notificações do usuário", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = app_state.notification_service.list_for_user(user.id).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/api/notificacoes/{id}/marcar-lida",
    tag = "Notificações",
    params(("id" = i32, Path, description = "ID da notificação")),
    responses(
        (status = 200, description = "Notificação marcada como lida"),
        (status = 404, description = "Notificação de outro usuário ou inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.notification_service.mark_read(id, user.id).await?;
    Ok(Json(serde_json::json!({ "message": "Notificação marcada como lida." })))
}
