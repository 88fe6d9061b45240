// src/services/auth.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

/// Cache de usuários autenticados com TTL, injetado no serviço de auth.
#[derive(Clone)]
pub struct UserCache {
    inner: Arc<Mutex<HashMap<i32, (User, Instant)>>>,
    ttl: Duration,
}

impl UserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn get(&self, user_id: i32) -> Option<User> {
        let mut guard = self.inner.lock().ok()?;
        match guard.get(&user_id) {
            Some((user, stored_at)) if stored_at.elapsed() < self.ttl => Some(user.clone()),
            Some(_) => {
                guard.remove(&user_id);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, user: User) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.insert(user.id, (user, Instant::now()));
        }
    }

    /// Mutações de usuário (edição, desativação) invalidam a entrada para o
    /// token seguinte reler do banco.
    pub fn invalidate(&self, user_id: i32) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.remove(&user_id);
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    cache: UserCache,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, cache: UserCache) -> Self {
        Self {
            user_repo,
            jwt_secret,
            cache,
        }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Conta desativada não loga, mas não revelamos qual foi o motivo.
        if !user.active {
            return Err(AppError::InvalidCredentials);
        }

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação bcrypt em thread separada
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user_id = token_data.claims.sub;

        if let Some(user) = self.cache.get(user_id) {
            return Ok(user);
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.active {
            return Err(AppError::InvalidToken);
        }

        self.cache.put(user.clone());
        Ok(user)
    }

    pub fn invalidate_cached(&self, user_id: i32) {
        self.cache.invalidate(user_id);
    }

    pub fn create_token(&self, user_id: i32) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn fake_user(id: i32) -> User {
        User {
            id,
            name: "Teste".to_string(),
            email: format!("teste{}@example.com", id),
            password_hash: "hash".to_string(),
            role: Role::User,
            department_id: Some(1),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn cache_devolve_dentro_do_ttl() {
        let cache = UserCache::new(Duration::from_secs(60));
        cache.put(fake_user(1));
        assert!(cache.get(1).is_some());
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn cache_expira_depois_do_ttl() {
        let cache = UserCache::new(Duration::ZERO);
        cache.put(fake_user(1));
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn invalidate_remove_a_entrada() {
        let cache = UserCache::new(Duration::from_secs(60));
        cache.put(fake_user(1));
        cache.invalidate(1);
        assert!(cache.get(1).is_none());
    }
}
