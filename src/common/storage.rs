use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::common::error::AppError;

/// Colaborador externo de storage de objetos. O core só conhece paths
/// internos; URLs públicas nunca são persistidas.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), AppError>;
    async fn read(&self, path: &str) -> Result<Vec<u8>, AppError>;
    async fn remove(&self, path: &str) -> Result<(), AppError>;
}

/// Implementação em disco local (diretório configurado via STORAGE_DIR).
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    // Paths vêm do banco, mas nunca confiamos neles para escapar do base_dir.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let traversal = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if traversal || path.is_empty() {
            return Err(AppError::StorageFailure(format!("path inválido: {}", path)));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl DocumentStorage for FsStorage {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), AppError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageFailure(e.to_string()))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| AppError::StorageFailure(e.to_string()))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full)
            .await
            .map_err(|e| AppError::StorageFailure(e.to_string()))
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| AppError::StorageFailure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_com_traversal_e_rejeitado() {
        let storage = FsStorage::new("/tmp/storage-teste");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
    }

    #[test]
    fn path_relativo_resolve_dentro_do_base_dir() {
        let storage = FsStorage::new("/tmp/storage-teste");
        let resolved = storage.resolve("processos/1/arquivo.pdf").unwrap();
        assert!(resolved.starts_with("/tmp/storage-teste"));
    }

    #[tokio::test]
    async fn store_read_remove_roundtrip() {
        let dir = std::env::temp_dir().join(format!("fs-storage-{}", uuid::Uuid::new_v4()));
        let storage = FsStorage::new(&dir);

        storage.store("processos/9/a.txt", b"conteudo").await.unwrap();
        let lido = storage.read("processos/9/a.txt").await.unwrap();
        assert_eq!(lido, b"conteudo");

        storage.remove("processos/9/a.txt").await.unwrap();
        assert!(storage.read("processos/9/a.txt").await.is_err());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
