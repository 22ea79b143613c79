//! Storage service implementation using Apache OpenDAL.

use std::path::Path;

use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Storage service for receipt images.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Generate a storage key for a receipt image.
    ///
    /// Format: `receipts/{uuid}{ext}`, extension taken from the original
    /// filename (sanitized) with `.jpg` as the fallback.
    #[must_use]
    pub fn generate_key(original_name: &str) -> String {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| ".jpg".to_string(), |e| format!(".{}", sanitize(e)));

        format!("receipts/{}{}", Uuid::new_v4(), ext)
    }

    /// Save a receipt image, returning its storage key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn save(&self, bytes: Vec<u8>, original_name: &str) -> Result<String, StorageError> {
        let key = Self::generate_key(original_name);
        self.operator
            .write(&key, bytes)
            .await
            .map_err(StorageError::from)?;
        Ok(key)
    }

    /// The URL under which a stored image is served.
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.config.public_base_url, key)
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize a filename fragment for use inside a storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize(fragment: &str) -> String {
    fragment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("jpg"), "jpg");
        assert_eq!(sanitize("j p(g)"), "j_p_g_");
        assert_eq!(sanitize("日本語"), "___");
    }

    #[test]
    fn test_generate_key_keeps_extension() {
        let key = StorageService::generate_key("receipt-scan.png");
        assert!(key.starts_with("receipts/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_generate_key_defaults_to_jpg() {
        let key = StorageService::generate_key("receipt");
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn test_generate_key_is_unique_per_call() {
        let a = StorageService::generate_key("a.png");
        let b = StorageService::generate_key("a.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_url_for() {
        let config = StorageConfig::new(StorageProvider::local_fs("./uploads"));
        let service = StorageService::from_config(config).expect("should create service");
        assert_eq!(
            service.url_for("receipts/abc.png"),
            "/uploads/receipts/abc.png"
        );
    }

    #[test]
    fn test_validate_upload_size() {
        let config =
            StorageConfig::new(StorageProvider::local_fs("./test")).with_max_file_size(1024);
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_upload("image/png", 512).is_ok());

        let err = service.validate_upload("image/png", 2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_upload_mime_type() {
        let config = StorageConfig::new(StorageProvider::local_fs("./test"));
        let service = StorageService::from_config(config).expect("should create service");

        assert!(service.validate_upload("image/jpeg", 1024).is_ok());
        assert!(service.validate_upload("image/webp", 1024).is_ok());

        let err = service
            .validate_upload("application/x-executable", 1024)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMimeType { .. }));
    }

    #[tokio::test]
    async fn test_save_and_exists_round_trip_on_local_fs() {
        let dir = std::env::temp_dir().join(format!("recibo-storage-{}", Uuid::new_v4()));
        let config = StorageConfig::new(StorageProvider::local_fs(&dir));
        let service = StorageService::from_config(config).expect("should create service");

        let key = service
            .save(b"fake image bytes".to_vec(), "scan.png")
            .await
            .expect("save");

        assert!(service.exists(&key).await);
        service.delete(&key).await.expect("delete");
        assert!(!service.exists(&key).await);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
