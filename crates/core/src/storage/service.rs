//! Document store implementation using Apache OpenDAL.

use opendal::{ErrorKind, Operator, services};
use permitflow_shared::config::{StorageProvider, StorageSettings};
use tracing::debug;
use uuid::Uuid;

use super::error::StorageError;
use crate::verification::DocumentType;

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
}

/// Stores applicant uploads and generated PDFs.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    operator: Operator,
    provider: StorageProvider,
}

impl DocumentStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let operator = Self::create_operator(settings)?;
        Ok(Self {
            operator,
            provider: settings.provider,
        })
    }

    /// An in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be built.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_settings(&StorageSettings {
            provider: StorageProvider::Memory,
            ..StorageSettings::default()
        })
    }

    fn create_operator(settings: &StorageSettings) -> Result<Operator, StorageError> {
        let operator = match settings.provider {
            StorageProvider::S3 => {
                let bucket = settings
                    .bucket
                    .as_deref()
                    .ok_or_else(|| StorageError::configuration("S3 storage requires a bucket"))?;
                let mut builder = services::S3::default().bucket(bucket);
                if let Some(endpoint) = settings.endpoint.as_deref() {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(region) = settings.region.as_deref() {
                    builder = builder.region(region);
                }
                if let Some(key_id) = settings.access_key_id.as_deref() {
                    builder = builder.access_key_id(key_id);
                }
                if let Some(secret) = settings.secret_access_key.as_deref() {
                    builder = builder.secret_access_key(secret);
                }
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Local => {
                let builder = services::Fs::default().root(&settings.root);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };
        Ok(operator)
    }

    /// Key of a generated PDF, e.g. `applications/{id}/certificate.pdf`.
    ///
    /// Signing overwrites the same key so the next signer gets the latest version.
    #[must_use]
    pub fn generated_key(application_id: Uuid, kind: DocumentType) -> String {
        format!("applications/{application_id}/{}.pdf", kind.as_str())
    }

    /// Key of an applicant upload.
    ///
    /// Format: `applications/{application_id}/documents/{document_id}-{sanitized_filename}`
    #[must_use]
    pub fn upload_key(application_id: Uuid, document_id: Uuid, filename: &str) -> String {
        format!(
            "applications/{application_id}/documents/{document_id}-{}",
            sanitize_filename(filename)
        )
    }

    /// Write an object, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or the write fails.
    pub async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        self.operator.write(key, bytes).await?;
        debug!(key, size, provider = ?self.provider, "Stored object");
        Ok(StoredObject {
            key: key.to_string(),
            size,
        })
    }

    /// Read an object.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing is stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        match self.operator.read(key).await {
            Ok(buffer) => Ok(buffer.to_vec()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Delete an object. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Configured backend.
    #[must_use]
    pub const fn provider(&self) -> StorageProvider {
        self.provider
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.ends_with('/') || key.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Only ASCII alphanumerics, dots, hyphens and underscores survive.
fn sanitize_filename(filename: &str) -> String {
    filename
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
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("degree.pdf"), "degree.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("../../etc"), ".._.._etc");
    }

    #[test]
    fn test_keys() {
        let app = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("valid uuid");
        let doc = Uuid::parse_str("6ba7b811-9dad-11d1-80b4-00c04fd430c8").expect("valid uuid");
        assert_eq!(
            DocumentStore::generated_key(app, DocumentType::Certificate),
            "applications/550e8400-e29b-41d4-a716-446655440000/certificate.pdf"
        );
        assert_eq!(
            DocumentStore::upload_key(app, doc, "Aadhaar card.pdf"),
            "applications/550e8400-e29b-41d4-a716-446655440000/documents/6ba7b811-9dad-11d1-80b4-00c04fd430c8-Aadhaar_card.pdf"
        );
    }

    #[test]
    fn test_invalid_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("applications/").is_err());
        assert!(validate_key("applications/../secret").is_err());
        assert!(validate_key("applications/x/certificate.pdf").is_ok());
    }

    #[tokio::test]
    async fn test_memory_round_trip_and_overwrite() {
        let store = DocumentStore::in_memory().expect("memory store");
        let key = "applications/a/recommendation_form.pdf";

        assert!(!store.exists(key).await);
        store.write(key, b"v1".to_vec()).await.expect("write");
        store.write(key, b"v2".to_vec()).await.expect("overwrite");
        assert_eq!(store.read(key).await.expect("read"), b"v2");
        assert!(store.exists(key).await);

        store.delete(key).await.expect("delete");
        assert!(matches!(
            store.read(key).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_s3_requires_bucket() {
        let settings = StorageSettings {
            provider: StorageProvider::S3,
            ..StorageSettings::default()
        };
        assert!(matches!(
            DocumentStore::from_settings(&settings),
            Err(StorageError::Configuration(_))
        ));
    }
}
