//! Media storage client backed by an S3-compatible bucket
//!
//! The transport layer stages uploads as local files; this client pushes a
//! staged file into the bucket and returns the durable public URL that gets
//! persisted on the user record. Superseded assets are not deleted.

use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Media storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket receiving image assets
    pub bucket: String,
    /// Public URL prefix under which uploaded objects are served
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_BUCKET_NAME`: bucket receiving image assets (default: "media-bucket")
    /// - `MEDIA_PUBLIC_BASE_URL`: public URL prefix for uploaded objects
    ///
    /// AWS credentials and region resolve through the SDK's default
    /// provider chain.
    pub fn from_env() -> Result<Self> {
        let bucket =
            std::env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "media-bucket".to_string());

        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket));

        Ok(StorageConfig {
            bucket,
            public_base_url,
        })
    }
}

/// Client for uploading staged image files
#[derive(Clone)]
pub struct MediaStorage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl MediaStorage {
    /// Initialize the S3 client from the ambient AWS configuration
    pub async fn new(config: StorageConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = Client::new(&sdk_config);

        info!("Media storage initialized for bucket: {}", config.bucket);

        MediaStorage {
            client,
            bucket: config.bucket,
            public_base_url: config.public_base_url,
        }
    }

    /// Upload a staged local file and return its public URL.
    ///
    /// The object key is randomized; the original extension is kept so the
    /// served content type stays meaningful.
    pub async fn upload_image(&self, local_path: &Path) -> Result<String> {
        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let key = format!("images/{}.{}", Uuid::new_v4(), extension);

        let file_content = tokio::fs::read(local_path).await?;
        let byte_stream = ByteStream::from(file_content);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(byte_stream)
            .content_type(content_type_for(extension))
            .send()
            .await?;

        info!(
            "Uploaded {} to s3://{}/{}",
            local_path.display(),
            self.bucket,
            key
        );

        Ok(object_url(&self.public_base_url, &key))
    }
}

/// Public URL for an uploaded object
fn object_url(public_base_url: &str, key: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), key)
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_object_url_joins_cleanly() {
        assert_eq!(
            object_url("https://media.example.com/", "images/a.png"),
            "https://media.example.com/images/a.png"
        );
        assert_eq!(
            object_url("https://media.example.com", "images/a.png"),
            "https://media.example.com/images/a.png"
        );
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("png"), "image/png");
        assert_eq!(content_type_for("webp"), "image/webp");
        assert_eq!(content_type_for("jpg"), "image/jpeg");
        assert_eq!(content_type_for("bin"), "image/jpeg");
    }

    #[test]
    #[serial]
    fn test_storage_config_from_env() {
        unsafe {
            std::env::set_var("MEDIA_BUCKET_NAME", "avatars");
            std::env::remove_var("MEDIA_PUBLIC_BASE_URL");
        }

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.bucket, "avatars");
        assert_eq!(config.public_base_url, "https://avatars.s3.amazonaws.com");

        unsafe {
            std::env::set_var("MEDIA_PUBLIC_BASE_URL", "https://cdn.example.com");
        }
        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.public_base_url, "https://cdn.example.com");

        unsafe {
            std::env::remove_var("MEDIA_BUCKET_NAME");
            std::env::remove_var("MEDIA_PUBLIC_BASE_URL");
        }
    }
}
