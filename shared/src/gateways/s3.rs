use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

use super::BlobStorage;
use crate::error::GatewayError;
use fieldnote_atoms::media;

pub struct S3BlobStorage {
    client: S3Client,
    bucket_name: String,
}

impl S3BlobStorage {
    pub fn new(client: S3Client, bucket_name: impl Into<String>) -> Self {
        Self {
            client,
            bucket_name: bucket_name.into(),
        }
    }
}

#[async_trait]
impl BlobStorage for S3BlobStorage {
    async fn upload(&self, jpeg: Vec<u8>, user_id: &str, report_id: &str) -> Result<String, GatewayError> {
        media::upload_image(&self.client, &self.bucket_name, user_id, report_id, jpeg)
            .await
            .map_err(GatewayError::Storage)
    }

    async fn resolve(&self, path: &str) -> Result<String, GatewayError> {
        media::presign_image(&self.client, &self.bucket_name, path)
            .await
            .map_err(GatewayError::Storage)
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        media::fetch_image(&self.client, &self.bucket_name, path)
            .await
            .map_err(GatewayError::Storage)
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        media::delete_image(&self.client, &self.bucket_name, path)
            .await
            .map_err(GatewayError::Storage)
    }
}
