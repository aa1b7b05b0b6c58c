//! Seams to the managed backend. The editor and exporters only ever talk to
//! these traits; AWS-backed implementations live alongside.

use async_trait::async_trait;

use crate::error::GatewayError;
use fieldnote_atoms::reports::Report;

pub mod dynamo;
pub mod s3;

pub use dynamo::DynamoReportStore;
pub use s3::S3BlobStorage;

/// Report records by id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All reports, creation time descending
    async fn list(&self) -> Result<Vec<Report>, GatewayError>;
    async fn put(&self, report: &Report) -> Result<(), GatewayError>;
    /// Removes the record only; stored images are left alone
    async fn delete(&self, report_id: &str) -> Result<(), GatewayError>;
}

/// Binary blobs by path (`images/{user_id}/{report_id}/{name}`)
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(&self, jpeg: Vec<u8>, user_id: &str, report_id: &str) -> Result<String, GatewayError>;
    /// Temporary retrieval URL
    async fn resolve(&self, path: &str) -> Result<String, GatewayError>;
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, GatewayError>;
    async fn delete(&self, path: &str) -> Result<(), GatewayError>;
}
