use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoClient;

use super::DocumentStore;
use crate::error::GatewayError;
use fieldnote_atoms::reports::{self, Report};

pub struct DynamoReportStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoReportStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for DynamoReportStore {
    async fn list(&self) -> Result<Vec<Report>, GatewayError> {
        reports::load_reports(&self.client, &self.table_name)
            .await
            .map_err(GatewayError::Store)
    }

    async fn put(&self, report: &Report) -> Result<(), GatewayError> {
        reports::put_report(&self.client, &self.table_name, report)
            .await
            .map_err(GatewayError::Store)
    }

    async fn delete(&self, report_id: &str) -> Result<(), GatewayError> {
        reports::delete_report(&self.client, &self.table_name, report_id)
            .await
            .map_err(GatewayError::Store)
    }
}
