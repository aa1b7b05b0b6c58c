use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;

use crate::auth::CognitoIdentity;
use crate::config::AppConfig;
use crate::context::AppServices;
use crate::gateways::{DynamoReportStore, S3BlobStorage};
use crate::notify::Notifier;

/// AWS clients built once per process
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub dynamo_client: DynamoClient,
    pub s3_client: S3Client,
    pub cognito_client: CognitoClient,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        tracing::info!(
            "Connecting to table {} and bucket {} in {}, user pool {}",
            config.table_name,
            config.bucket_name,
            config.region,
            config.user_pool_id
        );

        Self {
            dynamo_client: DynamoClient::new(&sdk_config),
            s3_client: S3Client::new(&sdk_config),
            cognito_client: CognitoClient::new(&sdk_config),
            config,
        }
    }

    /// Gateway implementations over these clients
    pub fn services(&self, notifier: Notifier) -> AppServices {
        AppServices {
            store: Arc::new(DynamoReportStore::new(
                self.dynamo_client.clone(),
                self.config.table_name.clone(),
            )),
            storage: Arc::new(S3BlobStorage::new(
                self.s3_client.clone(),
                self.config.bucket_name.clone(),
            )),
            identity: Arc::new(CognitoIdentity::new(
                self.cognito_client.clone(),
                self.config.client_id.clone(),
                self.config.client_secret.clone(),
            )),
            notifier,
        }
    }
}
