use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    clients::{
        ai::{Assistant, DisabledCompletion, OpenAiClient, TextCompletion},
        payments::{DisabledPayments, PaymentGateway, StripeGateway},
        storage::{LocalStorage, ObjectStorage, S3Storage},
    },
    config::{AppConfig, StorageBackend},
    jobs::{ImageWorker, JobQueue, RetryPolicy},
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub assistant: Assistant,
    pub payments: Arc<dyn PaymentGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub jobs: JobQueue,
}

impl AppState {
    /// Wires the production collaborators described by `config` and starts the job worker.
    pub async fn build(config: AppConfig, orm: DatabaseConnection) -> anyhow::Result<Self> {
        let completion: Arc<dyn TextCompletion> = match &config.openai_api_key {
            Some(key) => Arc::new(OpenAiClient::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            )),
            None => {
                tracing::warn!("OPENAI_API_KEY not set, recommendations and chatbot are disabled");
                Arc::new(DisabledCompletion)
            }
        };

        let payments: Arc<dyn PaymentGateway> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key.clone())),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set, business registration is disabled");
                Arc::new(DisabledPayments)
            }
        };

        let storage: Arc<dyn ObjectStorage> = match config.storage_backend {
            StorageBackend::S3 => {
                let bucket = config
                    .s3_bucket
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("S3_BUCKET is not set"))?;
                Arc::new(S3Storage::from_env(bucket, config.s3_public_url.clone()).await)
            }
            StorageBackend::Local => Arc::new(LocalStorage::new(config.local_storage_dir.clone())),
        };

        tokio::fs::create_dir_all(&config.upload_tmp_dir).await?;

        Ok(Self::with_collaborators(
            config,
            orm,
            completion,
            payments,
            storage,
            RetryPolicy::default(),
        ))
    }

    pub fn with_collaborators(
        config: AppConfig,
        orm: DatabaseConnection,
        completion: Arc<dyn TextCompletion>,
        payments: Arc<dyn PaymentGateway>,
        storage: Arc<dyn ObjectStorage>,
        retry: RetryPolicy,
    ) -> Self {
        let worker = ImageWorker::new(orm.clone(), storage.clone(), retry);
        Self {
            orm,
            config: Arc::new(config),
            assistant: Assistant::new(completion),
            payments,
            storage,
            jobs: JobQueue::start(worker),
        }
    }
}
