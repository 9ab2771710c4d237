//! Queue Signal Waiter Service Layer
//!
//! Holds the SQS client and the resolved region, and exposes the high-level
//! operations (wait, signal) used by the CLI or an embedding orchestrator.

use crate::aws::AwsSqsClient;
use crate::config::FALLBACK_REGION;
use crate::error::QueueSignalWaiterResult;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::config::Region;
use aws_sdk_sqs::Client as SqsClient;
use log::debug;

/// How to reach the queue service.
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Takes precedence over the ambient AWS region configuration.
    pub region: Option<String>,
    /// Override for local SQS emulators.
    pub endpoint_url: Option<String>,
}

pub struct QueueSignalWaiterService {
    pub(crate) sqs_client: AwsSqsClient,
    pub(crate) region: String,
}

impl QueueSignalWaiterService {
    /// Load the AWS SDK configuration using the standard credential provider
    /// chain. The region is taken from `options`, then the ambient
    /// configuration, then [`FALLBACK_REGION`].
    pub async fn new(options: ServiceOptions) -> QueueSignalWaiterResult<Self> {
        let region_provider = RegionProviderChain::first_try(options.region.map(Region::new))
            .or_default_provider()
            .or_else(Region::from_static(FALLBACK_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(endpoint_url) = &options.endpoint_url {
            debug!("Using SQS endpoint override {}", endpoint_url);
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;

        let region = config
            .region()
            .map_or_else(|| FALLBACK_REGION.to_string(), |r| r.to_string());
        debug!("Resolved AWS region {}", region);

        Ok(Self {
            sqs_client: AwsSqsClient::new(SqsClient::new(&config)),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    // wait() is implemented in wait.rs
    // signal() is implemented in signal.rs
}
