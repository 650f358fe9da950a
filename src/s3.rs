use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client as S3Client,
};

use crate::config::AppConfig;

/// Client for the S3-compatible endpoint of the hosted object storage.
///
/// Hosted storage only speaks path-style addressing, and the bucket names
/// (`photos`, `photos_table`, ...) are chosen per call rather than here.
pub async fn build_client(config: &AppConfig) -> S3Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .endpoint_url(&config.aws_endpoint_url);

    match (&config.aws_access_key_id, &config.aws_secret_access_key) {
        (Some(access_key), Some(secret_key)) => {
            loader = loader.credentials_provider(Credentials::new(
                access_key.as_str(),
                secret_key.as_str(),
                None,
                None,
                "dashboard-static",
            ));
        }
        _ => tracing::warn!(
            endpoint = %config.aws_endpoint_url,
            "no static storage credentials configured; falling back to the default provider chain"
        ),
    }

    let shared = loader.load().await;
    let s3_config = S3ConfigBuilder::from(&shared)
        .force_path_style(true)
        .build();

    S3Client::from_conf(s3_config)
}
