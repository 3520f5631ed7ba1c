use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use lfsgate_storage::backends::s3::S3Backend;
use lfsgate_storage::traits::{ObjectStore, PresignMethod};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::{ContainerAsync, GenericImage, ImageExt, runners::AsyncRunner};

const MINIO_IMAGE: &str = "minio/minio";
const MINIO_TAG: &str = "RELEASE.2024-02-12T21-36-45Z";

fn should_skip_s3_tests() -> bool {
    std::env::var("SKIP_S3_TESTS").is_ok()
}

struct MinioContext {
    _container: ContainerAsync<GenericImage>,
    endpoint: String,
    access_key: String,
    secret_key: String,
}

impl MinioContext {
    async fn new() -> Result<Self, String> {
        let access_key = "minio-access-key".to_string();
        let secret_key = "minio-secret-key".to_string();

        let container: ContainerAsync<GenericImage> = GenericImage::new(MINIO_IMAGE, MINIO_TAG)
            .with_exposed_port(9000.tcp())
            .with_wait_for(WaitFor::message_on_stdout("API:"))
            .with_env_var("MINIO_ROOT_USER", access_key.clone())
            .with_env_var("MINIO_ROOT_PASSWORD", secret_key.clone())
            .with_cmd(vec!["server", "/data"])
            .start()
            .await
            .map_err(|e| format!("failed to start MinIO container: {e}"))?;

        let host = container
            .get_host()
            .await
            .map_err(|e| format!("failed to get host: {e}"))?;
        let port = container
            .get_host_port_ipv4(9000.tcp())
            .await
            .map_err(|e| format!("failed to get port: {e}"))?;

        Ok(Self {
            _container: container,
            endpoint: format!("http://{host}:{port}"),
            access_key,
            secret_key,
        })
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), String> {
        let credentials = Credentials::new(
            self.access_key.clone(),
            self.secret_key.clone(),
            None,
            None,
            "test",
        );
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_config::Region::new("us-east-1"))
            .credentials_provider(credentials)
            .http_client(aws_smithy_http_client::Builder::new().build_http())
            .endpoint_url(self.endpoint.clone())
            .force_path_style(true)
            .build();

        Client::from_conf(config)
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| format!("failed to create bucket: {e}"))?;
        Ok(())
    }

    async fn backend(&self, bucket: &str, prefix: Option<String>) -> Result<S3Backend, String> {
        S3Backend::new(
            bucket,
            Some(self.endpoint.clone()),
            Some("us-east-1".to_string()),
            prefix,
            Some(self.access_key.clone()),
            Some(self.secret_key.clone()),
            true,
        )
        .await
        .map_err(|e| format!("failed to create S3 backend: {e}"))
    }
}

async fn start_minio() -> Option<MinioContext> {
    if should_skip_s3_tests() {
        return None;
    }
    match MinioContext::new().await {
        Ok(context) => Some(context),
        Err(err) => {
            eprintln!("Skipping S3 test: {err}");
            None
        }
    }
}

#[tokio::test]
async fn test_presigned_put_then_get_round_trip() {
    let Some(context) = start_minio().await else {
        return;
    };
    context.create_bucket("lfs-test").await.unwrap();
    let backend = context
        .backend("lfs-test", Some("objects".to_string()))
        .await
        .unwrap();
    backend.health_check().await.unwrap();

    let key = "acme/widgets/df/fd/dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";
    assert!(!backend.exists(key).await.unwrap());

    let http = reqwest::Client::new();
    let upload = backend
        .presign(PresignMethod::Put, key, Duration::from_secs(300))
        .await
        .unwrap();
    let mut request = http.put(&upload.url).body("Hello, World!");
    for (name, value) in &upload.headers {
        request = request.header(name, value);
    }
    let response = request.send().await.unwrap();
    assert!(response.status().is_success(), "PUT failed: {}", response.status());

    assert!(backend.exists(key).await.unwrap());

    let download = backend
        .presign(PresignMethod::Get, key, Duration::from_secs(300))
        .await
        .unwrap();
    let body = http
        .get(&download.url)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "Hello, World!");
}

#[tokio::test]
async fn test_presigned_get_for_missing_object_is_issued_anyway() {
    let Some(context) = start_minio().await else {
        return;
    };
    context.create_bucket("lfs-missing").await.unwrap();
    let backend = context.backend("lfs-missing", None).await.unwrap();

    let download = backend
        .presign(PresignMethod::Get, "nobody/uploaded/this", Duration::from_secs(60))
        .await
        .unwrap();
    let status = reqwest::get(&download.url).await.unwrap().status();
    assert_eq!(status.as_u16(), 404);
}

#[tokio::test]
async fn test_health_check_fails_for_missing_bucket() {
    let Some(context) = start_minio().await else {
        return;
    };
    let backend = context.backend("does-not-exist", None).await.unwrap();
    assert!(backend.health_check().await.is_err());
}
