//! Presigned URL issuance for validated batches.

use crate::metrics;
use futures::StreamExt;
use lfsgate_core::config::LfsConfig;
use lfsgate_core::{Action, ObjectResult, Oid, Operation, RepositoryRef, ValidatedObject};
use lfsgate_storage::{ObjectStore, PresignMethod, PresignedUrl};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Per-object error code when storage cannot issue a URL.
const STORAGE_UNAVAILABLE_CODE: u16 = 503;

/// What happened to one distinct OID.
#[derive(Debug, Clone)]
enum Outcome {
    Issued(PresignedUrl),
    AlreadyPresent,
    Failed(String),
}

/// Turns validated objects into LFS actions backed by presigned URLs.
pub struct UrlIssuer {
    storage: Arc<dyn ObjectStore>,
    url_expiry: Duration,
    storage_timeout: Duration,
    concurrency: usize,
    check_existing_uploads: bool,
}

impl UrlIssuer {
    pub fn new(storage: Arc<dyn ObjectStore>, config: &LfsConfig) -> Self {
        Self {
            storage,
            url_expiry: config.url_expiry(),
            storage_timeout: config.storage_timeout(),
            concurrency: config.effective_concurrency(),
            check_existing_uploads: config.check_existing_uploads,
        }
    }

    /// Issue actions for every object in `objects`.
    ///
    /// The result has the same length and order as `objects`. Repeated OIDs
    /// are issued once and share the outcome. Storage calls for distinct
    /// OIDs run concurrently, at most `issue_concurrency` at a time, and a
    /// failure for one object never fails the others.
    ///
    /// Downloads never consult `exists`: the URL is issued by OID and a
    /// missing object surfaces as a 404 from storage when the client uses it.
    pub async fn issue(
        &self,
        operation: Operation,
        objects: &[ValidatedObject],
        repo: &RepositoryRef,
    ) -> Vec<ObjectResult> {
        let started = Instant::now();

        let mut distinct: Vec<&Oid> = Vec::new();
        let mut slot_of: HashMap<&Oid, usize> = HashMap::new();
        let slots: Vec<usize> = objects
            .iter()
            .map(|object| {
                *slot_of.entry(&object.oid).or_insert_with(|| {
                    distinct.push(&object.oid);
                    distinct.len() - 1
                })
            })
            .collect();

        let repeats = objects.len() - distinct.len();
        if repeats > 0 {
            tracing::debug!(repeats, "Collapsed repeated OIDs in batch");
            if operation == Operation::Upload {
                metrics::UPLOADS_DEDUPLICATED
                    .with_label_values(&["batch"])
                    .inc_by(repeats as u64);
            }
        }

        // Owned keys keep the stream free of borrows into `objects`
        let keys: Vec<String> = distinct.iter().map(|oid| repo.object_key(oid)).collect();

        let mut outcomes: Vec<Option<Outcome>> = vec![None; keys.len()];
        let mut completed = futures::stream::iter(keys.into_iter().enumerate())
            .map(|(slot, key)| async move { (slot, self.issue_one(operation, key).await) })
            .buffer_unordered(self.concurrency);
        while let Some((slot, outcome)) = completed.next().await {
            outcomes[slot] = Some(outcome);
        }

        metrics::ISSUANCE_DURATION
            .with_label_values(&[operation.as_str()])
            .observe(started.elapsed().as_secs_f64());

        objects
            .iter()
            .zip(slots)
            .map(|(object, slot)| match &outcomes[slot] {
                Some(Outcome::Issued(url)) => {
                    ObjectResult::with_action(object, operation, self.action(url))
                }
                Some(Outcome::AlreadyPresent) => ObjectResult::already_present(object),
                Some(Outcome::Failed(message)) => {
                    ObjectResult::error(object, STORAGE_UNAVAILABLE_CODE, message.clone())
                }
                None => ObjectResult::error(
                    object,
                    STORAGE_UNAVAILABLE_CODE,
                    "object was not processed",
                ),
            })
            .collect()
    }

    async fn issue_one(&self, operation: Operation, key: String) -> Outcome {
        let op = operation.as_str();

        if operation == Operation::Upload && self.check_existing_uploads {
            match tokio::time::timeout(self.storage_timeout, self.storage.exists(&key)).await {
                Ok(Ok(true)) => {
                    metrics::UPLOADS_DEDUPLICATED
                        .with_label_values(&["storage"])
                        .inc();
                    return Outcome::AlreadyPresent;
                }
                Ok(Ok(false)) => {}
                // Uploading again is always safe, so fall through to issuance
                Ok(Err(e)) => {
                    tracing::warn!(key = %key, error = %e, "Existence check failed");
                }
                Err(_) => {
                    tracing::warn!(key = %key, "Existence check timed out");
                }
            }
        }

        let method = match operation {
            Operation::Upload => PresignMethod::Put,
            Operation::Download => PresignMethod::Get,
        };

        match tokio::time::timeout(
            self.storage_timeout,
            self.storage.presign(method, &key, self.url_expiry),
        )
        .await
        {
            Ok(Ok(url)) => {
                metrics::OBJECTS_ISSUED.with_label_values(&[op]).inc();
                Outcome::Issued(url)
            }
            Ok(Err(e)) => {
                tracing::error!(key = %key, error = %e, "Failed to presign URL");
                metrics::ISSUANCE_FAILURES
                    .with_label_values(&[op, "error"])
                    .inc();
                Outcome::Failed("storage unavailable".to_string())
            }
            Err(_) => {
                tracing::error!(
                    key = %key,
                    timeout_secs = self.storage_timeout.as_secs(),
                    "Presign timed out"
                );
                metrics::ISSUANCE_FAILURES
                    .with_label_values(&[op, "timeout"])
                    .inc();
                Outcome::Failed("storage timed out".to_string())
            }
        }
    }

    fn action(&self, url: &PresignedUrl) -> Action {
        let expires_at = OffsetDateTime::now_utc() + url.expires_in;
        Action {
            href: url.url.clone(),
            header: url.headers.clone(),
            expires_in: Some(url.expires_in.as_secs()),
            expires_at: expires_at.format(&Rfc3339).ok(),
        }
    }
}

impl std::fmt::Debug for UrlIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlIssuer")
            .field("backend", &self.storage.backend_name())
            .field("url_expiry", &self.url_expiry)
            .field("storage_timeout", &self.storage_timeout)
            .field("concurrency", &self.concurrency)
            .field("check_existing_uploads", &self.check_existing_uploads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lfsgate_storage::StorageResult;
    use std::collections::BTreeMap;

    struct SigningStore;

    #[async_trait]
    impl ObjectStore for SigningStore {
        async fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }

        async fn presign(
            &self,
            method: PresignMethod,
            key: &str,
            expires_in: Duration,
        ) -> StorageResult<PresignedUrl> {
            Ok(PresignedUrl {
                url: format!("https://bucket.test/{key}?method={method}"),
                headers: BTreeMap::new(),
                expires_in,
            })
        }

        fn backend_name(&self) -> &'static str {
            "signing"
        }
    }

    fn object(c: char) -> ValidatedObject {
        ValidatedObject {
            oid: Oid::parse(c.to_string().repeat(64)).unwrap(),
            size: 1,
        }
    }

    #[tokio::test]
    async fn test_issue_runs_on_spawned_task() {
        let issuer = Arc::new(UrlIssuer::new(Arc::new(SigningStore), &LfsConfig::default()));

        let results = tokio::spawn({
            let issuer = issuer.clone();
            async move {
                let repo = RepositoryRef::resolve("acme", "widgets.git").unwrap();
                let objects = vec![object('a'), object('b'), object('a')];
                issuer.issue(Operation::Download, &objects, &repo).await
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 3);
        let hrefs: Vec<&str> = results
            .iter()
            .map(|r| r.actions.as_ref().unwrap().download.as_ref().unwrap().href.as_str())
            .collect();
        assert!(hrefs[0].starts_with("https://bucket.test/acme/widgets/aa/aa/"));
        assert!(hrefs[1].starts_with("https://bucket.test/acme/widgets/bb/bb/"));
        assert_eq!(hrefs[0], hrefs[2]);
    }
}
