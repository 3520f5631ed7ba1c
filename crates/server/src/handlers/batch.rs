//! Git LFS Batch API handler.

use crate::auth::extract_token;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use lfsgate_core::{BatchRequest, BatchResponse, LFS_MEDIA_TYPE, Operation, RepositoryRef};

/// Largest batch body read. A full batch of 100 objects is well under 16 KiB.
pub const MAX_BATCH_BODY_BYTES: usize = 1024 * 1024;

/// POST /{org}/{repo}/info/lfs/objects/batch
///
/// Checks run in a fixed order and the first failure is the response:
/// credentials (401/403), repository name (400), then the request body
/// (422/409/413). The body is read only once the caller is authorized, so a
/// missing credential is reported as 401 whatever the body holds.
pub async fn batch(
    State(state): State<AppState>,
    Path((org, repo)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let mut operation = None;
    let deadline = state.config.server.request_timeout();

    let result = match tokio::time::timeout(
        deadline,
        process_batch(&state, &org, &repo, &headers, body, &mut operation),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                org = %org,
                repo = %repo,
                timeout_secs = deadline.as_secs(),
                "Batch request exceeded deadline"
            );
            Err(ApiError::UpstreamTimeout(format!(
                "batch not completed within {}s",
                deadline.as_secs()
            )))
        }
    };

    let label = operation.map(|op: Operation| op.as_str()).unwrap_or("unknown");
    match result {
        Ok(response) => {
            metrics::record_batch(label, StatusCode::OK);
            (
                StatusCode::OK,
                [(CONTENT_TYPE, LFS_MEDIA_TYPE)],
                Json(response),
            )
                .into_response()
        }
        Err(err) => {
            metrics::record_batch(label, err.status_code());
            err.into_response()
        }
    }
}

async fn process_batch(
    state: &AppState,
    org: &str,
    repo: &str,
    headers: &HeaderMap,
    body: Body,
    operation: &mut Option<Operation>,
) -> ApiResult<BatchResponse> {
    let token = extract_token(headers);
    let authorized = state.authorizer.authorize(token.as_deref(), org).await?;
    let subject = authorized.principal.subject.as_str();

    let repository = RepositoryRef::resolve(org, repo).inspect_err(|e| {
        tracing::info!(subject, org, repo, error = %e, "Rejected repository name");
    })?;

    let body = axum::body::to_bytes(body, MAX_BATCH_BODY_BYTES)
        .await
        .map_err(|e| {
            tracing::info!(subject, repository = %repository, error = %e, "Unreadable batch body");
            ApiError::UnprocessableBatch(format!(
                "request body unreadable or larger than {MAX_BATCH_BODY_BYTES} bytes"
            ))
        })?;

    let request = BatchRequest::from_slice(&body)?;
    if let Some(transfers) = &request.transfers {
        tracing::debug!(?transfers, "Client transfer adapters");
    }
    if let Some(git_ref) = &request.git_ref {
        tracing::debug!(git_ref = %git_ref.name, "Batch for ref");
    }

    let batch = request.validate().inspect_err(|e| {
        tracing::info!(subject, repository = %repository, error = %e, "Rejected batch request");
    })?;
    *operation = Some(batch.operation);

    let objects = state
        .issuer
        .issue(batch.operation, &batch.objects, &repository)
        .await;

    let failed = objects.iter().filter(|o| o.error.is_some()).count();
    tracing::info!(
        subject,
        repository = %repository,
        operation = %batch.operation,
        objects = objects.len(),
        failed,
        "Batch served"
    );

    Ok(BatchResponse::basic(objects))
}
