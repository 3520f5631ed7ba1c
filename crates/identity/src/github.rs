//! GitHub personal access token verification.

use crate::error::{IdentityError, IdentityResult};
use crate::traits::{IdentityProvider, Principal};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Subset of `GET /user` we rely on.
#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    id: u64,
}

/// Verifies tokens by calling `GET {api_url}/user`.
///
/// A 200 means the token is live; 401 and 403 mean it is not. Any other
/// status, a transport error or a timeout leaves the question open and is
/// reported as `Unavailable`.
#[derive(Debug, Clone)]
pub struct GithubIdentityProvider {
    http: reqwest::Client,
    user_url: Url,
}

impl GithubIdentityProvider {
    pub fn new(api_url: &str, timeout: Duration, user_agent: &str) -> IdentityResult<Self> {
        let user_url = Url::parse(&format!("{}/user", api_url.trim_end_matches('/')))
            .map_err(|e| IdentityError::Config(format!("invalid GitHub API URL {api_url:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| IdentityError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, user_url })
    }
}

#[async_trait]
impl IdentityProvider for GithubIdentityProvider {
    #[instrument(skip_all, fields(provider = "github"))]
    async fn verify(&self, token: &str) -> IdentityResult<Principal> {
        let response = self
            .http
            .get(self.user_url.clone())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IdentityError::Unavailable("GitHub API request timed out".to_string())
                } else {
                    IdentityError::Unavailable(format!("GitHub API request failed: {e}"))
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                let user: GithubUser = response.json().await.map_err(|e| {
                    IdentityError::Unavailable(format!("unexpected GitHub API response: {e}"))
                })?;
                Ok(Principal {
                    subject: user.login,
                    user_id: Some(user.id),
                    provider: "github",
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::Invalid),
            status => Err(IdentityError::Unavailable(format!(
                "GitHub API returned {status}"
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_keeps_enterprise_path() {
        let provider = GithubIdentityProvider::new(
            "https://ghe.example.com/api/v3/",
            Duration::from_secs(5),
            "lfsgate-test",
        )
        .unwrap();
        assert_eq!(
            provider.user_url.as_str(),
            "https://ghe.example.com/api/v3/user"
        );
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let result = GithubIdentityProvider::new("not a url", Duration::from_secs(5), "ua");
        assert!(matches!(result, Err(IdentityError::Config(_))));
    }
}
