//! Client for the hosted blog-generation function.

use std::time::Duration;

use async_trait::async_trait;
use calc_core::backend::{BackendError, ContentGenerator};
use calc_core::content::{BlogPost, BlogPostRequest};
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

const USER_AGENT: &str = concat!("calcsite/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(60);

pub struct HttpContentGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpContentGenerator {
    pub fn new(
        url: &str,
        api_key: Option<String>,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| BackendError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// `None` for success statuses.
pub fn status_error(status: StatusCode) -> Option<BackendError> {
    match status {
        s if s.is_success() => None,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Some(BackendError::Unauthorized),
        StatusCode::NOT_FOUND => Some(BackendError::NotFound),
        s => Some(BackendError::Unavailable(format!("content function returned {s}"))),
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate_post(&self, request: &BlogPostRequest) -> Result<BlogPost, BackendError> {
        debug!(url = %self.url, topic = %request.topic, "Requesting blog draft");

        let mut call = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            error!(error = %e, "Content function unreachable");
            BackendError::Unavailable(format!("Network error: {e}"))
        })?;

        if let Some(err) = status_error(response.status()) {
            error!(status = %response.status(), "Content function rejected request");
            return Err(err);
        }

        let post: BlogPost = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Failed to parse response: {e}")))?;
        Ok(post.normalize())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn success_statuses_are_not_errors() {
        assert_eq!(status_error(StatusCode::OK), None);
        assert_eq!(status_error(StatusCode::CREATED), None);
    }

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        assert_eq!(status_error(StatusCode::UNAUTHORIZED), Some(BackendError::Unauthorized));
        assert_eq!(status_error(StatusCode::FORBIDDEN), Some(BackendError::Unauthorized));
    }

    #[test]
    fn server_errors_are_unavailable() {
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY),
            Some(BackendError::Unavailable(msg)) if msg.contains("502")
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        let generator = HttpContentGenerator::new("http://127.0.0.1:9/generate", None).unwrap();
        let request = BlogPostRequest::new("APR", "finance", &[]).unwrap();

        let err = generator.generate_post(&request).await.unwrap_err();

        assert!(matches!(err, BackendError::Unavailable(_)));
    }
}
