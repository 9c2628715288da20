//! Instagram publisher: two-step container + publish flow on the Graph API.
//!
//! The Graph API does not take file uploads for Instagram; it fetches media
//! from a public URL. The configured `media_base_url` must serve the input
//! directory's files by name (for example a bucket or static host the
//! operator syncs separately).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crosspost_core::contract::{PublishError, PublishReceipt, PublishRequest, Publisher};
use crosspost_core::media::MediaKind;

use super::file_name_of;

const GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct InstagramCredentials {
    pub user_id: String,
    pub access_token: String,
    pub media_base_url: String,
}

pub struct InstagramPublisher {
    client: reqwest::Client,
    credentials: InstagramCredentials,
}

impl InstagramPublisher {
    pub fn new(credentials: InstagramCredentials) -> Self {
        InstagramPublisher {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn media_url(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.credentials.media_base_url.trim_end_matches('/'),
            file_name
        )
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    async fn publish<'a>(
        &self,
        request: PublishRequest<'a>,
    ) -> Result<PublishReceipt, PublishError> {
        if !self.validate_credentials() {
            return Err(PublishError::MissingCredentials(
                "instagram needs user_id, access_token and media_base_url".to_string(),
            ));
        }

        let file_name = file_name_of(request.path);
        let media_url = self.media_url(&file_name);
        let mut params: Vec<(&str, String)> = vec![
            ("access_token", self.credentials.access_token.clone()),
            ("caption", request.caption.to_string()),
        ];
        match request.kind {
            MediaKind::Image => params.push(("image_url", media_url)),
            MediaKind::Video => {
                params.push(("video_url", media_url));
                params.push(("media_type", "REELS".to_string()));
            }
            MediaKind::Other => {
                return Err(PublishError::UnsupportedMedia(
                    "instagram accepts image and video uploads only".to_string(),
                ))
            }
        }

        // Step 1: create the media container.
        info!(file = %file_name, user_id = %self.credentials.user_id, "Creating Instagram media container");
        let container_endpoint = format!("{GRAPH_BASE}/{}/media", self.credentials.user_id);
        let resp = self
            .client
            .post(&container_endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("instagram request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PublishError::Api(format!("instagram response was not JSON: {e}")))?;
        if !status.is_success() {
            error!(status = %status, body = %body, file = %file_name, "Instagram API rejected the container");
            return Err(PublishError::Api(format!(
                "instagram API returned {status}: {body}"
            )));
        }
        let creation_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PublishError::Api(format!("instagram container carried no id: {body}"))
            })?
            .to_string();
        info!(file = %file_name, creation_id = %creation_id, "Instagram media container created");

        // Step 2: publish the container.
        let publish_endpoint = format!("{GRAPH_BASE}/{}/media_publish", self.credentials.user_id);
        let resp = self
            .client
            .post(&publish_endpoint)
            .query(&[
                ("access_token", self.credentials.access_token.as_str()),
                ("creation_id", creation_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("instagram publish failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PublishError::Api(format!("instagram response was not JSON: {e}")))?;
        if !status.is_success() {
            error!(status = %status, body = %body, file = %file_name, "Instagram API rejected the publish");
            return Err(PublishError::Api(format!(
                "instagram API returned {status}: {body}"
            )));
        }

        let post_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PublishError::Api(format!("instagram publish carried no id: {body}")))?;
        info!(file = %file_name, post_id = post_id, "Instagram publish succeeded");
        Ok(PublishReceipt {
            post_id: post_id.to_string(),
        })
    }

    fn validate_credentials(&self) -> bool {
        !self.credentials.user_id.is_empty()
            && !self.credentials.access_token.is_empty()
            && !self.credentials.media_base_url.is_empty()
    }

    async fn authenticate(&self) -> bool {
        if !self.validate_credentials() {
            return false;
        }
        let url = format!("{GRAPH_BASE}/{}", self.credentials.user_id);
        match self
            .client
            .get(&url)
            .query(&[
                ("fields", "id"),
                ("access_token", self.credentials.access_token.as_str()),
            ])
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("Instagram access token accepted");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Instagram rejected the access token");
                false
            }
            Err(e) => {
                warn!(error = ?e, "Instagram authentication probe failed");
                false
            }
        }
    }
}
