//! Facebook publisher: posts photos and videos to a page via the Graph API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{error, info, warn};

use crosspost_core::contract::{PublishError, PublishReceipt, PublishRequest, Publisher};
use crosspost_core::media::MediaKind;

use super::file_name_of;

const GRAPH_BASE: &str = "https://graph.facebook.com/v19.0";
// Video uploads go through the dedicated video host.
const GRAPH_VIDEO_BASE: &str = "https://graph-video.facebook.com/v19.0";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct FacebookCredentials {
    pub page_id: String,
    pub access_token: String,
}

pub struct FacebookPublisher {
    client: reqwest::Client,
    credentials: FacebookCredentials,
}

impl FacebookPublisher {
    pub fn new(credentials: FacebookCredentials) -> Self {
        FacebookPublisher {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    async fn publish<'a>(
        &self,
        request: PublishRequest<'a>,
    ) -> Result<PublishReceipt, PublishError> {
        if !self.validate_credentials() {
            return Err(PublishError::MissingCredentials(
                "facebook needs page_id and access_token".to_string(),
            ));
        }

        // Photos take a `caption`, videos a `description`.
        let (endpoint, caption_field) = match request.kind {
            MediaKind::Image => (
                format!("{GRAPH_BASE}/{}/photos", self.credentials.page_id),
                "caption",
            ),
            MediaKind::Video => (
                format!("{GRAPH_VIDEO_BASE}/{}/videos", self.credentials.page_id),
                "description",
            ),
            MediaKind::Other => {
                return Err(PublishError::UnsupportedMedia(
                    "facebook accepts image and video uploads only".to_string(),
                ))
            }
        };

        let file_name = file_name_of(request.path);
        let bytes = tokio::fs::read(request.path).await?;
        let mime = mime_guess::from_path(request.path).first_or_octet_stream();
        info!(
            file = %file_name,
            kind = ?request.kind,
            page_id = %self.credentials.page_id,
            "Uploading media to Facebook page"
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime.as_ref())
            .map_err(|e| PublishError::Api(format!("facebook upload part invalid: {e}")))?;
        let form = multipart::Form::new()
            .text(caption_field, request.caption.to_string())
            .part("source", part);

        let resp = self
            .client
            .post(&endpoint)
            .query(&[("access_token", self.credentials.access_token.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("facebook request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PublishError::Api(format!("facebook response was not JSON: {e}")))?;
        if !status.is_success() {
            error!(status = %status, body = %body, file = %file_name, "Facebook API rejected the upload");
            return Err(PublishError::Api(format!(
                "facebook API returned {status}: {body}"
            )));
        }

        // Photo responses carry a post_id next to the photo id; videos only an id.
        let post_id = body
            .get("post_id")
            .and_then(|v| v.as_str())
            .or_else(|| body.get("id").and_then(|v| v.as_str()))
            .ok_or_else(|| {
                PublishError::Api(format!("facebook response carried no id: {body}"))
            })?;
        info!(file = %file_name, post_id = post_id, "Facebook upload succeeded");
        Ok(PublishReceipt {
            post_id: post_id.to_string(),
        })
    }

    fn validate_credentials(&self) -> bool {
        !self.credentials.page_id.is_empty() && !self.credentials.access_token.is_empty()
    }

    async fn authenticate(&self) -> bool {
        if !self.validate_credentials() {
            return false;
        }
        let url = format!("{GRAPH_BASE}/me");
        match self
            .client
            .get(&url)
            .query(&[("access_token", self.credentials.access_token.as_str())])
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("Facebook access token accepted");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "Facebook rejected the access token");
                false
            }
            Err(e) => {
                warn!(error = ?e, "Facebook authentication probe failed");
                false
            }
        }
    }
}
