//! TikTok publisher: direct-post flow on the Content Posting API.
//!
//! Publishing is two requests: an init call that returns an upload URL, then
//! a PUT of the video bytes to that URL. The whole file goes up as a single
//! chunk; the pipeline's size policy keeps files well under the API's chunk
//! ceiling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use tracing::{error, info, warn};

use crosspost_core::contract::{PublishError, PublishReceipt, PublishRequest, Publisher};
use crosspost_core::media::MediaKind;

use super::file_name_of;

const INIT_ENDPOINT: &str = "https://open.tiktokapis.com/v2/post/publish/video/init/";
const CREATOR_INFO_ENDPOINT: &str = "https://open.tiktokapis.com/v2/post/publish/creator_info/query/";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TikTokCredentials {
    pub access_token: String,
}

pub struct TikTokPublisher {
    client: reqwest::Client,
    credentials: TikTokCredentials,
}

impl TikTokPublisher {
    pub fn new(credentials: TikTokCredentials) -> Self {
        TikTokPublisher {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Publisher for TikTokPublisher {
    async fn publish<'a>(
        &self,
        request: PublishRequest<'a>,
    ) -> Result<PublishReceipt, PublishError> {
        if !self.validate_credentials() {
            return Err(PublishError::MissingCredentials(
                "tiktok needs access_token".to_string(),
            ));
        }
        if request.kind != MediaKind::Video {
            return Err(PublishError::UnsupportedMedia(
                "tiktok accepts video uploads only".to_string(),
            ));
        }

        let file_name = file_name_of(request.path);
        let bytes = tokio::fs::read(request.path).await?;
        if bytes.is_empty() {
            return Err(PublishError::UnsupportedMedia(
                "tiktok cannot upload an empty file".to_string(),
            ));
        }
        let size = bytes.len() as u64;
        let mime = mime_guess::from_path(request.path).first_or_octet_stream();
        info!(file = %file_name, size_bytes = size, "Initialising TikTok video post");

        // Step 1: init the post and get an upload URL.
        let init_body = serde_json::json!({
            "post_info": {
                "title": request.caption,
                "privacy_level": "SELF_ONLY",
            },
            "source_info": {
                "source": "FILE_UPLOAD",
                "video_size": size,
                "chunk_size": size,
                "total_chunk_count": 1,
            },
        });
        let resp = self
            .client
            .post(INIT_ENDPOINT)
            .bearer_auth(&self.credentials.access_token)
            .json(&init_body)
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("tiktok request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PublishError::Api(format!("tiktok response was not JSON: {e}")))?;
        if !status.is_success() {
            error!(status = %status, body = %body, file = %file_name, "TikTok API rejected the init call");
            return Err(PublishError::Api(format!(
                "tiktok API returned {status}: {body}"
            )));
        }
        let publish_id = body
            .get("data")
            .and_then(|d| d.get("publish_id"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PublishError::Api(format!("tiktok init carried no publish_id: {body}"))
            })?
            .to_string();
        let upload_url = body
            .get("data")
            .and_then(|d| d.get("upload_url"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PublishError::Api(format!("tiktok init carried no upload_url: {body}"))
            })?
            .to_string();

        // Step 2: upload the bytes to the returned URL.
        info!(file = %file_name, publish_id = %publish_id, "Uploading video bytes to TikTok");
        let upload_resp = self
            .client
            .put(&upload_url)
            .header(CONTENT_TYPE, mime.as_ref())
            .header(CONTENT_RANGE, format!("bytes 0-{}/{}", size - 1, size))
            .body(bytes)
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("tiktok upload failed: {e}")))?;
        let upload_status = upload_resp.status();
        if !upload_status.is_success() {
            let text = upload_resp.text().await.unwrap_or_default();
            error!(status = %upload_status, body = %text, file = %file_name, "TikTok rejected the video bytes");
            return Err(PublishError::Api(format!(
                "tiktok upload returned {upload_status}: {text}"
            )));
        }

        info!(file = %file_name, publish_id = %publish_id, "TikTok upload succeeded");
        Ok(PublishReceipt {
            post_id: publish_id,
        })
    }

    fn validate_credentials(&self) -> bool {
        !self.credentials.access_token.is_empty()
    }

    async fn authenticate(&self) -> bool {
        if !self.validate_credentials() {
            return false;
        }
        match self
            .client
            .post(CREATOR_INFO_ENDPOINT)
            .bearer_auth(&self.credentials.access_token)
            .json(&serde_json::json!({}))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("TikTok access token accepted");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "TikTok rejected the access token");
                false
            }
            Err(e) => {
                warn!(error = ?e, "TikTok authentication probe failed");
                false
            }
        }
    }
}
