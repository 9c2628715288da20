//! YouTube publisher: uploads videos through the Data API v3.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use tracing::{error, info, warn};

use crosspost_core::contract::{PublishError, PublishReceipt, PublishRequest, Publisher};
use crosspost_core::media::MediaKind;

use super::file_name_of;

const UPLOAD_ENDPOINT: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const CHANNELS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/channels";
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
// The API caps video titles at 100 characters.
const MAX_TITLE_CHARS: usize = 100;

#[derive(Clone)]
pub struct YouTubeCredentials {
    pub access_token: String,
}

pub struct YouTubePublisher {
    client: reqwest::Client,
    credentials: YouTubeCredentials,
}

impl YouTubePublisher {
    pub fn new(credentials: YouTubeCredentials) -> Self {
        YouTubePublisher {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish<'a>(
        &self,
        request: PublishRequest<'a>,
    ) -> Result<PublishReceipt, PublishError> {
        if !self.validate_credentials() {
            return Err(PublishError::MissingCredentials(
                "youtube needs access_token".to_string(),
            ));
        }
        if request.kind != MediaKind::Video {
            return Err(PublishError::UnsupportedMedia(
                "youtube accepts video uploads only".to_string(),
            ));
        }

        let file_name = file_name_of(request.path);
        let bytes = tokio::fs::read(request.path).await?;
        let mime = mime_guess::from_path(request.path).first_or_octet_stream();
        info!(file = %file_name, "Uploading video to YouTube");

        let title: String = request.caption.chars().take(MAX_TITLE_CHARS).collect();
        let metadata = serde_json::json!({
            "snippet": {
                "title": title,
                "description": request.caption,
                "categoryId": "22",
            },
            "status": { "privacyStatus": "private" },
        });
        let meta_part = multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| PublishError::Api(format!("youtube metadata part invalid: {e}")))?;
        let media_part = multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(mime.as_ref())
            .map_err(|e| PublishError::Api(format!("youtube media part invalid: {e}")))?;
        let form = multipart::Form::new()
            .part("snippet", meta_part)
            .part("media", media_part);

        let resp = self
            .client
            .post(UPLOAD_ENDPOINT)
            .query(&[("uploadType", "multipart"), ("part", "snippet,status")])
            .bearer_auth(&self.credentials.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::Api(format!("youtube request failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PublishError::Api(format!("youtube response was not JSON: {e}")))?;
        if !status.is_success() {
            error!(status = %status, body = %body, file = %file_name, "YouTube API rejected the upload");
            return Err(PublishError::Api(format!(
                "youtube API returned {status}: {body}"
            )));
        }

        let video_id = body
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PublishError::Api(format!("youtube response carried no id: {body}")))?;
        info!(file = %file_name, video_id = video_id, "YouTube upload succeeded");
        Ok(PublishReceipt {
            post_id: video_id.to_string(),
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
            .get(CHANNELS_ENDPOINT)
            .query(&[("part", "id"), ("mine", "true")])
            .bearer_auth(&self.credentials.access_token)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                info!("YouTube access token accepted");
                true
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "YouTube rejected the access token");
                false
            }
            Err(e) => {
                warn!(error = ?e, "YouTube authentication probe failed");
                false
            }
        }
    }
}
