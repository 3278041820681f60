use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use citysecrets_shared::{Address, Comment, PhotoUpload, SpotDocument, SpotId};

use crate::error::BackendError;

/// Multipart field name the upload endpoint expects for each photo.
const PHOTO_FIELD: &str = "photos";

/// Body of `POST /api/comments/:id/comment`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub commenter: Address,
    pub content: String,
    pub username: String,
}

/// Body of `POST /api/users/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    pub wallet_address: Address,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    urls: Vec<String>,
}

/// Thin wrapper over the content service's REST API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Reuse an existing `reqwest::Client` (connection pool, proxies, ...).
    pub fn with_client(http: Client, base_url: &str) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<Response, BackendError> {
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        Self::check(response).await
    }

    // ------------------------------------------------------------------
    // Spots
    // ------------------------------------------------------------------

    /// `GET /api/spots`
    pub async fn list_spots(&self) -> Result<Vec<SpotDocument>, BackendError> {
        self.get_json(self.endpoint(&["api", "spots"])?).await
    }

    /// `GET /api/spots/city/:city`
    pub async fn list_spots_by_city(&self, city: &str) -> Result<Vec<SpotDocument>, BackendError> {
        self.get_json(self.endpoint(&["api", "spots", "city", city])?)
            .await
    }

    /// `GET /api/spots/user/:address`
    pub async fn list_spots_by_user(&self, creator: Address) -> Result<Vec<SpotDocument>, BackendError> {
        let address = creator.to_checksum(None);
        self.get_json(self.endpoint(&["api", "spots", "user", &address])?)
            .await
    }

    /// `GET /api/spots/id/:id`
    pub async fn get_spot(&self, id: SpotId) -> Result<SpotDocument, BackendError> {
        let id = id.to_string();
        self.get_json(self.endpoint(&["api", "spots", "id", &id])?).await
    }

    /// `POST /api/spots/create`, returning the stored document.
    pub async fn create_spot(&self, document: &SpotDocument) -> Result<SpotDocument, BackendError> {
        let response = self
            .post_json(self.endpoint(&["api", "spots", "create"])?, document)
            .await?;
        Ok(response.json().await?)
    }

    /// `DELETE /api/spots/:id`
    pub async fn delete_spot(&self, id: SpotId) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "spots", &id.to_string()])?;
        debug!(%url, "DELETE");
        let response = self.http.delete(url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Photos
    // ------------------------------------------------------------------

    /// `POST /api/upload`: one multipart part per photo, hosted URLs back in
    /// the same order.
    pub async fn upload_photos(&self, photos: &[PhotoUpload]) -> Result<Vec<String>, BackendError> {
        let mut form = Form::new();
        for photo in photos {
            let part = Part::bytes(photo.data.to_vec())
                .file_name(photo.file_name.clone())
                .mime_str(&photo.content_type)?;
            form = form.part(PHOTO_FIELD, part);
        }

        let url = self.endpoint(&["api", "upload"])?;
        debug!(%url, count = photos.len(), "POST multipart");
        let response = self.http.post(url).multipart(form).send().await?;
        let uploaded: UploadResponse = Self::check(response).await?.json().await?;

        if uploaded.urls.is_empty() {
            return Err(BackendError::MissingUploadUrls);
        }
        Ok(uploaded.urls)
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    /// `GET /api/comments/:id`
    pub async fn list_comments(&self, id: SpotId) -> Result<Vec<Comment>, BackendError> {
        let id = id.to_string();
        self.get_json(self.endpoint(&["api", "comments", &id])?).await
    }

    /// `POST /api/comments/:id/comment`
    pub async fn add_comment(&self, id: SpotId, comment: &NewComment) -> Result<(), BackendError> {
        let id = id.to_string();
        self.post_json(self.endpoint(&["api", "comments", &id, "comment"])?, comment)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// `POST /api/users/register`
    pub async fn register_user(&self, registration: &UserRegistration) -> Result<(), BackendError> {
        self.post_json(self.endpoint(&["api", "users", "register"])?, registration)
            .await?;
        Ok(())
    }
}
