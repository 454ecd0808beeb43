//! reqwest-backed CMS client

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use super::{CmsApi, CmsError, CmsErrorBody, MediaStream, Populate, TagQuery, UploadFile};
use crate::config::CmsConfig;
use crate::models::{
    AuthGrant, Collection, Course, CourseInput, Envelope, Lesson, LessonInput, Media,
    ProfileUpdate, Tag, User,
};

/// CMS client speaking the REST API over HTTP
pub struct HttpCmsClient {
    client: Client,
    base_url: String,
}

impl HttpCmsClient {
    /// Create a client for the configured CMS
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let client = Client::builder()
            .user_agent(concat!("coursedeck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Create a boxed client for use in application state
    pub fn boxed(config: &CmsConfig) -> Result<Arc<dyn CmsApi>, CmsError> {
        Ok(Arc::new(Self::new(config)?))
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, CmsError> {
        let request = builder.build()?;
        tracing::debug!(method = %request.method(), path = request.url().path(), "CMS request");

        let response = self.client.execute(request).await.map_err(|e| {
            tracing::error!("CMS request failed: {}", e);
            CmsError::from(e)
        })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CmsError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| CmsError::Decode(e.to_string()))
    }
}

/// Build a `CmsError` from a non-success response, preferring the CMS's own message
async fn error_from_response(response: Response) -> CmsError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<CmsErrorBody>(&text)
        .ok()
        .map(|body| body.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("CMS request failed")
                .to_string()
        });

    tracing::warn!(status = status.as_u16(), "CMS rejected request: {}", message);
    CmsError::status(status.as_u16(), message)
}

#[async_trait]
impl CmsApi for HttpCmsClient {
    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, CmsError> {
        let builder = self
            .request(Method::POST, "/auth/local", None)
            .json(&json!({ "identifier": identifier, "password": password }));
        self.send_json(builder).await
    }

    async fn current_user(&self, token: &str) -> Result<User, CmsError> {
        self.send_json(self.request(Method::GET, "/users/me", Some(token)))
            .await
    }

    async fn update_current_user(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, CmsError> {
        let builder = self
            .request(Method::POST, "/users/me", Some(token))
            .query(&Populate::All.query_pairs())
            .json(update);
        self.send_json(builder).await
    }

    async fn list_courses(&self, token: &str, populate: Populate) -> Result<Collection<Course>, CmsError> {
        let builder = self
            .request(Method::GET, "/courses", Some(token))
            .query(&populate.query_pairs());
        self.send_json(builder).await
    }

    async fn get_course(
        &self,
        token: &str,
        id: &str,
        populate: Populate,
    ) -> Result<Option<Course>, CmsError> {
        let path = format!("/courses/{}", urlencoding::encode(id));
        let builder = self
            .request(Method::GET, &path, Some(token))
            .query(&populate.query_pairs());

        match self.send_json::<Envelope<Option<Course>>>(builder).await {
            Ok(envelope) => Ok(envelope.data),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_course(&self, token: &str, input: &CourseInput) -> Result<Course, CmsError> {
        let builder = self
            .request(Method::POST, "/courses", Some(token))
            .json(&Envelope { data: input });
        let created: Envelope<Course> = self.send_json(builder).await?;
        Ok(created.data)
    }

    async fn set_course_lessons(
        &self,
        token: &str,
        id: &str,
        lesson_ids: &[String],
    ) -> Result<Course, CmsError> {
        let path = format!("/courses/{}", urlencoding::encode(id));
        let builder = self
            .request(Method::PUT, &path, Some(token))
            .json(&json!({ "data": { "lessons": lesson_ids } }));
        let updated: Envelope<Course> = self.send_json(builder).await?;
        Ok(updated.data)
    }

    async fn create_lesson(&self, token: &str, input: &LessonInput) -> Result<Lesson, CmsError> {
        let builder = self
            .request(Method::POST, "/lessons", Some(token))
            .json(&Envelope { data: input });
        let created: Envelope<Lesson> = self.send_json(builder).await?;
        Ok(created.data)
    }

    async fn update_lesson(
        &self,
        token: &str,
        id: &str,
        input: &LessonInput,
    ) -> Result<Lesson, CmsError> {
        let path = format!("/lessons/{}", urlencoding::encode(id));
        let builder = self
            .request(Method::PUT, &path, Some(token))
            .json(&Envelope { data: input });
        let updated: Envelope<Lesson> = self.send_json(builder).await?;
        Ok(updated.data)
    }

    async fn list_tags(&self, token: &str, query: &TagQuery) -> Result<Collection<Tag>, CmsError> {
        let builder = self
            .request(Method::GET, "/tags", Some(token))
            .query(&query.query_pairs());
        self.send_json(builder).await
    }

    async fn upload(&self, token: &str, file: UploadFile) -> Result<Vec<Media>, CmsError> {
        let mut part = reqwest::multipart::Part::bytes(file.data.to_vec()).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = reqwest::multipart::Form::new().part("files", part);

        let builder = self
            .request(Method::POST, "/upload", Some(token))
            .multipart(form);
        self.send_json(builder).await
    }

    async fn fetch_media(&self, url: &str) -> Result<MediaStream, CmsError> {
        tracing::debug!("Fetching media: {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Media fetch failed: {}", url);
            return Err(CmsError::status(
                status.as_u16(),
                format!(
                    "Image fetch failed: {}",
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(CmsError::from).boxed();

        Ok(MediaStream {
            content_type,
            content_length,
            body,
        })
    }
}
