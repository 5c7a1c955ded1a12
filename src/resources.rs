//! Typed helpers for the Zelus REST endpoints.
//!
//! Each helper is a thin wrapper over [`ZelusClient::authenticated_request`]:
//! errors, including the 401 logout side effect, behave exactly as for a
//! raw call. Multipart bodies mirror the field names the API expects.

#[cfg(test)]
#[path = "resources_test.rs"]
mod resources_test;

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::client::ZelusClient;
use crate::error::{ApiError, RegisterError};
use crate::http::{RequestBody, RequestOptions, error_message};
use crate::types::{Banner, Category, Comment, Department, Post, User, UserDetails, normalize_cpf};

const MIN_PASSWORD_LEN: usize = 6;
const CPF_LEN: usize = 11;

// =============================================================================
// ENDPOINTS
// =============================================================================

fn post_endpoint(post_id: i64) -> String {
    format!("/post/{post_id}")
}

fn denounce_endpoint(post_id: i64) -> String {
    format!("/post/complait/{post_id}")
}

fn user_endpoint(user_id: i64) -> String {
    format!("/user/{user_id}")
}

fn comments_endpoint(post_id: i64) -> String {
    format!("/comments/{post_id}")
}

// =============================================================================
// FORM INPUTS
// =============================================================================

/// An image attached to a post or profile.
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Photo {
    /// `image/<extension>`, defaulting to `image/jpeg` when the name has none.
    #[must_use]
    pub fn mime(&self) -> String {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        match extension.as_deref() {
            Some("jpg") | None => "image/jpeg".to_owned(),
            Some(ext) => format!("image/{ext}"),
        }
    }

    fn into_part(self) -> Result<Part, ApiError> {
        let mime = self.mime();
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&mime)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

/// Fields of a new or edited solicitação.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub title: String,
    pub description: String,
    pub address: String,
    pub cep: String,
    pub neighborhood: String,
    pub category_id: i64,
    pub department_id: i64,
    pub coordinates: Option<(f64, f64)>,
    pub photo: Option<Photo>,
}

impl PostForm {
    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("address", self.address)
            .text("cep", self.cep)
            .text("neighborhood", self.neighborhood)
            .text("categoryId", self.category_id.to_string())
            .text("departmentId", self.department_id.to_string());
        if let Some((latitude, longitude)) = self.coordinates {
            form = form.text("latitude", latitude.to_string()).text("longitude", longitude.to_string());
        }
        if let Some(photo) = self.photo {
            form = form.part("file", photo.into_part()?);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub avatar: Option<Photo>,
}

impl ProfileForm {
    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name.trim().to_owned())
            .text("email", self.email.trim().to_owned())
            .text("cpf", normalize_cpf(&self.cpf));
        if let Some(avatar) = self.avatar {
            form = form.part("image", avatar.into_part()?);
        }
        Ok(form)
    }
}

/// Sign-up data for `POST /user`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Trimmed name and email, digits-only CPF.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            cpf: normalize_cpf(&self.cpf),
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
        }
    }

    /// Check the fields the sign-up screen validates before submitting.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), RegisterError> {
        let normalized = self.normalized();
        if normalized.name.is_empty() {
            return Err(RegisterError::Invalid { field: "name", reason: "required" });
        }
        if !normalized.email.contains('@') {
            return Err(RegisterError::Invalid { field: "email", reason: "must be an email address" });
        }
        if normalized.cpf.len() != CPF_LEN {
            return Err(RegisterError::Invalid { field: "cpf", reason: "must have 11 digits" });
        }
        if normalized.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegisterError::Invalid { field: "password", reason: "must have at least 6 characters" });
        }
        Ok(())
    }
}

// =============================================================================
// USERS
// =============================================================================

/// Create an account. Does not log in.
///
/// Sent without the session bearer and outside the 401 interceptor, so a
/// rejected sign-up never ends an existing session.
///
/// # Errors
///
/// Returns a validation error before sending, [`RegisterError::AlreadyRegistered`]
/// on a remote 500, [`RegisterError::InvalidCpf`] on a remote 422, or the
/// underlying API error.
pub async fn register_user(client: &ZelusClient, registration: &Registration) -> Result<(), RegisterError> {
    registration.validate()?;
    let response = client
        .http()
        .request(Method::POST, "/user")
        .json(&registration.normalized())
        .send()
        .await
        .map_err(|e| ApiError::from_transport(&e))?;

    let status = response.status();
    if status.is_success() {
        tracing::info!("user registered");
        return Ok(());
    }
    match status.as_u16() {
        500 => Err(RegisterError::AlreadyRegistered),
        422 => Err(RegisterError::InvalidCpf),
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Status { status, message: error_message(&body), body }.into())
        }
    }
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn get_user(client: &ZelusClient, user_id: i64) -> Result<UserDetails, ApiError> {
    client.get(&user_endpoint(user_id)).await
}

/// Update the logged-in user's profile, then reload the session user.
///
/// The reloaded user only replaces the stored one if the session is still
/// the one the edit was made under.
///
/// # Errors
///
/// Returns the API error of the PATCH or of the follow-up `GET /user/{id}`.
pub async fn update_profile(client: &ZelusClient, profile: ProfileForm) -> Result<serde_json::Value, ApiError> {
    let form = profile.into_form()?;
    let session = client.session();
    let generation = session.generation();
    let user_id = session.user().map(|user| user.id);

    let data = client
        .authenticated_request(Method::PATCH, "/user", RequestBody::Multipart(form), RequestOptions::default())
        .await?
        .data;

    if let Some(user_id) = user_id {
        let details = get_user(client, user_id).await?;
        if session.refresh_user(generation, User::from(&details)) {
            tracing::info!(user_id, "session user refreshed");
        }
    }
    Ok(data)
}

// =============================================================================
// POSTS
// =============================================================================

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn list_posts(client: &ZelusClient) -> Result<Vec<Post>, ApiError> {
    client.get("/posts").await
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn get_post(client: &ZelusClient, post_id: i64) -> Result<Post, ApiError> {
    client.get(&post_endpoint(post_id)).await
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn create_post(client: &ZelusClient, post: PostForm) -> Result<serde_json::Value, ApiError> {
    let form = post.into_form()?;
    client
        .authenticated_request(Method::POST, "/post", RequestBody::Multipart(form), RequestOptions::default())
        .await
        .map(|response| response.data)
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn update_post(client: &ZelusClient, post_id: i64, post: PostForm) -> Result<serde_json::Value, ApiError> {
    let form = post.into_form()?;
    client
        .authenticated_request(
            Method::PUT,
            &post_endpoint(post_id),
            RequestBody::Multipart(form),
            RequestOptions::default(),
        )
        .await
        .map(|response| response.data)
}

/// Report a post as abusive.
///
/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn denounce_post(client: &ZelusClient, post_id: i64) -> Result<serde_json::Value, ApiError> {
    client
        .authenticated_request(Method::PATCH, &denounce_endpoint(post_id), RequestBody::Empty, RequestOptions::default())
        .await
        .map(|response| response.data)
}

// =============================================================================
// LOOKUPS
// =============================================================================

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn list_categories(client: &ZelusClient) -> Result<Vec<Category>, ApiError> {
    client.get("/categories").await
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn list_departments(client: &ZelusClient) -> Result<Vec<Department>, ApiError> {
    client.get("/departments").await
}

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn list_banners(client: &ZelusClient) -> Result<Vec<Banner>, ApiError> {
    client.get("/banners").await
}

// =============================================================================
// COMMENTS
// =============================================================================

/// # Errors
///
/// Returns the API error of the underlying request.
pub async fn list_comments(client: &ZelusClient, post_id: i64) -> Result<Vec<Comment>, ApiError> {
    client.get(&comments_endpoint(post_id)).await
}

/// # Errors
///
/// Returns the API error of the underlying request, or
/// [`ApiError::InvalidRequest`] for blank text.
pub async fn create_comment(client: &ZelusClient, post_id: i64, text: &str) -> Result<serde_json::Value, ApiError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::InvalidRequest("comment text is empty".to_owned()));
    }
    client
        .authenticated_request(
            Method::POST,
            &comments_endpoint(post_id),
            RequestBody::Json(serde_json::json!({ "text": text })),
            RequestOptions::default(),
        )
        .await
        .map(|response| response.data)
}
