//! Wire records exchanged with the Zelus API.
//!
//! The API speaks camelCase JSON. Optional embedded records (`category`,
//! `user`, `department` on a post) are only present on some endpoints, so
//! they default to `None` rather than failing the decode.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

// =============================================================================
// USERS
// =============================================================================

/// Identity record of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
}

/// Public profile returned by `GET /user/{id}`, including the user's posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub cpf: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl From<&UserDetails> for User {
    fn from(details: &UserDetails) -> Self {
        Self { id: details.id, name: details.name.clone(), email: details.email.clone(), cpf: details.cpf.clone() }
    }
}

// =============================================================================
// POSTS
// =============================================================================

/// A solicitação: one citizen service request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    /// Coordinates arrive as decimal strings.
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub date_init: Option<String>,
    #[serde(default)]
    pub date_end: Option<String>,
    /// Staff comment attached when the request is handled.
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
    pub category_id: i64,
    pub user_id: i64,
    pub department_id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub department: Option<Department>,
}

impl Post {
    /// Parsed `(latitude, longitude)` when both are present and numeric.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.latitude.as_deref()?.trim().parse::<f64>().ok()?;
        let lng = self.longitude.as_deref()?.trim().parse::<f64>().ok()?;
        Some((lat, lng))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    pub post_id: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Home-screen banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
}

// =============================================================================
// CPF
// =============================================================================

/// Strip everything but digits (`"123.456.789-09"` -> `"12345678909"`).
#[must_use]
pub fn normalize_cpf(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
