use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE};
use axum::routing::{get, patch, post};
use serde_json::{Value, json};

use super::*;
use crate::test_helpers::{logged_in_client, spawn_api, test_client};

fn registration() -> Registration {
    Registration {
        name: "  Ana  ".into(),
        cpf: "123.456.789-09".into(),
        email: " ana@mail.com ".into(),
        password: "segredo".into(),
    }
}

fn post_form() -> PostForm {
    PostForm {
        title: "Buraco".into(),
        description: "Buraco na via".into(),
        address: "Rua B, 20".into(),
        cep: "01001000".into(),
        neighborhood: "Centro".into(),
        category_id: 2,
        department_id: 1,
        coordinates: Some((-23.5, -46.6)),
        photo: Some(Photo { file_name: "photo.png".into(), bytes: vec![0x89, 0x50, 0x4e, 0x47] }),
    }
}

// =============================================================================
// Endpoint formatting
// =============================================================================

#[test]
fn endpoints_format_expected_paths() {
    assert_eq!(post_endpoint(7), "/post/7");
    assert_eq!(denounce_endpoint(7), "/post/complait/7");
    assert_eq!(user_endpoint(3), "/user/3");
    assert_eq!(comments_endpoint(7), "/comments/7");
}

#[test]
fn photo_mime_follows_extension() {
    let photo = |name: &str| Photo { file_name: name.into(), bytes: Vec::new() };
    assert_eq!(photo("a.png").mime(), "image/png");
    assert_eq!(photo("a.JPG").mime(), "image/jpeg");
    assert_eq!(photo("a.heic").mime(), "image/heic");
    assert_eq!(photo("noext").mime(), "image/jpeg");
}

// =============================================================================
// Registration validation
// =============================================================================

#[test]
fn registration_normalizes_fields() {
    let normalized = registration().normalized();
    assert_eq!(normalized.name, "Ana");
    assert_eq!(normalized.email, "ana@mail.com");
    assert_eq!(normalized.cpf, "12345678909");
}

#[test]
fn registration_validation_rejects_bad_fields() {
    assert!(registration().validate().is_ok());

    let mut r = registration();
    r.name = "   ".into();
    assert!(matches!(r.validate(), Err(RegisterError::Invalid { field: "name", .. })));

    let mut r = registration();
    r.email = "ana.mail.com".into();
    assert!(matches!(r.validate(), Err(RegisterError::Invalid { field: "email", .. })));

    let mut r = registration();
    r.cpf = "123".into();
    assert!(matches!(r.validate(), Err(RegisterError::Invalid { field: "cpf", .. })));

    let mut r = registration();
    r.password = "12345".into();
    assert!(matches!(r.validate(), Err(RegisterError::Invalid { field: "password", .. })));
}

// =============================================================================
// Requests against the mock API
// =============================================================================

#[tokio::test]
async fn register_posts_normalized_body() {
    let router = Router::new().route(
        "/user",
        post(|axum::Json(body): axum::Json<Value>| async move {
            if body == json!({ "name": "Ana", "cpf": "12345678909", "email": "ana@mail.com", "password": "segredo" }) {
                (StatusCode::CREATED, axum::Json(json!({ "id": 9 })))
            } else {
                (StatusCode::BAD_REQUEST, axum::Json(json!({ "message": "unexpected body" })))
            }
        }),
    );
    let client = test_client(&spawn_api(router).await);
    register_user(&client, &registration()).await.unwrap();
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn register_maps_remote_statuses() {
    let router = Router::new()
        .route("/user", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let client = test_client(&spawn_api(router).await);
    assert!(matches!(register_user(&client, &registration()).await, Err(RegisterError::AlreadyRegistered)));

    let router = Router::new().route("/user", post(|| async { StatusCode::UNPROCESSABLE_ENTITY }));
    let client = test_client(&spawn_api(router).await);
    assert!(matches!(register_user(&client, &registration()).await, Err(RegisterError::InvalidCpf)));
}

#[tokio::test]
async fn register_is_sent_without_bearer() {
    let router = Router::new().route(
        "/user",
        post(|headers: HeaderMap| async move {
            if headers.contains_key(AUTHORIZATION) { StatusCode::BAD_REQUEST } else { StatusCode::CREATED }
        }),
    );
    let client = logged_in_client(router).await;
    register_user(&client, &registration()).await.unwrap();
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn register_unauthorized_keeps_session() {
    let client = logged_in_client(Router::new().route("/user", post(crate::test_helpers::unauthorized))).await;
    let mut events = client.session().subscribe();

    let err = register_user(&client, &registration()).await.unwrap_err();
    assert!(matches!(err, RegisterError::Api(ApiError::Status { status: 401, .. })));
    assert!(client.session().is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn list_posts_decodes_records() {
    let router = Router::new().route(
        "/posts",
        get(|| async {
            axum::Json(json!([{
                "id": 1, "title": "Poste", "description": "apagado", "status": "EM ANDAMENTO",
                "categoryId": 1, "userId": 1, "departmentId": 2
            }]))
        }),
    );
    let client = logged_in_client(router).await;
    let posts = list_posts(&client).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].status, "EM ANDAMENTO");
}

#[tokio::test]
async fn lookups_decode_records() {
    let router = Router::new()
        .route("/categories", get(|| async { axum::Json(json!([{ "id": 1, "name": "Iluminação" }])) }))
        .route("/departments", get(|| async { axum::Json(json!([{ "id": 2, "name": "Ouvidoria" }])) }))
        .route("/banners", get(|| async { axum::Json(json!([{ "id": 3, "publicUrl": "https://cdn.test/b.png" }])) }));
    let client = logged_in_client(router).await;

    assert_eq!(list_categories(&client).await.unwrap()[0].name, "Iluminação");
    assert_eq!(list_departments(&client).await.unwrap()[0].name, "Ouvidoria");
    assert_eq!(list_banners(&client).await.unwrap()[0].public_url.as_deref(), Some("https://cdn.test/b.png"));
}

#[tokio::test]
async fn create_post_sends_multipart() {
    let router = Router::new().route(
        "/post",
        post(|headers: HeaderMap| async move {
            let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
            axum::Json(json!({ "multipart": content_type.starts_with("multipart/form-data") }))
        }),
    );
    let client = logged_in_client(router).await;
    let created = create_post(&client, post_form()).await.unwrap();
    assert_eq!(created["multipart"], true);
}

#[tokio::test]
async fn update_and_denounce_hit_post_routes() {
    let router = Router::new()
        .route("/post/{id}", axum::routing::put(|| async { axum::Json(json!({ "updated": true })) }))
        .route("/post/complait/{id}", patch(|| async { axum::Json(json!({ "denounced": true })) }));
    let client = logged_in_client(router).await;

    assert_eq!(update_post(&client, 5, post_form()).await.unwrap()["updated"], true);
    assert_eq!(denounce_post(&client, 5).await.unwrap()["denounced"], true);
}

#[tokio::test]
async fn comments_round_trip_through_api() {
    let router = Router::new().route(
        "/comments/{post_id}",
        get(|| async {
            axum::Json(json!([{ "id": 1, "text": "Obrigado", "userId": 1, "postId": 5 }]))
        })
        .post(|axum::Json(body): axum::Json<Value>| async move { axum::Json(json!({ "echo": body["text"] })) }),
    );
    let client = logged_in_client(router).await;

    let comments = list_comments(&client, 5).await.unwrap();
    assert_eq!(comments[0].text, "Obrigado");

    let created = create_comment(&client, 5, "  Resolvido?  ").await.unwrap();
    assert_eq!(created["echo"], "Resolvido?");
}

#[tokio::test]
async fn blank_comment_is_rejected_locally() {
    let client = test_client("http://127.0.0.1:9");
    assert!(matches!(create_comment(&client, 5, "   ").await, Err(ApiError::InvalidRequest(_))));
}

#[tokio::test]
async fn get_user_and_update_profile() {
    let edited = Arc::new(AtomicBool::new(false));
    let on_patch = Arc::clone(&edited);
    let router = Router::new()
        .route(
            "/user/{id}",
            get(move || {
                let name = if edited.load(Ordering::SeqCst) { "T2" } else { "T" };
                async move {
                    axum::Json(json!({ "id": 1, "name": name, "email": "t@mail.com", "cpf": "00000000000", "posts": [] }))
                }
            }),
        )
        .route(
            "/user",
            patch(move || {
                on_patch.store(true, Ordering::SeqCst);
                async { axum::Json(json!({ "id": 1, "name": "T2" })) }
            }),
        );
    let client = logged_in_client(router).await;

    let details = get_user(&client, 1).await.unwrap();
    assert_eq!(details.name, "T");
    assert!(details.posts.is_empty());
    assert_eq!(client.session().user().unwrap().name, "T");
    let generation = client.session().generation();

    let profile = ProfileForm { name: "T2".into(), email: "t@mail.com".into(), cpf: "000.000.000-00".into(), avatar: None };
    assert_eq!(update_profile(&client, profile).await.unwrap()["name"], "T2");

    let snap = client.session().snapshot();
    assert_eq!(snap.user.unwrap().name, "T2");
    assert_eq!(snap.token.as_deref(), Some(crate::test_helpers::TEST_TOKEN));
    assert_eq!(snap.generation, generation);
}

#[tokio::test]
async fn resource_unauthorized_ends_session() {
    let client = logged_in_client(Router::new().route("/categories", get(crate::test_helpers::unauthorized))).await;
    assert!(matches!(list_categories(&client).await, Err(ApiError::Unauthorized { .. })));
    assert!(!client.session().is_authenticated());
}
