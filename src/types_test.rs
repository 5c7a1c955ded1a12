use super::*;

fn sample_post() -> serde_json::Value {
    serde_json::json!({
        "id": 7,
        "title": "Poste apagado",
        "description": "Rua sem iluminação",
        "status": "EM ANDAMENTO",
        "address": "Rua A, 10",
        "cep": "01001000",
        "neighborhood": "Centro",
        "publicUrl": "https://cdn.test/p7.jpg",
        "latitude": "-23.55",
        "longitude": "-46.63",
        "dateInit": null,
        "dateEnd": null,
        "comment": null,
        "categoryId": 1,
        "userId": 3,
        "departmentId": 2,
        "createdAt": "2024-05-01T10:00:00.000Z",
        "updatedAt": "2024-05-01T10:00:00.000Z",
        "category": { "id": 1, "name": "Iluminação", "createdAt": "", "updatedAt": "" },
        "user": { "id": 3, "name": "Ana", "email": "ana@mail.com", "cpf": "12345678909" },
        "department": { "id": 2, "name": "Manutenção", "createdAt": "", "updatedAt": "", "admins": [] }
    })
}

#[test]
fn post_decodes_camel_case_payload() {
    let post: Post = serde_json::from_value(sample_post()).unwrap();
    assert_eq!(post.id, 7);
    assert_eq!(post.category_id, 1);
    assert_eq!(post.public_url.as_deref(), Some("https://cdn.test/p7.jpg"));
    assert_eq!(post.category.unwrap().name, "Iluminação");
    assert_eq!(post.user.unwrap().name, "Ana");
    assert!(post.date_init.is_none());
}

#[test]
fn post_without_embedded_records_decodes() {
    let post: Post = serde_json::from_value(serde_json::json!({
        "id": 1, "title": "t", "description": "d", "status": "RESOLVIDO",
        "categoryId": 1, "userId": 1, "departmentId": 1
    }))
    .unwrap();
    assert!(post.category.is_none());
    assert!(post.coordinates().is_none());
}

#[test]
fn post_coordinates_parse_strings() {
    let post: Post = serde_json::from_value(sample_post()).unwrap();
    let (lat, lng) = post.coordinates().unwrap();
    assert!((lat + 23.55).abs() < f64::EPSILON);
    assert!((lng + 46.63).abs() < f64::EPSILON);
}

#[test]
fn user_details_carry_posts() {
    let details: UserDetails = serde_json::from_value(serde_json::json!({
        "id": 3, "name": "Ana", "email": "ana@mail.com", "cpf": "12345678909",
        "status": "ATIVO", "avatarUrl": null, "posts": [sample_post()]
    }))
    .unwrap();
    assert_eq!(details.status.as_deref(), Some("ATIVO"));
    assert_eq!(details.posts.len(), 1);
}

#[test]
fn user_ignores_extra_fields() {
    let user: User = serde_json::from_value(serde_json::json!({
        "id": 1, "name": "T", "email": "t@mail.com", "cpf": "0", "createdAt": "x", "token": { "token": "abc" }
    }))
    .unwrap();
    assert_eq!(user.name, "T");
}

#[test]
fn normalize_cpf_strips_punctuation() {
    assert_eq!(normalize_cpf("123.456.789-09"), "12345678909");
    assert_eq!(normalize_cpf(" 000 "), "000");
    assert_eq!(normalize_cpf("abc"), "");
}
