//! Backend client behavior against a mock HTTP server.

use husmah_core::api::{ApiClient, ApiError};
use husmah_core::models::{
    ChangePasswordRequest, Position, ProjectDraft, RegisterRequest, UserUpdate,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_error(err: &anyhow::Error) -> &ApiError {
    err.downcast_ref::<ApiError>()
        .unwrap_or_else(|| panic!("expected ApiError, got {:#}", err))
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::new(&server.uri()).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_login_success_returns_user() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .and(body_json(json!({ "email": "sam@husmah.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": {
                "name": "Sam",
                "email": "sam@husmah.com",
                "position": "superadmin",
                "lastLoginAt": "2024-03-05T14:30:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client.login("sam@husmah.com", "secret1").await.unwrap();
    assert_eq!(user.email, "sam@husmah.com");
    assert_eq!(user.position, Position::SuperAdmin);
    assert_eq!(user.last_login_at.as_deref(), Some("2024-03-05T14:30:00Z"));
}

#[tokio::test]
async fn test_login_rejection_surfaces_backend_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid password"
        })))
        .mount(&server)
        .await;

    let err = client.login("sam@husmah.com", "wrong!!").await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::Rejected(m) if m == "Invalid password"));
}

#[tokio::test]
async fn test_login_success_flag_false_is_rejected() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let err = client.login("sam@husmah.com", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed. Please check your credentials.");
}

#[tokio::test]
async fn test_login_unreadable_error_body_uses_default_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client.login("sam@husmah.com", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Login failed. Please check your credentials.");
}

#[tokio::test]
async fn test_list_users_tolerates_unknown_positions() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/Auth/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Sam", "email": "sam@husmah.com", "position": "superadmin" },
            { "name": "Ola", "email": "ola@husmah.com", "position": "intern" },
            { "email": "kim@husmah.com" }
        ])))
        .mount(&server)
        .await;

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert!(users[0].is_superadmin());
    assert!(!users[1].is_superadmin());
    assert_eq!(users[2].position, Position::Admin);
}

#[tokio::test]
async fn test_get_user_not_found_is_none() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/Auth/user/free@husmah.com"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Auth/user/taken@husmah.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Taken", "email": "taken@husmah.com", "position": "admin"
        })))
        .mount(&server)
        .await;

    assert!(client.get_user("free@husmah.com").await.unwrap().is_none());
    assert!(!client.email_exists("free@husmah.com").await.unwrap());
    assert!(client.email_exists("taken@husmah.com").await.unwrap());
}

#[tokio::test]
async fn test_update_and_delete_user() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/Auth/user/ola@husmah.com"))
        .and(body_json(json!({ "position": "superadmin" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("updated"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/Auth/user/ola@husmah.com"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let update = UserUpdate {
        position: Some(Position::SuperAdmin),
        ..Default::default()
    };
    client.update_user("ola@husmah.com", &update).await.unwrap();
    client.delete_user("ola@husmah.com").await.unwrap();
}

#[tokio::test]
async fn test_register_failure_uses_backend_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .and(body_json(json!({
            "email": "new@husmah.com",
            "password": "Passw0rd",
            "name": "New Person",
            "position": "admin"
        })))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "User already exists" })),
        )
        .mount(&server)
        .await;

    let request = RegisterRequest {
        email: "new@husmah.com".to_string(),
        password: "Passw0rd".to_string(),
        name: "New Person".to_string(),
        position: Position::Admin,
    };
    let err = client.register_user(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "User already exists");
}

#[tokio::test]
async fn test_register_failure_without_message() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/user/register"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let request = RegisterRequest {
        email: "new@husmah.com".to_string(),
        password: "Passw0rd".to_string(),
        name: "New Person".to_string(),
        position: Position::Admin,
    };
    let err = client.register_user(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to create user access. Please try again.");
}

#[tokio::test]
async fn test_change_password_status_mapping() {
    let (server, client) = setup().await;
    let request = |email: &str| ChangePasswordRequest {
        email: email.to_string(),
        old_password: "Old1pass".to_string(),
        new_password: "New1pass".to_string(),
    };

    let cases = [
        ("bad@x.io", 400),
        ("gone@x.io", 404),
        ("boom@x.io", 503),
        ("ok@x.io", 200),
    ];
    for (email, status) in cases {
        Mock::given(method("POST"))
            .and(path("/api/Auth/user-change-password"))
            .and(body_json(json!({
                "email": email,
                "oldPassword": "Old1pass",
                "newPassword": "New1pass"
            })))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let err = client.change_password(&request("bad@x.io")).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid current password or request data");
    let err = client.change_password(&request("gone@x.io")).await.unwrap_err();
    assert_eq!(err.to_string(), "User not found");
    let err = client.change_password(&request("boom@x.io")).await.unwrap_err();
    assert_eq!(err.to_string(), "Server error: 503");
    client.change_password(&request("ok@x.io")).await.unwrap();
}

#[tokio::test]
async fn test_list_projects_handles_ids_and_nulls() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/Project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "_id": "65f0a1",
                "name": "Riverside Villa",
                "status": "completed",
                "mainImage": "https://img/1.jpg",
                "allImages": ["https://img/2.jpg"],
                "area": 240.5,
                "bedrooms": 4
            },
            { "id": "legacy-7", "name": "Old Mill", "allImages": null, "area": null }
        ])))
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].key(), Some("65f0a1"));
    assert_eq!(projects[0].image_count(), 2);
    assert_eq!(projects[0].bathrooms, 0);
    assert_eq!(projects[1].key(), Some("legacy-7"));
    assert!(projects[1].all_images.is_empty());
    assert_eq!(projects[1].area, 0.0);
}

#[tokio::test]
async fn test_update_project_sends_only_draft_fields() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/Project/65f0a1"))
        .and(body_json(json!({
            "name": "Riverside Villa",
            "description": "Two storey",
            "status": "ongoing",
            "mainImage": "https://img/1.jpg",
            "allImages": [],
            "area": 0.0,
            "flow": 0.0,
            "bedrooms": 3,
            "bathrooms": 0,
            "customerFeedback": ""
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let draft = ProjectDraft {
        name: "Riverside Villa".to_string(),
        description: "Two storey".to_string(),
        status: "ongoing".to_string(),
        main_image: "https://img/1.jpg".to_string(),
        bedrooms: 3,
        ..Default::default()
    };
    client.update_project("65f0a1", &draft).await.unwrap();
}

#[tokio::test]
async fn test_create_and_delete_project() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/Project"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "_id": "new" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/Project/new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let draft = ProjectDraft {
        name: "Lakeside".to_string(),
        ..Default::default()
    };
    client.create_project(&draft).await.unwrap();
    client.delete_project("new").await.unwrap();
}

#[tokio::test]
async fn test_error_statuses_are_typed() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/Project/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Auth/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    let err = client.get_project("missing").await.unwrap_err();
    assert!(api_error(&err).is_not_found());
    let err = client.list_users().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::ServerError(b) if b == "db down"));
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/Project"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let projects = client.list_projects().await.unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let client = ApiClient::new("http://127.0.0.1:1").unwrap();
    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::NetworkError(_)));
}
