use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use repo_batch::config::Credentials;
use repo_batch::infrastructure::BatchError;
use repo_batch::review::{
    build_payload, map_users_to_json_array, workspace_reviewers, BitbucketClient, ReviewOutcome,
    ReviewService,
};

/// "u:k" 的 basic auth
const AUTH: &str = "Basic dTpr";

fn create_test_client(server: &MockServer) -> BitbucketClient {
    BitbucketClient::with_base_url(server.uri(), Credentials::new("u", "k"), Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn test_submit_created() {
    let server = MockServer::start().await;
    let payload = build_payload("feature/x", map_users_to_json_array(["{a}"]), "My PR");

    Mock::given(method("POST"))
        .and(path("/2.0/repositories/acme/service-a/pullrequests"))
        .and(header("authorization", AUTH))
        .and(body_json(json!({
            "title": "My PR",
            "source": {"branch": {"name": "feature/x"}},
            "reviewers": [{"uuid": "{a}"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let outcome = client.submit(&payload, "acme", "service-a").await.unwrap();
    assert_eq!(outcome, ReviewOutcome::Created);
}

#[tokio::test]
async fn test_submit_rejected_is_not_an_error() {
    let server = MockServer::start().await;
    let payload = build_payload("feature/x", Vec::new(), "My PR");

    Mock::given(method("POST"))
        .and(path("/2.0/repositories/acme/service-a/pullrequests"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"error": {"message": "branch not found"}}"#),
        )
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    match client.submit(&payload, "acme", "service-a").await.unwrap() {
        ReviewOutcome::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("branch not found"));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_unreachable_server_is_network_error() {
    // 绑定后立即释放端口，保证没有进程在监听
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client =
        BitbucketClient::with_base_url(uri, Credentials::new("u", "k"), Duration::from_secs(2)).unwrap();
    let payload = build_payload("b", Vec::new(), "t");
    let result = client.submit(&payload, "acme", "service-a").await;
    assert!(matches!(
        result,
        Err(BatchError::Network { .. }) | Err(BatchError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_workspace_members_follow_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"user": {"uuid": "{c}", "display_name": "Cid"}}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"user": {"uuid": "{a}", "display_name": "Ann"}},
                {"user": {"uuid": "{b}", "display_name": "Bob"}}
            ],
            "next": format!("{}/2.0/workspaces/acme/members?page=2", server.uri())
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let members = client.workspace_members("acme").await.unwrap();
    let names: Vec<_> = members.iter().map(|m| m.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bob", "Cid"]);
}

#[tokio::test]
async fn test_workspace_members_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    match client.workspace_members("acme").await {
        Err(BatchError::Network { message, url }) => {
            assert!(message.contains("401"));
            assert!(url.unwrap().ends_with("/2.0/workspaces/acme/members"));
        }
        other => panic!("expected network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_workspace_reviewers_exclude_current_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                {"user": {"uuid": "{me}", "display_name": "Me"}},
                {"user": {"uuid": "{a}", "display_name": "Ann"}}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2.0/user/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "{me}",
            "display_name": "Me"
        })))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let reviewers = workspace_reviewers(&client, "acme").await.unwrap();
    assert_eq!(reviewers.len(), 1);
    assert_eq!(reviewers[0].uuid, "{a}");
}

#[tokio::test]
async fn test_pagination_link_to_other_host_is_refused() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"user": {"uuid": "{a}", "display_name": "Ann"}}],
            "next": "https://collector.example.com/2.0/workspaces/acme/members?page=2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    match client.workspace_members("acme").await {
        Err(BatchError::Network { url, .. }) => {
            assert_eq!(
                url.as_deref(),
                Some("https://collector.example.com/2.0/workspaces/acme/members?page=2")
            );
        }
        other => panic!("expected network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_pagination_link_stops() {
    let server = MockServer::start().await;
    let second = format!("{}/2.0/workspaces/acme/members?page=2", server.uri());

    // 第二页的 next 指向自己
    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"user": {"uuid": "{b}", "display_name": "Bob"}}],
            "next": second
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2.0/workspaces/acme/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [{"user": {"uuid": "{a}", "display_name": "Ann"}}],
            "next": second
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let members = client.workspace_members("acme").await.unwrap();
    let uuids: Vec<_> = members.iter().map(|m| m.uuid.as_str()).collect();
    assert_eq!(uuids, vec!["{a}", "{b}"]);
}
