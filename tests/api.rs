mod common;

use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use common::{ADMIN_USERNAME, TestServer, send_json};
use scoresheet::store::Store;

fn csv_form(filename: &str, content: &str) -> Form {
    Form::new().part(
        "csv_file",
        Part::bytes(content.as_bytes().to_vec())
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .expect("mime"),
    )
}

fn image_form(name: &str, filename: &str) -> Form {
    Form::new().text("name", name.to_string()).part(
        "image",
        Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
            .file_name(filename.to_string())
            .mime_str("image/png")
            .expect("mime"),
    )
}

async fn create_activity(server: &TestServer, admin: &reqwest::Client, name: &str) -> i64 {
    let (status, body) = send_json(
        admin
            .post(server.url("/activities"))
            .json(&json!({ "form": "activity", "name": name, "max_score": 100 })),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    body["data"]["id"].as_i64().expect("activity id")
}

async fn create_team(server: &TestServer, admin: &reqwest::Client, name: &str) -> i64 {
    let (status, body) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(Form::new().text("name", name.to_string())),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    body["data"]["team"]["id"].as_i64().expect("team id")
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let resp = server.client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_guards_check_authentication_before_role() {
    let server = TestServer::start().await;
    let anonymous = server.client();

    let (status, body) = send_json(anonymous.get(server.url("/teams"))).await;
    assert_eq!(status, 401);
    assert!(body["error"].is_string());

    let (status, _) = send_json(anonymous.get(server.url("/scores"))).await;
    assert_eq!(status, 401);

    let user = server.user("alice").await;
    let (status, _) = send_json(user.get(server.url("/teams"))).await;
    assert_eq!(status, 403);
    let (status, _) = send_json(user.get(server.url("/admin/dashboard"))).await;
    assert_eq!(status, 403);
    let (status, _) = send_json(user.post(server.url("/admin/reset-scores"))).await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let server = TestServer::start().await;
    let client = server.user("alice").await;

    let resp = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/user/dashboard");

    let (status, body) = send_json(client.get(server.url("/user/dashboard"))).await;
    assert_eq!(status, 200);
    assert!(body["data"]["my_scores"].as_array().unwrap().is_empty());

    let resp = client.get(server.url("/login")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/");

    let resp = client.get(server.url("/logout")).send().await.unwrap();
    assert_eq!(resp.status(), 303);

    let (status, _) = send_json(client.get(server.url("/user/dashboard"))).await;
    assert_eq!(status, 401);

    let (status, body) = send_json(client.get(server.url("/"))).await;
    assert_eq!(status, 200);
    assert!(body["data"]["standings"].is_array());
}

#[tokio::test]
async fn test_login_cookie_and_redirect_target() {
    let server = TestServer::start().await;

    let resp = server
        .client()
        .post(server.url("/login?next=/scores"))
        .json(&json!({ "username": ADMIN_USERNAME, "password": common::ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("scoresheet_session=ss_"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["redirect"], "/scores");
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"].get("password_hash").is_none());

    let (_, body) = send_json(
        server
            .client()
            .post(server.url("/login?next=//evil.example.com"))
            .json(&json!({ "username": ADMIN_USERNAME, "password": common::ADMIN_PASSWORD })),
    )
    .await;
    assert_eq!(body["data"]["redirect"], "/");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let server = TestServer::start().await;
    let (status, body) = send_json(
        server
            .client()
            .post(server.url("/login"))
            .json(&json!({ "username": ADMIN_USERNAME, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn test_duplicate_email_registration_persists_nothing() {
    let server = TestServer::start().await;
    server.user("alice").await;

    let (status, _) = send_json(server.client().post(server.url("/register")).json(&json!({
        "username": "mallory",
        "email": "alice@example.com",
        "password": "secret1",
        "confirm_password": "secret1",
    })))
    .await;
    assert_eq!(status, 409);
    assert!(server.store.get_user_by_username("mallory").unwrap().is_none());

    let (status, _) = send_json(server.client().post(server.url("/register")).json(&json!({
        "username": "mallory",
        "email": "mallory@example.com",
        "password": "secret1",
        "confirm_password": "secret2",
    })))
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_csv_import_counts_created_and_skipped() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    create_team(&server, &admin, "Alpha").await;

    let (status, body) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(csv_form("teams.csv", "Team Name\nAlpha\nBeta\n\nGamma\n")),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["data"]["import"], json!({ "created": 2, "skipped": 1 }));

    let (_, body) = send_json(admin.get(server.url("/teams"))).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
}

#[tokio::test]
async fn test_malformed_csv_writes_nothing() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let (status, _) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(csv_form("teams.csv", "Team Name,Captain\nAlpha,Ann\nBeta\n")),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(csv_form("teams.csv", "Name\nAlpha\n")),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(csv_form("teams.txt", "Team Name\nAlpha\n")),
    )
    .await;
    assert_eq!(status, 400);

    assert!(server.store.list_teams().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_team_form_is_rejected() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let (status, _) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(Form::new().text("name", "   ")),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_team_image_lifecycle() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let (status, body) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(image_form("Alpha", "Team Logo.png")),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    let team_id = body["data"]["team"]["id"].as_i64().unwrap();
    let original = body["data"]["team"]["image_filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(original.starts_with("Team_Logo_"));
    assert!(server.uploads_dir().join(&original).exists());

    let (status, body) = send_json(
        admin
            .post(server.url(&format!("/teams/{team_id}/edit")))
            .multipart(image_form("Alpha Prime", "new.png")),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    let replacement = body["data"]["image_filename"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["name"], "Alpha Prime");
    assert!(!server.uploads_dir().join(&original).exists());
    assert!(server.uploads_dir().join(&replacement).exists());

    let (status, _) = send_json(admin.get(server.url(&format!("/teams/{team_id}/delete")))).await;
    assert_eq!(status, 200);
    assert!(!server.uploads_dir().join(&replacement).exists());
    assert!(server.store.get_team(team_id).unwrap().is_none());
}

#[tokio::test]
async fn test_rejects_non_image_upload() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let (status, _) = send_json(
        admin
            .post(server.url("/teams"))
            .multipart(image_form("Alpha", "payload.exe")),
    )
    .await;
    assert_eq!(status, 400);
    assert!(server.store.list_teams().unwrap().is_empty());
}

#[tokio::test]
async fn test_activity_lock_on_create_and_edit() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let team = create_team(&server, &admin, "Alpha").await;
    let relay = create_activity(&server, &admin, "Relay").await;
    let quiz = create_activity(&server, &admin, "Quiz").await;

    let (status, body) = send_json(admin.post(server.url("/activities")).json(&json!({
        "form": "user",
        "username": "judge",
        "email": "judge@example.com",
        "password": "judge-pw",
        "activity_id": relay,
    })))
    .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["created"], "user");
    assert_eq!(body["data"]["activity_id"], relay);

    let judge = server.login("judge", "judge-pw").await;

    let (_, body) = send_json(judge.get(server.url("/scores"))).await;
    let visible: Vec<i64> = body["data"]["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(visible, vec![relay]);

    let (status, body) = send_json(judge.post(server.url("/scores")).json(&json!({
        "team_id": team,
        "activity_id": quiz,
        "score": 8,
    })))
    .await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["data"]["activity_id"], relay);
    let score_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send_json(
        judge
            .post(server.url(&format!("/scores/{score_id}/edit")))
            .json(&json!({ "team_id": team, "activity_id": quiz, "score": 9 })),
    )
    .await;
    assert_eq!(status, 200, "{body}");

    let stored = server.store.get_score(score_id).unwrap().unwrap();
    assert_eq!(stored.activity_id, relay);
    assert_eq!(stored.score, 9);
}

#[tokio::test]
async fn test_only_owner_or_admin_can_change_scores() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let team = create_team(&server, &admin, "Alpha").await;
    let relay = create_activity(&server, &admin, "Relay").await;

    let alice = server.user("alice").await;
    let bob = server.user("bob").await;

    let (_, body) = send_json(alice.post(server.url("/scores")).json(&json!({
        "team_id": team,
        "activity_id": relay,
        "score": 4,
    })))
    .await;
    let score_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send_json(bob.get(server.url(&format!("/scores/{score_id}/delete")))).await;
    assert_eq!(status, 403);
    let (status, _) = send_json(
        bob.post(server.url(&format!("/scores/{score_id}/edit")))
            .json(&json!({ "team_id": team, "activity_id": relay, "score": 0 })),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = send_json(admin.get(server.url(&format!("/scores/{score_id}/edit")))).await;
    assert_eq!(status, 200);
    let (status, _) = send_json(alice.get(server.url(&format!("/scores/{score_id}/delete")))).await;
    assert_eq!(status, 200);
    assert!(server.store.get_score(score_id).unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_team_is_a_validation_error() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let relay = create_activity(&server, &admin, "Relay").await;

    let (status, _) = send_json(admin.post(server.url("/scores")).json(&json!({
        "team_id": 4242,
        "activity_id": relay,
        "score": 1,
    })))
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_huge_scores_rejected_and_leaderboard_stays_up() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let judge = server.user("judge").await;
    let team = create_team(&server, &admin, "Alpha").await;
    let relay = create_activity(&server, &admin, "Relay").await;

    for _ in 0..2 {
        let (status, _) = send_json(judge.post(server.url("/scores")).json(&json!({
            "team_id": team,
            "activity_id": relay,
            "score": i64::MAX,
        })))
        .await;
        assert_eq!(status, 400);
    }
    assert!(server.store.list_scores().unwrap().is_empty());

    let (status, body) = send_json(server.client().get(server.url("/api/leaderboard"))).await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["total_score"], 0);
}

#[tokio::test]
async fn test_max_score_enforced_when_configured() {
    let server = TestServer::start_with(|config| config.enforce_max_score = true).await;
    let admin = server.admin().await;
    let team = create_team(&server, &admin, "Alpha").await;
    let relay = create_activity(&server, &admin, "Relay").await;

    let (status, _) = send_json(admin.post(server.url("/scores")).json(&json!({
        "team_id": team,
        "activity_id": relay,
        "score": 101,
    })))
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_admin_cannot_demote_or_delete_self() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let admin_id = server
        .store
        .get_user_by_username(ADMIN_USERNAME)
        .unwrap()
        .unwrap()
        .id;

    let (status, _) = send_json(
        admin.get(server.url(&format!("/admin/users/{admin_id}/toggle_role"))),
    )
    .await;
    assert_eq!(status, 403);

    let (status, _) = send_json(admin.get(server.url(&format!("/admin/users/{admin_id}/delete")))).await;
    assert_eq!(status, 403);

    assert!(server.store.get_user(admin_id).unwrap().unwrap().is_admin());

    server.user("alice").await;
    let alice_id = server.store.get_user_by_username("alice").unwrap().unwrap().id;
    let (status, body) = send_json(
        admin.get(server.url(&format!("/admin/users/{alice_id}/toggle_role"))),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], "admin");
}

#[tokio::test]
async fn test_reset_scores_and_leaderboard() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let alpha = create_team(&server, &admin, "Alpha").await;
    let beta = create_team(&server, &admin, "Beta").await;
    let gamma = create_team(&server, &admin, "Gamma").await;
    let relay = create_activity(&server, &admin, "Relay").await;

    for (team, score) in [(beta, 10), (beta, 20), (gamma, 5)] {
        let (status, _) = send_json(admin.post(server.url("/scores")).json(&json!({
            "team_id": team,
            "activity_id": relay,
            "score": score,
        })))
        .await;
        assert_eq!(status, 201);
    }

    let leaderboard: Value = server
        .client()
        .get(server.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rows = leaderboard.as_array().expect("bare array");
    let order: Vec<(i64, i64, i64)> = rows
        .iter()
        .map(|r| {
            (
                r["id"].as_i64().unwrap(),
                r["total_score"].as_i64().unwrap(),
                r["activities_completed"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(order, vec![(beta, 30, 2), (gamma, 5, 1), (alpha, 0, 0)]);

    let (_, body) = send_json(admin.get(server.url("/admin/dashboard"))).await;
    let top = &body["data"]["team_stats"][0];
    assert_eq!(top["name"], "Beta");
    assert_eq!(top["average_score"], 15.0);
    assert_eq!(top["highest_score"], 20);

    let (status, body) = send_json(admin.post(server.url("/admin/reset-scores"))).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["deleted"], 3);

    let (_, body) = send_json(server.client().get(server.url("/"))).await;
    let standings = body["data"]["standings"].as_array().unwrap();
    assert_eq!(standings.len(), 3);
    assert!(standings.iter().all(|s| s["total_score"] == 0));
    assert_eq!(server.store.list_activities().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sample_csv_download() {
    let server = TestServer::start().await;
    let resp = server
        .client()
        .get(server.url("/download/sample-teams-csv"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/csv");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=sample_teams.csv"
    );

    let body = resp.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("Team Name"));
    assert_eq!(lines.count(), 8);
}

#[tokio::test]
async fn test_deleting_activity_unlocks_users() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let relay = create_activity(&server, &admin, "Relay").await;

    let (status, _) = send_json(admin.post(server.url("/activities")).json(&json!({
        "form": "user",
        "username": "judge",
        "email": "judge@example.com",
        "password": "judge-pw",
        "activity_id": relay,
    })))
    .await;
    assert_eq!(status, 201);

    let (status, _) = send_json(admin.get(server.url(&format!("/activities/{relay}/delete")))).await;
    assert_eq!(status, 200);

    let judge = server.store.get_user_by_username("judge").unwrap().unwrap();
    assert_eq!(judge.activity_id, None);
}
