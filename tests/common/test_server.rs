use std::path::PathBuf;
use std::sync::Arc;

use reqwest::redirect::Policy;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use scoresheet::auth::Passwords;
use scoresheet::config::ServerConfig;
use scoresheet::server::{AppState, create_router};
use scoresheet::service::accounts;
use scoresheet::store::{SqliteStore, Store};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// The real router on an ephemeral port, backed by a temp data dir with one
/// admin account already created.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub store: Arc<SqliteStore>,
    pub config: ServerConfig,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut ServerConfig)) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");

        let mut config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };
        configure(&mut config);

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");
        accounts::create_admin(
            store.as_ref(),
            &Passwords::new(),
            ADMIN_USERNAME,
            "admin@example.com",
            ADMIN_PASSWORD,
        )
        .expect("create admin");

        let state = Arc::new(AppState::new(store.clone(), config.clone()));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://{addr}"),
            store,
            config,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.config.uploads_dir()
    }

    /// A client that keeps cookies and does not follow redirects.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("build client")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Client {
        let client = self.client();
        let resp = client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login");
        assert_eq!(resp.status(), 200, "login as {username} failed");
        client
    }

    pub async fn admin(&self) -> reqwest::Client {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Registers a regular user and returns a signed-in client.
    pub async fn user(&self, username: &str) -> reqwest::Client {
        let password = format!("{username}-pw");
        let resp = self
            .client()
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
                "confirm_password": password,
            }))
            .send()
            .await
            .expect("register");
        assert_eq!(resp.status(), 201, "register {username} failed");

        self.login(username, &password).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sends a request and returns the status with the parsed JSON body.
pub async fn send_json(request: reqwest::RequestBuilder) -> (u16, Value) {
    let resp = request.send().await.expect("send request");
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}
