use async_trait::async_trait;
use bits_leaderboard::{
    auth::{CredentialField, CredentialStore, Credentials, EnvFileStore, JsonFileStore, SaveError},
    deps::reqwest::{Method, StatusCode},
    error::{FetchError, TransportError},
    leaderboard::{LeaderboardClient, LeaderboardConfig},
    transport::{HttpRequest, HttpResponse, HttpTransport},
};
use serial_test::serial;
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::Mutex,
};

const ENV_FILE: &str = "# twitch\nCLIENT_ID=cid\nCLIENT_SECRET=csecret\nACCESS_TOKEN=old\nREFRESH_TOKEN=r1\n";
const TOKEN_BODY: &str =
    r#"{"access_token":"new","refresh_token":"r1","expires_in":14400,"scope":["bits:read"],"token_type":"bearer"}"#;

/// Replays canned responses in order and records every request.
#[derive(Debug, Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    yielding: bool,
}

impl ScriptedTransport {
    fn new(responses: impl IntoIterator<Item = Result<HttpResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Default::default()
        }
    }

    fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn calls(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.method == method)
            .count()
    }

    fn leaderboard_calls(&self) -> usize {
        self.calls(Method::GET)
    }

    fn token_calls(&self) -> usize {
        self.calls(Method::POST)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        if self.yielding {
            tokio::task::yield_now().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted request")
    }
}

fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(StatusCode::from_u16(status).unwrap(), body))
}

fn env_store() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, ENV_FILE).unwrap();
    (dir, path)
}

fn client(path: &Path, transport: ScriptedTransport) -> LeaderboardClient<ScriptedTransport> {
    LeaderboardClient::from_store(
        LeaderboardConfig::default(),
        transport,
        Box::new(EnvFileStore::new(path)),
    )
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> &'a str {
    req.headers.get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn empty_credentials_make_no_requests() {
    let (_dir, path) = env_store();
    let full = ["cid", "csecret", "old", "r1"];

    for (idx, field) in CredentialField::ALL.into_iter().enumerate() {
        let mut values = full;
        values[idx] = "";
        let [id, secret, access, refresh] = values;

        let client = LeaderboardClient::new(
            LeaderboardConfig::default(),
            ScriptedTransport::default(),
            Box::new(EnvFileStore::new(&path)),
            Credentials::new(id, secret, access, refresh),
        );

        let err = client.fetch().await.unwrap_err();
        assert!(
            matches!(&err, FetchError::MissingCredentials(missing) if missing.fields() == [field])
        );
        assert!(client.transport().requests().is_empty());
    }
}

#[tokio::test]
#[serial]
async fn unreadable_store_means_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let client = client(&dir.path().join("absent.env"), ScriptedTransport::default());

    let err = client.fetch().await.unwrap_err();
    match err {
        FetchError::MissingCredentials(missing) => assert_eq!(missing.fields().len(), 4),
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
async fn invalid_header_value_makes_no_requests() {
    let (_dir, path) = env_store();
    let client = LeaderboardClient::new(
        LeaderboardConfig::default(),
        ScriptedTransport::default(),
        Box::new(EnvFileStore::new(&path)),
        Credentials::new("cid\nx", "csecret", "old", "r1"),
    );

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidHeader(_)));
    assert!(client.transport().requests().is_empty());
}

#[tokio::test]
#[serial]
async fn environment_fills_credentials_missing_from_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, "CLIENT_ID=cid\nACCESS_TOKEN=old\n").unwrap();

    std::env::set_var("CLIENT_ID", "from-env");
    std::env::set_var("CLIENT_SECRET", "env-secret");
    std::env::set_var("REFRESH_TOKEN", "env-refresh");

    let client = client(
        &path,
        ScriptedTransport::new([ok(401, "expired"), ok(200, TOKEN_BODY), ok(200, "fresh")]),
    );

    for var in ["CLIENT_ID", "CLIENT_SECRET", "REFRESH_TOKEN"] {
        std::env::remove_var(var);
    }

    let response = client.fetch().await.unwrap();
    assert_eq!(response.body(), "fresh");

    let requests = client.transport().requests();
    assert_eq!(header(&requests[0], "client-id"), "cid");
    assert_eq!(
        requests[1].url.as_str(),
        "https://id.twitch.tv/oauth2/token?grant_type=refresh_token&refresh_token=env-refresh&client_id=cid&client_secret=env-secret"
    );
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "CLIENT_ID=cid\nACCESS_TOKEN=new\n"
    );
}

#[tokio::test]
async fn success_makes_no_token_calls() {
    let (_dir, path) = env_store();
    let client = client(&path, ScriptedTransport::new([ok(200, r#"{"data":[]}"#)]));

    let response = client.fetch().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), r#"{"data":[]}"#);
    assert!(!response.was_refreshed());

    let transport = client.transport();
    assert_eq!(transport.leaderboard_calls(), 1);
    assert_eq!(transport.token_calls(), 0);

    let requests = transport.requests();
    assert_eq!(
        requests[0].url.as_str(),
        "https://api.twitch.tv/helix/bits/leaderboard?count=5&period=all"
    );
    assert_eq!(header(&requests[0], "authorization"), "Bearer old");
    assert_eq!(header(&requests[0], "client-id"), "cid");
}

#[tokio::test]
async fn expired_token_is_refreshed_and_retried_once() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([
            ok(401, "expired"),
            ok(200, TOKEN_BODY),
            ok(200, r#"{"data":[{"user_login":"hactar","score":9001}]}"#),
        ]),
    );

    let response = client.fetch().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.body(),
        r#"{"data":[{"user_login":"hactar","score":9001}]}"#
    );
    assert!(response.was_refreshed());
    assert!(response.persistence_error().is_none());

    let transport = client.transport();
    assert_eq!(transport.leaderboard_calls(), 2);
    assert_eq!(transport.token_calls(), 1);

    let requests = transport.requests();
    assert_eq!(
        requests[1].url.as_str(),
        "https://id.twitch.tv/oauth2/token?grant_type=refresh_token&refresh_token=r1&client_id=cid&client_secret=csecret"
    );
    assert!(requests[1].headers.is_empty());
    assert_eq!(header(&requests[2], "authorization"), "Bearer new");

    assert_eq!(client.credentials().await.access_token().secret(), "new");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        ENV_FILE.replace("ACCESS_TOKEN=old", "ACCESS_TOKEN=new")
    );
}

#[tokio::test]
async fn second_unauthorized_is_returned_without_another_refresh() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([
            ok(401, "expired"),
            ok(200, TOKEN_BODY),
            ok(401, "still unauthorized"),
        ]),
    );

    let response = client.fetch().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.body(), "still unauthorized");

    let transport = client.transport();
    assert_eq!(transport.token_calls(), 1);
    assert_eq!(transport.leaderboard_calls(), 2);
}

#[tokio::test]
async fn other_errors_pass_through() {
    let (_dir, path) = env_store();
    let client = client(&path, ScriptedTransport::new([ok(503, "unavailable")]));

    let response = client.fetch().await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(!response.is_success());
    assert_eq!(response.into_body(), "unavailable");
    assert_eq!(client.transport().token_calls(), 0);
}

#[tokio::test]
async fn rejected_refresh_fails() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([
            ok(401, "expired"),
            ok(400, r#"{"status":400,"message":"Invalid refresh token"}"#),
        ]),
    );

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::RefreshFailed(status) if status == StatusCode::BAD_REQUEST));
    assert_eq!(client.transport().leaderboard_calls(), 1);
    assert_eq!(client.credentials().await.access_token().secret(), "old");
}

#[tokio::test]
async fn refresh_without_access_token_changes_nothing() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([ok(401, "expired"), ok(200, r#"{"token_type":"bearer"}"#)]),
    );

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::RefreshTokenFieldMissing));
    assert_eq!(client.transport().leaderboard_calls(), 1);
    assert_eq!(client.credentials().await.access_token().secret(), "old");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ENV_FILE);
}

#[tokio::test]
async fn refresh_with_garbage_body_fails() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([ok(401, "expired"), ok(200, "<html>")]),
    );

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedRefreshResponse(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ENV_FILE);
}

#[tokio::test]
async fn failed_save_still_retries_with_new_token() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([ok(401, "expired"), ok(200, TOKEN_BODY), ok(200, "fresh")]),
    );
    std::fs::remove_file(&path).unwrap();

    let response = client.fetch().await.unwrap();
    assert_eq!(response.body(), "fresh");
    assert!(matches!(
        response.persistence_error(),
        Some(SaveError::NotFound(_))
    ));
    assert_eq!(
        header(&client.transport().requests()[2], "authorization"),
        "Bearer new"
    );
    assert_eq!(client.credentials().await.access_token().secret(), "new");
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([ok(401, "expired"), Err(TransportError::Timeout)]),
    );

    let err = client.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(TransportError::Timeout)));
    assert_eq!(client.credentials().await.access_token().secret(), "old");
}

#[tokio::test]
async fn refreshed_json_store_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Secrets.json");
    std::fs::write(
        &path,
        r#"{"ClientId":"cid","ClientSecret":"csecret","AccessToken":"old","RefreshToken":"r1"}"#,
    )
    .unwrap();

    let client = LeaderboardClient::from_store(
        LeaderboardConfig::default(),
        ScriptedTransport::new([ok(401, "expired"), ok(200, TOKEN_BODY), ok(200, "fresh")]),
        Box::new(JsonFileStore::new(&path)),
    );
    client.fetch().await.unwrap();

    let reloaded = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(reloaded.client_id().as_str(), "cid");
    assert_eq!(reloaded.client_secret().secret(), "csecret");
    assert_eq!(reloaded.access_token().secret(), "new");
    assert_eq!(reloaded.refresh_token().secret(), "r1");
}

#[tokio::test]
async fn concurrent_fetches_share_one_refresh() {
    let (_dir, path) = env_store();
    let client = client(
        &path,
        ScriptedTransport::new([
            ok(401, "expired"),
            ok(401, "expired"),
            ok(200, TOKEN_BODY),
            ok(200, "a"),
            ok(200, "b"),
        ])
        .yielding(),
    );

    let (first, second) = tokio::join!(client.fetch(), client.fetch());
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert!(first.was_refreshed() ^ second.was_refreshed());

    let transport = client.transport();
    assert_eq!(transport.token_calls(), 1);
    assert_eq!(transport.leaderboard_calls(), 4);
}
