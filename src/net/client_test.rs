use super::*;
use crate::test_support::{RecordingTransport, ReloginTransport, memory_store, token_for};

fn client(policy: UnauthorizedPolicy) -> (AuthSession, ApiClient<RecordingTransport>) {
    let (_, store) = memory_store();
    let session = AuthSession::bootstrap(store);
    let client = ApiClient::for_session(RecordingTransport::new(), &session, policy);
    (session, client)
}

/// Request step that tags requests so ordering can be observed.
struct Tag(&'static str);

impl RequestStep for Tag {
    fn apply(&self, request: &mut ApiRequest) -> Result<(), ApiError> {
        request.query.push(("tag".to_owned(), self.0.to_owned()));
        Ok(())
    }
}

struct Reject;

impl RequestStep for Reject {
    fn apply(&self, _request: &mut ApiRequest) -> Result<(), ApiError> {
        Err(ApiError::InvalidRequest("rejected".to_owned()))
    }
}

#[tokio::test]
async fn anonymous_request_carries_no_bearer() {
    let (session, client) = client(UnauthorizedPolicy::Detect);
    assert!(!session.is_authenticated());

    client.execute(ApiRequest::get("/books")).await.unwrap();

    assert_eq!(client.transport().last().bearer_token(), None);
}

#[tokio::test]
async fn authenticated_request_carries_current_token() {
    let (session, client) = client(UnauthorizedPolicy::Detect);
    let access = token_for("u1", Some("ADMIN"));
    session.login(&access, "refresh123").unwrap();

    client.execute(ApiRequest::post("/cart/items")).await.unwrap();

    assert_eq!(client.transport().last().bearer_token(), Some(access.as_str()));
}

#[tokio::test]
async fn bearer_tracks_login_relogin_and_logout() {
    let (session, client) = client(UnauthorizedPolicy::Detect);
    let first = token_for("u1", None);
    let second = token_for("u2", None);

    session.login(&first, "r1").unwrap();
    client.execute(ApiRequest::get("/books")).await.unwrap();
    session.login(&second, "r2").unwrap();
    client.execute(ApiRequest::get("/books")).await.unwrap();
    session.logout();
    client.execute(ApiRequest::get("/books")).await.unwrap();

    let tokens: Vec<Option<String>> = client
        .transport()
        .sent()
        .iter()
        .map(|r| r.bearer_token().map(str::to_owned))
        .collect();
    assert_eq!(tokens, vec![Some(first), Some(second), None]);
}

#[tokio::test]
async fn unauthorized_response_is_surfaced() {
    let (session, client) = client(UnauthorizedPolicy::Detect);
    session.login(&token_for("u1", None), "r").unwrap();
    client.transport().respond(401, r#"{"detail":"Token expired"}"#);

    let err = client.execute(ApiRequest::get("/cart")).await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized { path: "/cart".to_owned(), message: "Token expired".to_owned() });
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn unauthorized_with_logout_policy_ends_session() {
    let (session, client) = client(UnauthorizedPolicy::Logout);
    session.login(&token_for("u1", None), "r").unwrap();
    client.transport().respond(401, "");

    assert!(client.execute(ApiRequest::get("/cart")).await.unwrap_err().is_unauthorized());
    assert!(!session.is_authenticated());

    client.execute(ApiRequest::get("/books")).await.unwrap();
    assert_eq!(client.transport().last().bearer_token(), None);
}

#[tokio::test]
async fn http_error_is_surfaced() {
    let (_, client) = client(UnauthorizedPolicy::Detect);
    client.transport().respond(500, "boom");
    let err = client.execute(ApiRequest::get("/books")).await.unwrap_err();
    assert_eq!(err, ApiError::Http { status: 500, message: "boom".to_owned() });
}

#[tokio::test]
async fn network_error_is_surfaced() {
    let (_, client) = client(UnauthorizedPolicy::Detect);
    client.transport().fail(ApiError::Network("connection refused".to_owned()));
    let err = client.execute(ApiRequest::get("/books")).await.unwrap_err();
    assert_eq!(err, ApiError::Network("connection refused".to_owned()));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn request_steps_run_in_order() {
    let client = ApiClient::new(RecordingTransport::new()).with_request_step(Tag("a")).with_request_step(Tag("b"));
    client.execute(ApiRequest::get("/books")).await.unwrap();
    let tags: Vec<String> = client.transport().last().query.into_iter().map(|(_, v)| v).collect();
    assert_eq!(tags, vec!["a", "b"]);
}

#[tokio::test]
async fn rejected_request_is_never_sent() {
    let client = ApiClient::new(RecordingTransport::new()).with_request_step(Reject);
    let err = client.execute(ApiRequest::get("/books")).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert!(client.transport().sent().is_empty());
}

#[tokio::test]
async fn execute_json_decodes_body() {
    let (_, client) = client(UnauthorizedPolicy::Detect);
    client.transport().respond(200, r#"{"ok":true}"#);
    let body: serde_json::Value = client.execute_json(ApiRequest::get("/health")).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn stale_401_does_not_end_newer_session() {
    let (_, store) = memory_store();
    let session = AuthSession::bootstrap(store);
    session.login(&token_for("u1", None), "r1").unwrap();
    let newer = token_for("u2", None);
    let transport = ReloginTransport {
        session: session.clone(),
        access_token: newer.clone(),
        refresh_token: "r2".to_owned(),
        status: 401,
        body: String::new(),
    };
    let client = ApiClient::for_session(transport, &session, UnauthorizedPolicy::Logout);

    let err = client.execute(ApiRequest::get("/cart")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(session.user().map(|u| u.subject), Some("u2".to_owned()));
    assert_eq!(session.credentials().unwrap().access_token, newer);
}
