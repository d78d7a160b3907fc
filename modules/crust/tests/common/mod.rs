#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared fixtures for the middleware integration tests.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Extension, Json, Router,
    body::Body,
    http::{Method, Request, Response, StatusCode},
};
use crust::{
    Credential, CredentialVerifier, Crust, CrustConfig, RouteTable, SecurityContext,
    SessionStore, SessionStoreError, VerifyError,
};
use dashmap::DashMap;
use tower::ServiceExt;
use uuid::{Uuid, uuid};

pub const ALICE_ID: Uuid = uuid!("11111111-0000-0000-0000-000000000001");
pub const VALID_TOKEN: &str = "valid-token";
/// Token that makes the verifier report itself unavailable.
pub const OUTAGE_TOKEN: &str = "outage";

pub fn alice() -> SecurityContext {
    SecurityContext::builder()
        .subject_id(ALICE_ID)
        .principal("alice")
        .authorities(vec!["ROLE_USER".to_owned()])
        .build()
}

/// Accepts `VALID_TOKEN` and `alice:secret`.
pub struct TestVerifier;

#[async_trait]
impl CredentialVerifier for TestVerifier {
    async fn verify(&self, credential: Credential<'_>) -> Result<SecurityContext, VerifyError> {
        match credential {
            Credential::Bearer(VALID_TOKEN) => Ok(alice()),
            Credential::Bearer(OUTAGE_TOKEN) => {
                Err(VerifyError::Unavailable("identity provider down".to_owned()))
            }
            Credential::Bearer(_) => Err(VerifyError::Rejected("unknown token".to_owned())),
            Credential::Basic {
                principal: "alice",
                secret: "secret",
            } => Ok(alice()),
            Credential::Basic { .. } => Err(VerifyError::Rejected("bad credentials".to_owned())),
        }
    }
}

#[derive(Default)]
pub struct MemorySessions {
    pub sessions: DashMap<String, SecurityContext>,
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn load(&self, session_id: &str) -> Result<Option<SecurityContext>, SessionStoreError> {
        Ok(self.sessions.get(session_id).map(|s| s.value().clone()))
    }

    async fn save(&self, session_id: &str, ctx: SecurityContext) -> Result<(), SessionStoreError> {
        self.sessions.insert(session_id.to_owned(), ctx);
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}

/// Counts logout hook invocations and remembers who logged out last.
#[derive(Default)]
pub struct InvalidationLog {
    pub calls: AtomicUsize,
    pub last_subject: Mutex<Option<Uuid>>,
}

impl InvalidationLog {
    pub fn hook(self: &Arc<Self>) -> impl Fn(Option<&SecurityContext>) + Send + Sync + 'static {
        let log = Arc::clone(self);
        move |ctx: Option<&SecurityContext>| {
            log.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ctx) = ctx {
                *log.last_subject.lock().unwrap() = Some(ctx.subject_id());
            }
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_subject(&self) -> Option<Uuid> {
        *self.last_subject.lock().unwrap()
    }
}

/// Echo the identity the middleware attached to the request.
pub async fn whoami(Extension(ctx): Extension<SecurityContext>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "anonymous": ctx.is_anonymous(),
        "principal": ctx.principal(),
    }))
}

pub fn routes() -> RouteTable {
    RouteTable::new()
        .route(Method::GET, "/login", whoami)
        .unwrap()
        .anonymous(Method::GET, "/anon/ping", whoami)
        .unwrap()
        .route(Method::GET, "/secure", whoami)
        .unwrap()
        .route(Method::GET, "/public/x", whoami)
        .unwrap()
        .route(Method::GET, "/static/app.js", whoami)
        .unwrap()
        .route(Method::POST, "/static/app.js", whoami)
        .unwrap()
}

pub fn stateless_config() -> CrustConfig {
    serde_json::from_value(serde_json::json!({
        "permit_urls": ["/public/**"],
        "allow_static_urls": ["/static/**"],
    }))
    .unwrap()
}

pub fn session_config() -> CrustConfig {
    serde_json::from_value(serde_json::json!({
        "stateless": false,
        "login_error_url": "/login?error",
        "permit_urls": ["/public/**"],
    }))
    .unwrap()
}

/// Build the app the way a service would: route table, then the Crust stack.
pub fn app(crust: &Crust, table: RouteTable) -> Router {
    crust.apply(table.into_router())
}

pub fn stateless_app() -> Router {
    let table = routes();
    let crust = Crust::builder(stateless_config())
        .verifier(Arc::new(TestVerifier))
        .routes(&table)
        .build()
        .unwrap();
    app(&crust, table)
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

pub async fn send(app: Router, req: Request<Body>) -> Response<Body> {
    app.oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
