use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request,
    },
    response::Response,
    Router,
};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use basic_auth::{
    build_router,
    user::{BcryptPasswordHasher, InMemoryUserRepository, MIN_BCRYPT_COST},
    AppState, TokenCodec,
};

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
}

pub struct TestAppBuilder {
    secret: Vec<u8>,
    lifetime_hours: u32,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            secret: TEST_SECRET.to_vec(),
            lifetime_hours: 24,
        }
    }

    pub fn with_secret(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    pub fn with_lifetime_hours(mut self, hours: u32) -> Self {
        self.lifetime_hours = hours;
        self
    }

    pub fn build(self) -> TestApp {
        let users = Arc::new(InMemoryUserRepository::new());
        let state = AppState::new(
            users.clone(),
            Arc::new(BcryptPasswordHasher::new(MIN_BCRYPT_COST)),
            TokenCodec::new(&self.secret, "basic-auth", self.lifetime_hours),
        );

        TestApp {
            router: build_router(state.clone()),
            state,
            users,
        }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.send(form_request("/create", username, password)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.send(form_request("/auth", username, password)).await
    }

    /// Registers and logs in, returning the issued session token
    pub async fn signed_in(&self, username: &str, password: &str) -> String {
        self.register(username, password).await;
        let response = self.login(username, password).await;
        cookie_token(&response).expect("login should set the session cookie")
    }

    pub async fn get_protected(&self, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri("/protected");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn get_protected_with_token(&self, token: &str) -> Response {
        self.get_protected(Some(&format!("AuthToken={}", token)))
            .await
    }
}

fn form_request(uri: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            username, password
        )))
        .unwrap()
}

/// Pulls the token out of a response's `Set-Cookie` header
pub fn cookie_token(response: &Response) -> Option<String> {
    let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
    value
        .strip_prefix("AuthToken=")?
        .split(';')
        .next()
        .map(str::to_string)
}

pub async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
