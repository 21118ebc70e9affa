//! Integration tests for the Signpress site.
//!
//! Each test builds the full application router over the real content
//! directory, a temporary upload directory and a stub mail relay, then drives
//! it in-process with `tower::ServiceExt::oneshot`. No socket is bound and no
//! mail leaves the process.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p signpress-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `pages` - rendered pages, 404s, sitemap, robots and health
//! - `leads` - quote requests and click-to-contact leads
//! - `cart` - cart lines, their documents and the upload quota
//! - `orders` - checkout and the direct order API

#![allow(clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use signpress_site::config::{BusinessConfig, CartConfig, EmailConfig, SiteConfig};
use signpress_site::content::ContentStore;
use signpress_site::middleware::session::SESSION_COOKIE_NAME;
use signpress_site::services::email::EmailService;
use signpress_site::state::AppState;
use tempfile::TempDir;
use tower::ServiceExt;

/// Sender used by every test relay.
pub const MAIL_FROM: &str = "Signpress Website <web@signpress.test>";

/// Business mailbox used by every test relay.
pub const MAIL_TO: &str = "sales@signpress.test";

/// Business WhatsApp number configured for tests.
pub const BUSINESS_WHATSAPP: &str = "+971 50 123 4567";

/// Business phone number configured for tests.
pub const BUSINESS_PHONE: &str = "+971 4 555 0199";

/// Largest response body read by the harness.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

/// How the relay behaves for a test app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Relay {
    /// Every message is accepted and recorded.
    #[default]
    Accepting,
    /// Every message is refused.
    Refusing,
}

/// Knobs a test may turn before the app is built.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub relay: Relay,
    pub blob_quota: u64,
    pub metadata_limit: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        let cart = CartConfig::default();
        Self {
            relay: Relay::default(),
            blob_quota: cart.blob_quota,
            metadata_limit: cart.metadata_limit,
        }
    }
}

/// Path of the site crate's content directory.
#[must_use]
pub fn content_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../site/content")
}

/// Path of the site crate's static directory.
#[must_use]
pub fn static_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../site/static")
}

fn test_config(upload_dir: PathBuf, options: &TestOptions) -> SiteConfig {
    SiteConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "https://signpress.test".to_string(),
        content_dir: content_dir(),
        static_dir: static_dir(),
        cart: CartConfig {
            upload_dir,
            metadata_limit: options.metadata_limit,
            blob_quota: options.blob_quota,
            blob_max_age: Duration::from_secs(60 * 60),
        },
        email: EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 2525,
            smtp_username: "signpress".to_string(),
            smtp_password: SecretString::from("stub-relay-never-dialled"),
            from_address: MAIL_FROM.to_string(),
            to_address: MAIL_TO.to_string(),
        },
        business: BusinessConfig {
            phone: BUSINESS_PHONE.to_string(),
            whatsapp: BUSINESS_WHATSAPP.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A response with its body read.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body as UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", self.text()))
    }

    /// The envelope's `message`, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.json()
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
    }

    /// Value of a response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The application under test plus one visitor's cookie jar.
pub struct TestApp {
    router: Router,
    state: AppState,
    cookie: Mutex<Option<String>>,
    client_ip: AtomicU8,
    uploads: TempDir,
}

impl TestApp {
    /// Build an app with default options.
    pub async fn spawn() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Build an app with `options`.
    pub async fn with_options(options: TestOptions) -> Self {
        let uploads = tempfile::tempdir().expect("create upload dir");
        let config = test_config(uploads.path().join("carts"), &options);

        let content = ContentStore::load(&config.content_dir).expect("load site content");
        let email = match options.relay {
            Relay::Accepting => EmailService::stub(MAIL_FROM, MAIL_TO),
            Relay::Refusing => EmailService::failing_stub(MAIL_FROM, MAIL_TO),
        }
        .expect("build stub relay");

        let state = AppState::new(config, content, email);
        state.blobs().ensure_root().await.expect("create blob root");

        Self {
            router: signpress_site::app(state.clone()),
            state,
            cookie: Mutex::new(None),
            client_ip: AtomicU8::new(1),
            uploads,
        }
    }

    /// Shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Root of the temporary upload directory.
    #[must_use]
    pub fn upload_root(&self) -> &Path {
        self.uploads.path()
    }

    /// Send requests from a different client address from now on.
    pub fn next_client(&self) {
        self.client_ip.fetch_add(1, Ordering::Relaxed);
    }

    /// Forget the session cookie, as a new visitor would.
    pub fn clear_cookies(&self) {
        *self.cookie.lock().expect("cookie jar") = None;
    }

    /// Raw messages the relay accepted.
    pub async fn outbox(&self) -> Vec<String> {
        self.state.email().outbox().await
    }

    /// Send `request` with the visitor's cookie and client address.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        let ip = format!("203.0.113.{}", self.client_ip.load(Ordering::Relaxed));
        request.headers_mut().insert(
            "x-forwarded-for",
            ip.parse().expect("forwarded header"),
        );
        if let Some(cookie) = self.cookie.lock().expect("cookie jar").clone() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().expect("cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(session) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        {
            *self.cookie.lock().expect("cookie jar") = Some(session.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .body(Body::empty())
            .expect("build request");
        self.send(request).await
    }

    /// `POST path` with a JSON body.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request");
        self.send(request).await
    }

    /// `POST path` with a multipart body.
    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("build request");
        self.send(request).await
    }
}

/// Builder for `multipart/form-data` bodies.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("signpress-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a small PDF under `name`.
    #[must_use]
    pub fn pdf(self, name: &str, file_name: &str) -> Self {
        self.file(name, file_name, "application/pdf", b"%PDF-1.4\n%test document\n")
    }

    /// Content type header value and the encoded body.
    #[must_use]
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

/// A cart line form carrying both mandatory documents.
#[must_use]
pub fn cart_line(product: &str, quantity: u32) -> MultipartForm {
    MultipartForm::new()
        .text("product", product)
        .text("quantity", &quantity.to_string())
        .pdf("emirates_id", "emirates-id.pdf")
        .pdf("trade_license", "trade-license.pdf")
}

/// Billing fields accepted by checkout and the order API.
#[must_use]
pub fn billing(form: MultipartForm) -> MultipartForm {
    form.text("full_name", "Aisha Rahman")
        .text("email", "aisha@example.ae")
        .text("phone", "050 123 4567")
        .text("company", "Rahman Trading LLC")
        .text("emirate", "Dubai")
}
