//! Server plugin for HTTP handling
//!
//! A fallback router hands every request to the [`HandlerRegistry`], which
//! picks the first registered [`HttpHandler`] whose path pattern and method
//! match. Patterns are either prefixes (`/api/chatbot`) or segment patterns
//! with named captures (`/api/pages/:slug`).

pub mod handlers;

use async_trait::async_trait;
use axum::{
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde::Serialize;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use trellis_core::{
    error::{Result, TrellisError},
    event::{EventBus, SystemEvent},
    plugin::{Plugin, PluginContext, PluginStatus},
};

pub use handlers::{register_app_handlers, AppServices};

/// Largest request body the router reads, enough for base64 image uploads
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// HTTP handler trait for processing HTTP requests
#[async_trait]
pub trait HttpHandler: Send + Sync {
    /// Path pattern this handler matches (e.g. "/api/pages/:slug")
    fn path_pattern(&self) -> &str;

    /// HTTP method this handler supports
    fn method(&self) -> Method;

    /// Handle the HTTP request
    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Handler priority (lower numbers = higher priority)
    fn priority(&self) -> i32 {
        0
    }

    /// Check if this handler can process the given request
    fn can_handle(&self, path: &str, method: &Method) -> bool {
        self.method() == *method && self.matches_path(path)
    }

    fn matches_path(&self, path: &str) -> bool {
        match_path(self.path_pattern(), path).is_some()
    }
}

/// Match `path` against `pattern`, returning the captured `:name` segments.
///
/// Patterns without captures match the path itself and anything below it;
/// `/` only matches the root.
pub fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    if pattern == "/" {
        return (path == "/").then(HashMap::new);
    }

    if !pattern.contains("/:") {
        let nested = path
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        return nested.then(HashMap::new);
    }

    let pattern_segments: Vec<&str> = pattern.trim_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern_segments.iter().zip(path_segments) {
        if let Some(name) = expected.strip_prefix(':') {
            if actual.is_empty() {
                return None;
            }
            params.insert(name.to_string(), actual.to_string());
        } else if *expected != actual {
            return None;
        }
    }
    Some(params)
}

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub path_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: HashMap::new(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_path_param(mut self, name: &str, value: &str) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set response body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set response header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        use axum::http::header::{HeaderName, HeaderValue};
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Create a JSON response
    pub fn json<T: Serialize>(data: &T) -> Result<Self> {
        Self::json_with_status(StatusCode::OK, data)
    }

    /// Create a JSON response with an explicit status
    pub fn json_with_status<T: Serialize>(status: StatusCode, data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data)
            .map_err(|e| TrellisError::Server(format!("JSON serialization failed: {}", e)))?;

        Ok(Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// `{"error": message}` with the given status
    pub fn json_error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body)
    }

    /// Create an HTML response
    pub fn html(content: &str) -> Self {
        Self::new(StatusCode::OK)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(content.as_bytes())
    }

    /// Create a text response
    pub fn text(content: &str) -> Self {
        Self::new(StatusCode::OK)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(content.as_bytes())
    }

    /// Create a plain-text error response
    pub fn error(status: StatusCode, message: &str) -> Self {
        Self::new(status)
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_body(message.as_bytes())
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Registry of HTTP handlers, ordered by priority
pub struct HandlerRegistry {
    http_handlers: RwLock<Vec<Arc<dyn HttpHandler>>>,
    event_bus: Arc<dyn EventBus>,
}

impl HandlerRegistry {
    pub fn new(event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            http_handlers: RwLock::new(Vec::new()),
            event_bus,
        }
    }

    /// Register an HTTP handler
    pub async fn register_http_handler(&self, handler: Arc<dyn HttpHandler>) -> Result<()> {
        let path = handler.path_pattern().to_string();
        let method = handler.method();

        info!("Registering HTTP handler: {} {}", method, path);

        {
            let mut handlers = self.http_handlers.write().await;
            handlers.push(handler);
            // Stable, so equal priorities keep registration order
            handlers.sort_by_key(|h| h.priority());
        }

        if let Err(e) = self
            .event_bus
            .publish_system_event(SystemEvent::handler_registered(
                "http".to_string(),
                format!("{} {}", method, path),
            ))
            .await
        {
            warn!("Failed to publish handler registration event: {}", e);
        }

        Ok(())
    }

    /// Remove every handler registered for `path` and `method`
    pub async fn unregister_http_handler(&self, path: &str, method: &Method) -> Result<()> {
        let mut handlers = self.http_handlers.write().await;
        let before = handlers.len();
        handlers.retain(|h| !(h.path_pattern() == path && h.method() == *method));

        if handlers.len() < before {
            info!("Unregistered HTTP handler: {} {}", method, path);
        } else {
            warn!("No HTTP handler registered for {} {}", method, path);
        }
        Ok(())
    }

    /// Find the handler for a request along with its path captures
    pub async fn find_http_handler(
        &self,
        path: &str,
        method: &Method,
    ) -> Option<(Arc<dyn HttpHandler>, HashMap<String, String>)> {
        let handlers = self.http_handlers.read().await;

        handlers
            .iter()
            .find(|handler| handler.can_handle(path, method))
            .map(|handler| {
                let params = match_path(handler.path_pattern(), path).unwrap_or_default();
                (handler.clone(), params)
            })
    }

    /// List all registered HTTP handlers
    pub async fn list_http_handlers(&self) -> Vec<(String, Method, i32)> {
        let handlers = self.http_handlers.read().await;
        handlers
            .iter()
            .map(|h| (h.path_pattern().to_string(), h.method(), h.priority()))
            .collect()
    }

    /// Clear all handlers
    pub async fn clear_all_handlers(&self) {
        self.http_handlers.write().await.clear();
        info!("Cleared all registered handlers");
    }
}

/// Build the catch-all router over `registry`
pub fn build_router(registry: Arc<HandlerRegistry>, enable_cors: bool) -> Router {
    let router = Router::new().fallback(move |req| {
        let registry = registry.clone();
        async move { handle_http_request(req, registry).await }
    });

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn handle_http_request(req: axum::extract::Request, registry: Arc<HandlerRegistry>) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();
    let headers = req.headers().clone();

    let query_params: HashMap<String, String> = uri
        .query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();

    let declared = headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_BODY_BYTES) {
        warn!("Rejecting {} {}: body exceeds {} bytes", method, path, MAX_BODY_BYTES);
        return payload_too_large();
    }

    let (_parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!("Failed to read request body for {} {}: {}", method, path, e);
            return payload_too_large();
        }
    };

    let Some((handler, path_params)) = registry.find_http_handler(&path, &method).await else {
        tracing::debug!("No handler found for {} {}", method, path);
        return HttpResponse::json_error(StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let request = HttpRequest {
        method: method.clone(),
        path: path.clone(),
        query_params,
        headers,
        body,
        path_params,
    };

    match handler.handle(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!("Handler error for {} {}: {}", method, path, e);
            HttpResponse::json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .into_response()
        }
    }
}

fn payload_too_large() -> Response {
    HttpResponse::json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}

/// Server plugin implementation
pub struct ServerPlugin {
    name: String,
    version: String,
    status: PluginStatus,
    services: AppServices,
    handler_registry: Option<Arc<HandlerRegistry>>,
    local_addr: Option<SocketAddr>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ServerPlugin {
    pub fn new(services: AppServices) -> Self {
        Self {
            name: "server".to_string(),
            version: "0.1.0".to_string(),
            status: PluginStatus::Loading,
            services,
            handler_registry: None,
            local_addr: None,
            server_handle: None,
        }
    }

    pub fn handler_registry(&self) -> Option<Arc<HandlerRegistry>> {
        self.handler_registry.clone()
    }

    /// Address the listener is bound to, once initialized
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

#[async_trait]
impl Plugin for ServerPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn dependencies(&self) -> Vec<&str> {
        vec!["editor", "site"]
    }

    async fn initialize(&mut self, context: &PluginContext) -> Result<()> {
        info!("Initializing server plugin");

        let config = &context.config.server;
        let registry = Arc::new(HandlerRegistry::new(context.event_bus.clone()));
        register_app_handlers(&registry, &self.services).await?;
        self.handler_registry = Some(registry.clone());

        let router = build_router(registry, config.enable_cors);
        let addr = format!("{}:{}", config.hostname, config.port);

        info!("Starting HTTP server on {}", addr);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TrellisError::Server(format!("Failed to bind to {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;
        self.local_addr = Some(local_addr);

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("Server error: {}", e);
            }
        });

        self.server_handle = Some(server_handle);
        self.status = PluginStatus::Active;

        context
            .event_bus
            .publish_system_event(SystemEvent::server_started(local_addr.to_string()))
            .await?;

        info!("Server listening on http://{}", local_addr);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down server plugin");

        self.status = PluginStatus::Shutting;

        if let Some(handle) = self.server_handle.take() {
            handle.abort();
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }

        if let Some(registry) = self.handler_registry.take() {
            registry.clear_all_handlers().await;
        }

        self.local_addr = None;
        self.status = PluginStatus::Stopped;

        info!("Server plugin shutdown complete");
        Ok(())
    }

    fn status(&self) -> PluginStatus {
        self.status.clone()
    }

    fn provided_services(&self) -> Vec<&str> {
        vec!["http_server", "handler_registry"]
    }
}
