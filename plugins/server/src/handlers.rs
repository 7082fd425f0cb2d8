//! Concrete handler implementations for the server plugin

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use std::sync::Arc;
use tracing::debug;
use trellis_chatbot::{ChatClient, ChatRequest, ChatbotEndpoint, EndpointTransport};
use trellis_core::error::{Result, TrellisError};
use trellis_editor::{render_chat_panel, EditorCommand, EditorError, SessionManager};
use trellis_site::{
    generate_seo_data, render_chatbot_demo, render_dashboard, render_home, render_public_page,
    render_search_page, NavigationItem, PageMeta, SiteError, SiteServices,
};

use crate::{HandlerRegistry, HttpHandler, HttpRequest, HttpResponse};

/// Everything the HTTP handlers need
#[derive(Clone)]
pub struct AppServices {
    pub chatbot: Arc<ChatbotEndpoint>,
    pub sessions: Arc<SessionManager>,
    pub site: Arc<SiteServices>,
}

/// Register the full set of site builder handlers
pub async fn register_app_handlers(registry: &HandlerRegistry, services: &AppServices) -> Result<()> {
    // One conversation for the demo page, not tied to any block
    let demo_chat = Arc::new(ChatClient::new(
        Arc::new(EndpointTransport::new(services.chatbot.clone())),
        "",
        "",
    ));

    let handlers: Vec<Arc<dyn HttpHandler>> = vec![
        Arc::new(ChatbotHandler::new(services.chatbot.clone())),
        Arc::new(SearchApiHandler::new(services.site.clone())),
        Arc::new(NavigationInfoHandler::new(services.site.clone())),
        Arc::new(NavigationSaveHandler::new(services.site.clone())),
        Arc::new(DeployHandler::new(services.site.clone())),
        Arc::new(PageInfoHandler::new(services.sessions.clone())),
        Arc::new(PageCommandHandler::new(services.sessions.clone())),
        Arc::new(BuilderEditHandler::new(
            services.sessions.clone(),
            services.site.clone(),
        )),
        Arc::new(DashboardHandler::new(services.site.clone())),
        Arc::new(SearchPageHandler::new(services.site.clone())),
        Arc::new(HomePageHandler::new(services.site.clone())),
        Arc::new(ChatbotDemoHandler::new(demo_chat.clone(), services.site.clone())),
        Arc::new(ChatbotDemoMessageHandler::new(demo_chat)),
        Arc::new(PublicPageHandler::new(
            services.sessions.clone(),
            services.site.clone(),
        )),
    ];

    for handler in handlers {
        registry.register_http_handler(handler).await?;
    }

    tracing::info!("Registered site builder handlers");
    Ok(())
}

fn slug_param(request: &HttpRequest) -> Result<&str> {
    request
        .path_param("slug")
        .ok_or_else(|| TrellisError::server(format!("No page slug in {}", request.path)))
}

/// `/api/chatbot`, accepting every method so the endpoint can answer 405 itself
pub struct ChatbotHandler {
    endpoint: Arc<ChatbotEndpoint>,
}

impl ChatbotHandler {
    pub fn new(endpoint: Arc<ChatbotEndpoint>) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl HttpHandler for ChatbotHandler {
    fn path_pattern(&self) -> &str {
        "/api/chatbot"
    }

    fn method(&self) -> Method {
        Method::POST
    }

    fn can_handle(&self, path: &str, _method: &Method) -> bool {
        path == self.path_pattern()
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let reply = self
            .endpoint
            .handle(request.method.as_str(), &request.body)
            .await;
        let status =
            StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::json_with_status(status, &reply.body)
    }
}

/// `GET /api/search?q=...`
pub struct SearchApiHandler {
    site: Arc<SiteServices>,
}

impl SearchApiHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for SearchApiHandler {
    fn path_pattern(&self) -> &str {
        "/api/search"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let query = request.query("q").unwrap_or_default();
        let results = self.site.search(query);
        debug!("Search for {:?} matched {} pages", query, results.len());
        HttpResponse::json(&results)
    }
}

/// `GET /api/navigation`
pub struct NavigationInfoHandler {
    site: Arc<SiteServices>,
}

impl NavigationInfoHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for NavigationInfoHandler {
    fn path_pattern(&self) -> &str {
        "/api/navigation"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        HttpResponse::json(&self.site.navigation().await)
    }
}

/// `POST /api/navigation` with a JSON array of `{title, link}`
pub struct NavigationSaveHandler {
    site: Arc<SiteServices>,
}

impl NavigationSaveHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for NavigationSaveHandler {
    fn path_pattern(&self) -> &str {
        "/api/navigation"
    }

    fn method(&self) -> Method {
        Method::POST
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let items: Vec<NavigationItem> = match serde_json::from_slice(&request.body) {
            Ok(items) => items,
            Err(e) => {
                return Ok(HttpResponse::json_error(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid navigation: {}", e),
                ))
            }
        };

        self.site.save_navigation(&items).await?;
        HttpResponse::json(&items)
    }
}

/// `POST /api/deploy`, answering once the deployment finishes
pub struct DeployHandler {
    site: Arc<SiteServices>,
}

impl DeployHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for DeployHandler {
    fn path_pattern(&self) -> &str {
        "/api/deploy"
    }

    fn method(&self) -> Method {
        Method::POST
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        match self.site.deployer().deploy().await {
            Ok(report) => HttpResponse::json(&report),
            Err(err @ SiteError::DeploymentInProgress) => Ok(HttpResponse::json_error(
                StatusCode::CONFLICT,
                &err.to_string(),
            )),
        }
    }
}

/// `GET /api/pages/:slug`
pub struct PageInfoHandler {
    sessions: Arc<SessionManager>,
}

impl PageInfoHandler {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl HttpHandler for PageInfoHandler {
    fn path_pattern(&self) -> &str {
        "/api/pages/:slug"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let slug = slug_param(&request)?;
        HttpResponse::json(&self.sessions.view(slug).await)
    }
}

/// `POST /api/pages/:slug` with one editor command
pub struct PageCommandHandler {
    sessions: Arc<SessionManager>,
}

impl PageCommandHandler {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl HttpHandler for PageCommandHandler {
    fn path_pattern(&self) -> &str {
        "/api/pages/:slug"
    }

    fn method(&self) -> Method {
        Method::POST
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let slug = slug_param(&request)?;

        let command: EditorCommand = match serde_json::from_slice(&request.body) {
            Ok(command) => command,
            Err(e) => {
                return Ok(HttpResponse::json_error(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid editor command: {}", e),
                ))
            }
        };

        match self.sessions.execute(slug, command).await {
            Ok(view) => HttpResponse::json(&view),
            Err(err) => {
                let status = match err {
                    EditorError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    EditorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                };
                debug!("Rejected command for page {}: {}", slug, err);
                Ok(HttpResponse::json_error(status, &err.to_string()))
            }
        }
    }
}

/// `GET /builder/edit/:slug`: the editor inside the site layout
pub struct BuilderEditHandler {
    sessions: Arc<SessionManager>,
    site: Arc<SiteServices>,
}

impl BuilderEditHandler {
    pub fn new(sessions: Arc<SessionManager>, site: Arc<SiteServices>) -> Self {
        Self { sessions, site }
    }
}

#[async_trait]
impl HttpHandler for BuilderEditHandler {
    fn path_pattern(&self) -> &str {
        "/builder/edit/:slug"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let slug = slug_param(&request)?;
        let title = self.sessions.view(slug).await.editor.title;
        let body = self.sessions.render(slug).await;

        let meta = PageMeta::titled(format!("Editing {} - Site Builder", title));
        Ok(HttpResponse::html(&self.site.render_page(&body, &meta).await))
    }
}

/// `GET /builder`: deployment dashboard
pub struct DashboardHandler {
    site: Arc<SiteServices>,
}

impl DashboardHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for DashboardHandler {
    fn path_pattern(&self) -> &str {
        "/builder"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn matches_path(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.path_pattern()
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        let body = render_dashboard(&self.site.deployer().status());
        let meta = PageMeta {
            title: Some("Builder Dashboard | Self-Hosted Builder".to_string()),
            description: Some("Builder dashboard for the self-hosted website builder".to_string()),
        };
        Ok(HttpResponse::html(&self.site.render_page(&body, &meta).await))
    }
}

/// `GET /search?q=...`
pub struct SearchPageHandler {
    site: Arc<SiteServices>,
}

impl SearchPageHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for SearchPageHandler {
    fn path_pattern(&self) -> &str {
        "/search"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let query = request.query("q").unwrap_or_default();
        let results = self.site.search(query);
        let body = render_search_page(query, &results);

        let meta = PageMeta::from(generate_seo_data(&format!("Search results for {}", query)));
        Ok(HttpResponse::html(&self.site.render_page(&body, &meta).await))
    }
}

/// `GET /`: the home page with links to every entry point
pub struct HomePageHandler {
    site: Arc<SiteServices>,
}

impl HomePageHandler {
    pub fn new(site: Arc<SiteServices>) -> Self {
        Self { site }
    }
}

#[async_trait]
impl HttpHandler for HomePageHandler {
    fn path_pattern(&self) -> &str {
        "/"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        let meta = PageMeta {
            title: Some("Self-Hosted Builder".to_string()),
            description: Some("A self-hosted website builder".to_string()),
        };
        Ok(HttpResponse::html(
            &self.site.render_page(&render_home(), &meta).await,
        ))
    }
}

/// `GET /chatbot-demo`: a chat panel with no block behind it
pub struct ChatbotDemoHandler {
    client: Arc<ChatClient>,
    site: Arc<SiteServices>,
}

impl ChatbotDemoHandler {
    pub fn new(client: Arc<ChatClient>, site: Arc<SiteServices>) -> Self {
        Self { client, site }
    }
}

#[async_trait]
impl HttpHandler for ChatbotDemoHandler {
    fn path_pattern(&self) -> &str {
        "/chatbot-demo"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    async fn handle(&self, _request: HttpRequest) -> Result<HttpResponse> {
        let panel = render_chat_panel(&self.client.snapshot(), "Ask the chatbot something...");
        let meta = PageMeta {
            title: Some("Chatbot Demo | Self-Hosted Builder".to_string()),
            description: Some("Demo of the chatbot component".to_string()),
        };
        Ok(HttpResponse::html(
            &self.site.render_page(&render_chatbot_demo(&panel), &meta).await,
        ))
    }
}

/// `POST /chatbot-demo` with `{"message": ..}`, answering with the chat snapshot
pub struct ChatbotDemoMessageHandler {
    client: Arc<ChatClient>,
}

impl ChatbotDemoMessageHandler {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpHandler for ChatbotDemoMessageHandler {
    fn path_pattern(&self) -> &str {
        "/chatbot-demo"
    }

    fn method(&self) -> Method {
        Method::POST
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let message = match ChatRequest::from_json(&request.body) {
            Ok(chat) => chat.message,
            Err(e) => {
                let status =
                    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
                return HttpResponse::json_with_status(status, &e.to_body());
            }
        };

        if !self.client.send(message).await {
            return Ok(HttpResponse::json_error(
                StatusCode::CONFLICT,
                "A reply is already pending",
            ));
        }
        HttpResponse::json(&self.client.snapshot())
    }
}

/// `GET /:slug`: the public view of a page. Registered last so named routes win.
pub struct PublicPageHandler {
    sessions: Arc<SessionManager>,
    site: Arc<SiteServices>,
}

impl PublicPageHandler {
    pub fn new(sessions: Arc<SessionManager>, site: Arc<SiteServices>) -> Self {
        Self { sessions, site }
    }
}

#[async_trait]
impl HttpHandler for PublicPageHandler {
    fn path_pattern(&self) -> &str {
        "/:slug"
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn priority(&self) -> i32 {
        10
    }

    async fn handle(&self, request: HttpRequest) -> Result<HttpResponse> {
        let slug = slug_param(&request)?;
        let published = self.sessions.published(slug).await;

        let body = render_public_page(
            slug,
            published.as_ref().map(|page| page.title.as_str()),
            published.as_ref().map(|page| page.html.as_str()),
        );
        let meta = PageMeta {
            title: Some(format!("{} | Self-Hosted Builder", slug)),
            description: Some(format!("{} page", slug)),
        };
        Ok(HttpResponse::html(&self.site.render_page(&body, &meta).await))
    }
}
