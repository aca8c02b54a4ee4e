use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use axum::{
    Router,
    extract::{Path, State},
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::render::{PageRenderer, SPINWHEEL_PARTIAL};
use super::store::DataStore;
use crate::errors::SiteError;
use crate::path_transform::{FlatMap, flat_map_from_pairs, unflatten};
use crate::site_config::{PageRoute, SiteConfig};

pub const ALL_BLOG_TEMPLATE: &str = "all-blog.hbs";
pub const BLOG_TEMPLATE: &str = "blog.hbs";
pub const ADMIN_CHANGE_TEMPLATE: &str = "admin-change.hbs";
pub const ADMIN_PAGE: &str = "admin.html";

/// Paths owned by the built-in routes; configured pages may not claim them.
const RESERVED_PATHS: &[&str] = &["/", "/blog", "/admin", "/admin-change", "/save", "/health"];

/// `/{slug}` or `/{slug}/` with a lowercase slug.
static SLUG_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([a-z0-9\-]+)/?$").expect("valid slug regex"));

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: SiteConfig,
    pub store: DataStore,
    pub renderer: PageRenderer,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build the state for a site, registering its partials.
    pub async fn load(config: SiteConfig) -> Result<Self, SiteError> {
        let store = DataStore::new(&config);
        let mut renderer = PageRenderer::new();
        let partials = renderer.load_partials(store.templates_dir()).await?;
        if !renderer.has_partial(SPINWHEEL_PARTIAL) {
            tracing::warn!(
                partial = SPINWHEEL_PARTIAL,
                "partial not found, templates including it will fail to render"
            );
        }
        info!(partials, root = %config.root.display(), "site loaded");
        Ok(Self {
            config,
            store,
            renderer,
        })
    }
}

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct SaveTemplateRequest {
    pub template: Option<String>,
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router(pages: &[PageRoute]) -> Router<SharedState> {
    let mut router = Router::new()
        .route("/", get(home))
        .route("/blog", get(blog_index))
        .route("/blog/{*slug}", get(blog_post))
        .route("/admin", get(admin_page))
        .route("/admin-change", get(admin_change_form).post(admin_change_save))
        .route("/save", axum::routing::post(save_template))
        .route("/health", get(health_check));

    let mut claimed: HashSet<&str> = RESERVED_PATHS.iter().copied().collect();
    for page in pages {
        if !page.path.starts_with('/') || page.path.starts_with("/images/") {
            tracing::warn!(path = %page.path, "skipping page with invalid path");
            continue;
        }
        if !claimed.insert(page.path.as_str()) {
            tracing::warn!(path = %page.path, "skipping page whose path is already routed");
            continue;
        }
        let page = page.clone();
        let path = page.path.clone();
        router = router.route(
            &path,
            get(move |State(state): State<SharedState>| {
                let page = page.clone();
                async move { named_page(state, page).await }
            }),
        );
    }

    router
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Decode an `application/x-www-form-urlencoded` body into a flat map.
pub fn decode_form(body: &str) -> Result<FlatMap, SiteError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body)
        .map_err(|e| SiteError::BadRequest(format!("malformed form body: {e}")))?;
    Ok(flat_map_from_pairs(pairs))
}

/// Serialize `data` for embedding in a `<script>` block.
pub fn script_safe_json(data: &Value) -> String {
    data.to_string().replace('<', "\\u003c")
}

async fn render_page(
    state: &AppState,
    template: &str,
    data: &Value,
) -> Result<Html<String>, SiteError> {
    let source = state.store.read_template(template).await?;
    Ok(Html(state.renderer.render(&source, data)?))
}

async fn render_with_site_data(
    state: &AppState,
    template: &str,
) -> Result<Html<String>, SiteError> {
    let data = state.store.load_data().await?;
    render_page(state, template, &data).await
}

async fn render_with_page_data(
    state: &AppState,
    page: &PageRoute,
) -> Result<Html<String>, SiteError> {
    let data = match &page.data {
        Some(file) => state.store.load_data_file(file).await?,
        None => state.store.load_data().await?,
    };
    render_page(state, &page.template, &data).await
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn home(State(state): State<SharedState>) -> Result<Html<String>, SiteError> {
    let source = state.store.read_main_template().await?;
    let data = state.store.load_data().await?;
    Ok(Html(state.renderer.render(&source, &data)?))
}

async fn blog_index(State(state): State<SharedState>) -> Result<Html<String>, SiteError> {
    render_with_site_data(&state, ALL_BLOG_TEMPLATE).await
}

async fn blog_post(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, SiteError> {
    tracing::debug!(%slug, "blog post");
    render_blog_post(&state).await
}

/// Render `blog.hbs` with the site data and a script-safe `dataJSON` copy.
async fn render_blog_post(state: &AppState) -> Result<Html<String>, SiteError> {
    let data = state.store.load_data().await?;
    let embedded = script_safe_json(&data);
    let mut context = match data {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    context.insert("dataJSON".to_string(), Value::String(embedded));
    render_page(state, BLOG_TEMPLATE, &Value::Object(context)).await
}

async fn admin_page(State(state): State<SharedState>) -> Result<Html<String>, SiteError> {
    let bytes = state.store.read_public(ADMIN_PAGE).await?;
    Ok(Html(String::from_utf8_lossy(&bytes).into_owned()))
}

async fn admin_change_form(State(state): State<SharedState>) -> Result<Html<String>, SiteError> {
    render_with_site_data(&state, ADMIN_CHANGE_TEMPLATE).await
}

async fn admin_change_save(
    State(state): State<SharedState>,
    body: String,
) -> Result<&'static str, SiteError> {
    let flat = decode_form(&body)?;
    let document = unflatten(&flat)?;
    state.store.save_data(&document).await?;
    info!(fields = flat.len(), file = %state.store.data_file().display(), "data saved");
    Ok("saved")
}

async fn save_template(
    State(state): State<SharedState>,
    body: String,
) -> Result<&'static str, SiteError> {
    let request: SaveTemplateRequest = if body.trim().is_empty() {
        SaveTemplateRequest::default()
    } else {
        serde_json::from_str(&body)
            .map_err(|e| SiteError::BadRequest(format!("malformed JSON body: {e}")))?
    };
    let template = request
        .template
        .ok_or_else(|| SiteError::BadRequest("missing template".into()))?;
    state.store.save_main_template(&template).await?;
    info!(bytes = template.len(), "main template saved");
    Ok("saved")
}

async fn named_page(state: SharedState, page: PageRoute) -> Response {
    match render_with_page_data(&state, &page).await {
        Ok(html) => html.into_response(),
        Err(e) if page.data.is_some() => {
            error!(error = %e, path = %page.path, "failed to load page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error loading {} page", page.path),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Fallback: slug pages found in the template sections, otherwise 404.
pub async fn slug_page(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
) -> Result<Response, SiteError> {
    let path = uri.path();
    if method != Method::GET {
        return Ok(not_found());
    }
    if path == "/blog/" {
        return Ok(blog_index(State(state)).await?.into_response());
    }
    // Any other `/blog…` path (`/blogpost`, `/blog-news/`) is a post.
    if path.starts_with("/blog") {
        return Ok(render_blog_post(&state).await?.into_response());
    }

    let excluded = ["/images/", "/assets/", "/admin"]
        .iter()
        .any(|prefix| path.starts_with(prefix));
    let Some(slug) = SLUG_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .filter(|_| !excluded)
        .map(|m| m.as_str())
    else {
        return Ok(not_found());
    };

    let Some(found) = state.store.find_template_for_slug(slug).await else {
        return Ok(not_found());
    };
    let source = super::store::read_text(&found.path).await?;
    let data = state.store.load_page_data(&found.section, slug).await?;
    Ok(Html(state.renderer.render(&source, &data)?).into_response())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
