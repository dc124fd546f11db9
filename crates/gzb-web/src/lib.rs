//! Axum JSON surface over the article read API.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use gzb_core::{CanonicalArticle, Category, CategoryId};
use gzb_ingest::{sanitize_article_html, SanitizeOptions};
use gzb_sync::ArticleService;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

pub const CRATE_NAME: &str = "gzb-web";

pub const DEFAULT_PORT: u16 = 8000;

pub struct AppState {
    pub service: ArticleService,
    pub sanitize: SanitizeOptions,
}

impl AppState {
    pub fn new(service: ArticleService) -> Self {
        Self {
            service,
            sanitize: SanitizeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Response envelope shared by every `/api` route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: None,
        })
        .into_response()
    }

    fn paginated(data: T, pagination: Pagination) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            pagination: Some(pagination),
        })
        .into_response()
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            message: Some(message.into()),
            pagination: None,
        }),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    failure(StatusCode::NOT_FOUND, format!("{what} not found"))
}

fn server_error(err: anyhow::Error) -> Response {
    error!(error = %format!("{err:#}"), "request failed");
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("Server error: {err}"))
}

#[derive(Debug, Deserialize, Default)]
struct ArticlesQuery {
    category: Option<String>,
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ArticleDetail {
    #[serde(flatten)]
    article: CanonicalArticle,
    rendered_content: String,
}

#[derive(Debug, Serialize)]
struct CategorySummary {
    #[serde(flatten)]
    category: &'static Category,
    article_count: usize,
}

#[derive(Debug, Serialize)]
struct CategoryDetail {
    category: &'static Category,
    articles: Vec<CanonicalArticle>,
    account_description: Option<String>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/articles", get(articles_handler))
        .route("/api/articles/{id}", get(article_detail_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/categories/{id}", get(category_detail_handler))
        .route("/api/home", get(home_handler))
        .route("/api/sync", get(sync_handler))
        .route("/healthz", get(health_handler))
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// The service reads snapshot files synchronously, so calls run on the blocking pool.
async fn with_service<T, F>(state: Arc<AppState>, f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> T + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || f(&state)).await?)
}

fn paginate<T>(items: Vec<T>, page: Option<usize>, per_page: Option<usize>) -> (Vec<T>, Pagination) {
    let per_page = per_page.unwrap_or(20).max(1);
    let total = items.len();
    let total_pages = total.max(1).div_ceil(per_page);
    let page = page.unwrap_or(1).clamp(1, total_pages);
    let start = (page - 1) * per_page;
    let rows = items.into_iter().skip(start).take(per_page).collect();
    (
        rows,
        Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    )
}

async fn articles_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticlesQuery>,
) -> Response {
    let category = query.category.clone().filter(|c| !c.is_empty());
    let result = with_service(state, move |s| match category {
        Some(id) => s.service.articles_by_category(&id),
        None => s.service.all_articles().as_ref().clone(),
    })
    .await;
    match result {
        Ok(articles) => {
            let (rows, pagination) = paginate(articles, query.page, query.per_page);
            ApiResponse::paginated(rows, pagination)
        }
        Err(err) => server_error(err),
    }
}

async fn article_detail_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    let result = with_service(state, move |s| {
        s.service.article_by_id(&id).map(|article| {
            let rendered_content = sanitize_article_html(&article.content, &s.sanitize);
            ArticleDetail {
                article,
                rendered_content,
            }
        })
    })
    .await;
    match result {
        Ok(Some(detail)) => ApiResponse::ok(detail),
        Ok(None) => not_found("article"),
        Err(err) => server_error(err),
    }
}

async fn categories_handler(State(state): State<Arc<AppState>>) -> Response {
    let result = with_service(state, |s| {
        s.service
            .categories()
            .into_iter()
            .map(|(category, article_count)| CategorySummary {
                category,
                article_count,
            })
            .collect::<Vec<_>>()
    })
    .await;
    match result {
        Ok(categories) => ApiResponse::ok(categories),
        Err(err) => server_error(err),
    }
}

async fn category_detail_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
) -> Response {
    let Ok(category_id) = id.parse::<CategoryId>() else {
        return not_found("category");
    };
    let result = with_service(state, move |s| CategoryDetail {
        category: category_id.category(),
        articles: s.service.articles_by_category(category_id.as_str()),
        account_description: s.service.account_description(category_id.as_str()),
    })
    .await;
    match result {
        Ok(detail) => ApiResponse::ok(detail),
        Err(err) => server_error(err),
    }
}

async fn home_handler(State(state): State<Arc<AppState>>) -> Response {
    match with_service(state, |s| s.service.home_data()).await {
        Ok(home) => ApiResponse::ok(home),
        Err(err) => server_error(err),
    }
}

async fn sync_handler(State(state): State<Arc<AppState>>) -> Response {
    match with_service(state, |s| s.service.sync_info()).await {
        Ok(info) => ApiResponse::ok(info),
        Err(err) => server_error(err),
    }
}

async fn health_handler() -> &'static str {
    "ok"
}
