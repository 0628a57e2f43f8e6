//! Page shells for the dashboard route table.

use crate::models::page::{Page, PageView};
use axum::{
    Json,
    extract::Path,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{MethodRouter, get},
};

/// Every fixed dashboard path and the page it renders.
pub const PAGE_ROUTES: [(&str, Page); 11] = [
    ("/", Page::Main),
    ("/dashboard", Page::Main),
    ("/calendar", Page::Calendar),
    ("/ad-tracking", Page::AdTracking),
    ("/profile", Page::Profile),
    ("/change-password", Page::ChangePassword),
    ("/users", Page::Users),
    ("/history", Page::TaskHistory),
    ("/instagram-dm", Page::InstagramDm),
    ("/newsletter-template", Page::NewsletterTemplate),
    ("/youtube-repurposing", Page::YouTubeRepurposing),
];

/// A `GET` route rendering `page` at `path`.
pub fn page_route<S>(page: Page, path: &'static str) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    get(move || async move { Json(PageView::new(page, path)) })
}

/// GET `/login`
pub async fn login_page() -> Json<PageView> {
    Json(PageView::new(Page::Login, "/login"))
}

/// GET `/shared-docs/{document_id}`
pub async fn shared_document(Path(document_id): Path<String>) -> Json<PageView> {
    let path = format!("/shared-docs/{}", document_id);
    Json(PageView::new(Page::SharedDocument, path).with_param("document_id", document_id))
}

/// Fallback for unmatched paths.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(PageView::new(Page::NotFound, uri.path())),
    )
}
