use axum::{extract::OriginalUri, Extension, Json};
use serde::Serialize;

use crate::api::guard::PageUser;
use crate::db::Role;

#[derive(Debug, Serialize)]
pub struct PageShell {
    pub page: String,
    pub role: Option<Role>,
    pub user_id: Option<String>,
}

/// Role-restricted page shell. The guard has already admitted the viewer.
pub async fn guarded_page(
    OriginalUri(uri): OriginalUri,
    Extension(viewer): Extension<PageUser>,
) -> Json<PageShell> {
    Json(PageShell {
        page: uri.path().to_string(),
        role: Some(viewer.role),
        user_id: Some(viewer.user_id),
    })
}

/// Unguarded landing pages the guard redirects to.
pub async fn public_page(OriginalUri(uri): OriginalUri) -> Json<PageShell> {
    Json(PageShell {
        page: uri.path().to_string(),
        role: None,
        user_id: None,
    })
}
