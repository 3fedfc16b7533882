//! Wishlist route handlers.
//!
//! Handles are stored in the session; product data for the page comes from
//! the cached search catalog, so the page costs no extra upstream request.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::{Wishlist, is_valid_handle};
use crate::routes::Layout;
use crate::routes::products::ProductCard;
use crate::seo::PageMeta;
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCard>,
}

/// Add request body.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub handle: String,
}

/// JSON wishlist response.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub handles: Vec<String>,
    pub count: usize,
}

impl From<&Wishlist> for WishlistResponse {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            handles: wishlist.handles().to_vec(),
            count: wishlist.len(),
        }
    }
}

/// JSON response after a removal.
#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub handles: Vec<String>,
    pub removed: bool,
}

async fn save(wishlist: &Wishlist, session: &Session) -> Result<()> {
    wishlist
        .save(session)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save wishlist: {e}")))
}

/// Display the wishlist page.
#[instrument(skip(state, session, nonce))]
pub async fn show(State(state): State<AppState>, session: Session, nonce: CspNonce) -> Response {
    let wishlist = Wishlist::load(&session).await;

    let products = if wishlist.is_empty() {
        Vec::new()
    } else {
        let catalog = state.search().catalog().await;
        // Keep wishlist order; handles no longer in the catalog are skipped
        wishlist
            .handles()
            .iter()
            .filter_map(|handle| catalog.iter().find(|p| &p.handle == handle))
            .map(ProductCard::from)
            .collect()
    };

    WishlistTemplate {
        layout: Layout::new(
            &state,
            &nonce,
            PageMeta::basic(state.config(), "Wishlist", "/wishlist"),
        ),
        products,
    }
    .into_response()
}

/// Current wishlist as JSON.
#[instrument(skip(session))]
pub async fn api_show(session: Session) -> Json<WishlistResponse> {
    Json((&Wishlist::load(&session).await).into())
}

/// Add a product handle to the wishlist.
#[instrument(skip(session))]
pub async fn api_add(
    session: Session,
    Json(request): Json<AddToWishlistRequest>,
) -> Result<impl IntoResponse> {
    let handle = request.handle.trim();
    if !is_valid_handle(handle) {
        return Err(AppError::BadRequest("Invalid product handle".to_string()));
    }

    let mut wishlist = Wishlist::load(&session).await;
    wishlist.add(handle);
    save(&wishlist, &session).await?;

    Ok((StatusCode::OK, Json(WishlistResponse::from(&wishlist))))
}

/// Remove a product handle from the wishlist.
#[instrument(skip(session))]
pub async fn api_remove(session: Session, Path(handle): Path<String>) -> Result<Json<RemoveResponse>> {
    let mut wishlist = Wishlist::load(&session).await;
    let removed = wishlist.remove(&handle);
    if removed {
        save(&wishlist, &session).await?;
    }

    Ok(Json(RemoveResponse {
        handles: wishlist.handles().to_vec(),
        removed,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::header;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{body_json, body_string, get, json_request, session_cookie, test_app};
    use crate::test_support::product;

    #[tokio::test]
    async fn test_add_then_show_and_remove() {
        let (app, _) = test_app();

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/wishlist", &json!({ "handle": "oyster-kit" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert_eq!(
            body_json(response).await,
            json!({ "handles": ["oyster-kit"], "count": 1 })
        );

        let mut request = get("/api/wishlist");
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(body_json(response).await["count"], 1);

        let mut request = json_request("DELETE", "/api/wishlist/oyster-kit", &json!({}));
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            body_json(response).await,
            json!({ "handles": [], "removed": true })
        );
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_handle() {
        let (app, _) = test_app();
        let response = app
            .oneshot(json_request("POST", "/api/wishlist", &json!({ "handle": "../etc" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_lists_saved_products() {
        let (app, state) = test_app();
        state
            .search()
            .prime(vec![
                product("oyster-kit", "Oyster Grow Kit", "24.00"),
                product("agar-plates", "Agar Plates", "12.00"),
            ])
            .await;

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/wishlist", &json!({ "handle": "agar-plates" })))
            .await
            .unwrap();
        let cookie = session_cookie(&response);

        let mut request = get("/wishlist");
        request
            .headers_mut()
            .insert(header::COOKIE, cookie.parse().unwrap());
        let html = body_string(app.oneshot(request).await.unwrap()).await;
        assert!(html.contains("Agar Plates"));
        assert!(!html.contains("Oyster Grow Kit"));
    }
}
