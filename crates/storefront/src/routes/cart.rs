//! Cart route handlers.
//!
//! The cart lives on the platform; the visitor's session only holds its ID.
//! The page renders server-side and the JSON endpoints back the add-to-cart
//! buttons and quantity controls.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use sporeline_core::ShopifyGid;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::CspNonce;
use crate::models::session_keys;
use crate::routes::Layout;
use crate::seo::PageMeta;
use crate::shopify::{Cart, CartLine, CartLineInput, CartLineUpdateInput, ShopifyError};
use crate::state::AppState;

/// Largest quantity accepted for one line.
pub const MAX_LINE_QUANTITY: i64 = 99;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: i64,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            handle: merchandise.product_handle.clone(),
            title: merchandise.product_title.clone(),
            variant_title: (merchandise.title != "Default Title").then(|| merchandise.title.clone()),
            quantity: line.quantity,
            price: merchandise.price.display(),
            line_price: line.total.display(),
            image_url: merchandise.image.as_ref().map(|img| img.url.clone()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: i64,
}

impl CartView {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: "$0.00".to_string(),
            item_count: 0,
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemView::from).collect(),
            subtotal: cart.cost.subtotal.display(),
            item_count: cart.total_quantity,
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn get_cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

async fn set_cart_id(session: &Session, cart_id: &str) -> Result<()> {
    session
        .insert(session_keys::CART_ID, cart_id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save cart ID: {e}")))
}

/// Current cart, or `None` when the session has none or it no longer exists.
async fn current_cart(state: &AppState, session: &Session) -> Result<Option<Cart>> {
    let Some(cart_id) = get_cart_id(session).await else {
        return Ok(None);
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => Ok(Some(cart)),
        Err(ShopifyError::NotFound(_)) => {
            tracing::info!(cart_id = %cart_id, "Session cart no longer exists");
            if let Err(e) = session.remove::<String>(session_keys::CART_ID).await {
                tracing::warn!(error = %e, "Failed to drop stale cart ID");
            }
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Add lines, creating a cart when there is none or the stored one is gone.
async fn add_lines(
    state: &AppState,
    cart_id: Option<String>,
    lines: Vec<CartLineInput>,
) -> std::result::Result<Cart, ShopifyError> {
    let storefront = state.storefront();
    let Some(cart_id) = cart_id else {
        return storefront.create_cart(lines).await;
    };

    match storefront.add_to_cart(&cart_id, lines.clone()).await {
        Ok(cart) => Ok(cart),
        Err(e @ (ShopifyError::UserError(_) | ShopifyError::NotFound(_))) => {
            match storefront.get_cart(&cart_id).await {
                Err(ShopifyError::NotFound(_)) => {
                    tracing::info!(cart_id = %cart_id, "Replacing stale cart");
                    storefront.create_cart(lines).await
                }
                _ => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub variant_id: String,
    pub quantity: Option<i64>,
}

/// Quantity change request body. A quantity of 0 removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub line_id: String,
    pub quantity: i64,
}

/// Line removal request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub line_id: String,
}

/// JSON cart response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart: Option<Cart>,
    pub item_count: i64,
}

impl From<Option<Cart>> for CartResponse {
    fn from(cart: Option<Cart>) -> Self {
        Self {
            item_count: cart.as_ref().map_or(0, |c| c.total_quantity),
            cart,
        }
    }
}

fn validate_variant_id(variant_id: &str) -> Result<()> {
    match ShopifyGid::parse(variant_id) {
        Ok(gid) if gid.resource() == "ProductVariant" => Ok(()),
        _ => Err(AppError::BadRequest("Invalid variant id".to_string())),
    }
}

fn validate_quantity(quantity: i64, min: i64) -> Result<()> {
    if (min..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Quantity must be between {min} and {MAX_LINE_QUANTITY}"
        )))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Display the cart page.
#[instrument(skip(state, session, nonce))]
pub async fn show(State(state): State<AppState>, session: Session, nonce: CspNonce) -> Response {
    let cart = match current_cart(&state, &session).await {
        Ok(Some(cart)) => CartView::from(&cart),
        Ok(None) => CartView::empty(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            CartView::empty()
        }
    };

    CartShowTemplate {
        layout: Layout::new(&state, &nonce, PageMeta::basic(state.config(), "Your cart", "/cart")),
        cart,
    }
    .into_response()
}

/// Current cart as JSON.
#[instrument(skip(state, session))]
pub async fn api_show(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    Ok(Json(current_cart(&state, &session).await?.into()))
}

/// Add a variant to the cart, creating the cart if needed.
#[instrument(skip(state, session))]
pub async fn api_add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    validate_variant_id(&request.variant_id)?;
    let quantity = request.quantity.unwrap_or(1);
    validate_quantity(quantity, 1)?;

    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[("variant_id", request.variant_id.as_str())]),
    );

    let lines = vec![CartLineInput {
        merchandise_id: request.variant_id,
        quantity,
    }];
    let cart = add_lines(&state, get_cart_id(&session).await, lines).await?;
    set_cart_id(&session, &cart.id).await?;

    Ok(Json(Some(cart).into()))
}

/// Change the quantity of a cart line.
#[instrument(skip(state, session))]
pub async fn api_update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartResponse>> {
    validate_quantity(request.quantity, 0)?;
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::NotFound("No cart".to_string()))?;

    let cart = state
        .storefront()
        .update_cart(
            &cart_id,
            vec![CartLineUpdateInput {
                id: request.line_id,
                quantity: request.quantity,
            }],
        )
        .await?;

    Ok(Json(Some(cart).into()))
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn api_remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartResponse>> {
    let cart_id = get_cart_id(&session)
        .await
        .ok_or_else(|| AppError::NotFound("No cart".to_string()))?;

    let cart = state
        .storefront()
        .remove_from_cart(&cart_id, vec![request.line_id])
        .await?;

    Ok(Json(Some(cart).into()))
}

/// Redirect to the platform checkout, or back to the cart when it is empty.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    match current_cart(&state, &session).await {
        Ok(Some(cart)) if !cart.is_empty() => Redirect::to(&cart.checkout_url).into_response(),
        Ok(_) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to get cart for checkout");
            Redirect::to("/cart").into_response()
        }
    }
}
