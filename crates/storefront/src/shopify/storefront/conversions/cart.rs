//! Cart conversions.

use crate::shopify::ShopifyError;
use crate::shopify::types::{Cart, CartCost, CartLine, CartMerchandise};

use super::super::queries::{RawCart, RawCartLine, RawCartPayload, RawUserError};
use super::{convert_image, convert_money};

fn convert_line(line: RawCartLine) -> CartLine {
    let merchandise = line.merchandise;
    let image = merchandise
        .image
        .or(merchandise.product.featured_image)
        .map(convert_image);

    CartLine {
        id: line.id,
        quantity: line.quantity,
        merchandise: CartMerchandise {
            id: merchandise.id,
            title: merchandise.title,
            product_title: merchandise.product.title,
            product_handle: merchandise.product.handle,
            price: convert_money(merchandise.price),
            image,
        },
        total: convert_money(line.cost.total_amount),
    }
}

/// Convert a raw cart.
pub fn convert_cart(cart: RawCart) -> Cart {
    Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
        },
        lines: cart.lines.into_nodes().map(convert_line).collect(),
    }
}

/// Join mutation `userErrors` into one message, or `None` when there are none.
pub fn join_user_errors(errors: &[RawUserError]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }

    Some(
        errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Unwrap a cart mutation payload.
///
/// `userErrors` win over a returned cart; a payload with neither is reported
/// as `failure`.
pub fn cart_from_payload(
    payload: Option<RawCartPayload>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::message(failure));
    };

    if let Some(message) = join_user_errors(&payload.user_errors) {
        return Err(ShopifyError::UserError(message));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::message(failure))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> RawCartPayload {
        serde_json::from_value(json).unwrap()
    }

    fn cart_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/c1",
            "checkoutUrl": "https://sporeline.myshopify.com/cart/c/c1",
            "totalQuantity": 2,
            "cost": {
                "subtotalAmount": { "amount": "58.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "58.0", "currencyCode": "USD" }
            },
            "lines": { "edges": [ { "node": {
                "id": "gid://shopify/CartLine/l1",
                "quantity": 2,
                "cost": { "totalAmount": { "amount": "58.0", "currencyCode": "USD" } },
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/1",
                    "title": "Small",
                    "price": { "amount": "29.0", "currencyCode": "USD" },
                    "image": null,
                    "product": {
                        "title": "Lion's Mane Grow Kit",
                        "handle": "lions-mane-grow-kit",
                        "featuredImage": { "url": "https://cdn.shopify.com/a.jpg", "altText": null, "width": null, "height": null }
                    }
                }
            } } ] }
        })
    }

    #[test]
    fn test_cart_from_payload_success() {
        let cart = cart_from_payload(
            Some(payload(serde_json::json!({ "cart": cart_json(), "userErrors": [] }))),
            "Failed to create cart",
        )
        .unwrap();

        assert_eq!(cart.total_quantity, 2);
        assert_eq!(cart.cost.subtotal.display(), "$58.00");
        let line = &cart.lines[0];
        assert_eq!(line.merchandise.product_handle, "lions-mane-grow-kit");
        // Falls back to the product image when the variant has none
        assert!(line.merchandise.image.is_some());
    }

    #[test]
    fn test_cart_from_payload_user_errors() {
        let err = cart_from_payload(
            Some(payload(serde_json::json!({
                "cart": cart_json(),
                "userErrors": [
                    { "field": ["lines"], "message": "Variant is sold out" },
                    { "field": null, "message": "Quantity exceeds stock" }
                ]
            }))),
            "Failed to add to cart",
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "User error: Variant is sold out; Quantity exceeds stock"
        );
    }

    #[test]
    fn test_cart_from_payload_missing() {
        let err = cart_from_payload(None, "Failed to update cart").unwrap_err();
        assert_eq!(err.to_string(), "GraphQL errors: Failed to update cart");

        let err = cart_from_payload(
            Some(payload(serde_json::json!({ "cart": null, "userErrors": [] }))),
            "Failed to remove from cart",
        )
        .unwrap_err();
        assert!(matches!(err, ShopifyError::GraphQL(_)));
    }
}
