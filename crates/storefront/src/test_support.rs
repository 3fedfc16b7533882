//! Fixtures shared by unit tests, plus a local stand-in for the upstream APIs.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::shopify::{
    Article, Collection, Image, Money, PriceRange, Product, ProductVariant, Seo,
};

pub fn money(amount: &str) -> Money {
    Money {
        amount: amount.to_string(),
        currency_code: "USD".to_string(),
    }
}

pub fn image(name: &str) -> Image {
    Image {
        url: format!("https://cdn.shopify.com/s/files/1/0001/{name}.jpg"),
        alt_text: Some(name.replace('-', " ")),
        width: Some(1200),
        height: Some(1200),
    }
}

/// An in-stock, single-variant product.
pub fn product(handle: &str, title: &str, price: &str) -> Product {
    let featured = image(handle);
    Product {
        id: format!("gid://shopify/Product/{}", handle.len()),
        handle: handle.to_string(),
        title: title.to_string(),
        description: String::new(),
        description_html: String::new(),
        product_type: String::new(),
        vendor: "Sporeline".to_string(),
        tags: Vec::new(),
        available_for_sale: true,
        created_at: Some("2025-01-01T00:00:00Z".to_string()),
        updated_at: Some("2025-04-01T00:00:00Z".to_string()),
        price_range: PriceRange {
            min_variant_price: money(price),
            max_variant_price: money(price),
        },
        featured_image: Some(featured.clone()),
        images: vec![featured],
        variants: vec![ProductVariant {
            id: format!("gid://shopify/ProductVariant/{}", handle.len()),
            title: "Default Title".to_string(),
            sku: None,
            available_for_sale: true,
            price: money(price),
            compare_at_price: None,
            selected_options: Vec::new(),
            image: None,
        }],
        seo: Seo::default(),
        rating: None,
    }
}

pub fn collection(handle: &str, title: &str, products: Vec<Product>) -> Collection {
    Collection {
        id: format!("gid://shopify/Collection/{}", handle.len()),
        handle: handle.to_string(),
        title: title.to_string(),
        description: String::new(),
        description_html: String::new(),
        image: Some(image(handle)),
        seo: Seo::default(),
        updated_at: Some("2025-04-02T00:00:00Z".to_string()),
        products,
    }
}

pub fn article(handle: &str, title: &str, published_at: &str) -> Article {
    Article {
        id: format!("gid://shopify/Article/{}", handle.len()),
        handle: handle.to_string(),
        title: title.to_string(),
        excerpt: Some(format!("All about {title}.")),
        content_html: format!("<p>All about {title}.</p>"),
        published_at: published_at.to_string(),
        author_name: Some("Morgan".to_string()),
        image: None,
        tags: Vec::new(),
        seo: Seo::default(),
    }
}

/// Storefront API `Cart` object as the GraphQL endpoint returns it.
pub fn cart_json(id: &str) -> Value {
    json!({
        "id": id,
        "checkoutUrl": format!("https://sporeline-test.myshopify.com/cart/c/{id}"),
        "totalQuantity": 1,
        "cost": {
            "subtotalAmount": { "amount": "24.0", "currencyCode": "USD" },
            "totalAmount": { "amount": "24.0", "currencyCode": "USD" }
        },
        "lines": { "edges": [ { "node": {
            "id": "gid://shopify/CartLine/l1",
            "quantity": 1,
            "cost": { "totalAmount": { "amount": "24.0", "currencyCode": "USD" } },
            "merchandise": {
                "id": "gid://shopify/ProductVariant/1",
                "title": "Default Title",
                "price": { "amount": "24.0", "currencyCode": "USD" },
                "image": null,
                "product": {
                    "title": "Oyster Grow Kit",
                    "handle": "oyster-kit",
                    "featuredImage": null
                }
            }
        } } ] }
    })
}

/// A request received by [`spawn_upstream`].
#[derive(Debug)]
pub struct UpstreamRequest {
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: Value,
}

impl UpstreamRequest {
    /// GraphQL `operationName`, or `""` for non-GraphQL requests.
    pub fn operation(&self) -> &str {
        self.body["operationName"].as_str().unwrap_or_default()
    }
}

/// Canned upstream reply.
#[derive(Debug)]
pub struct UpstreamReply {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: String,
}

impl UpstreamReply {
    pub fn json(body: Value) -> Self {
        Self::status(StatusCode::OK, body.to_string())
    }

    /// GraphQL success envelope around `data`.
    pub fn data(data: Value) -> Self {
        Self::json(json!({ "data": data }))
    }

    pub fn status(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .push((HeaderName::from_static(name), HeaderValue::from_static(value)));
        self
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response();
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Serve `respond` on an ephemeral local port and return its base URL.
///
/// The server runs until the test's runtime shuts down.
pub async fn spawn_upstream<F>(respond: F) -> String
where
    F: Fn(UpstreamRequest) -> UpstreamReply + Clone + Send + Sync + 'static,
{
    let app = Router::new().fallback(move |uri: Uri, headers: HeaderMap, body: Bytes| {
        let respond = respond.clone();
        async move {
            respond(UpstreamRequest {
                path: uri.path().to_string(),
                query: uri.query().unwrap_or_default().to_string(),
                headers,
                body: serde_json::from_slice(&body).unwrap_or(Value::Null),
            })
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
