//! Blog article and customer conversions.

use crate::shopify::types::{Article, Customer};

use super::super::queries::{RawArticle, RawCustomer};
use super::{convert_image, convert_seo};

/// Convert a raw article.
pub fn convert_article(article: RawArticle) -> Article {
    Article {
        id: article.id,
        handle: article.handle,
        title: article.title,
        excerpt: article.excerpt,
        content_html: article.content_html,
        published_at: article.published_at,
        author_name: article.author.map(|a| a.name),
        image: article.image.map(convert_image),
        tags: article.tags,
        seo: convert_seo(article.seo),
    }
}

/// Convert a raw customer.
pub fn convert_customer(customer: RawCustomer) -> Customer {
    let display_name = if customer.display_name.trim().is_empty() {
        customer.email.clone().unwrap_or_default()
    } else {
        customer.display_name
    };

    Customer {
        id: customer.id,
        email: customer.email,
        first_name: customer.first_name,
        last_name: customer.last_name,
        display_name,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_article() {
        let raw: RawArticle = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Article/9",
            "handle": "sterile-technique",
            "title": "Sterile technique at home",
            "excerpt": null,
            "contentHtml": "<p>Wipe everything down.</p>",
            "publishedAt": "2025-04-02T09:30:00Z",
            "tags": ["guides"],
            "authorV2": { "name": "Morgan" },
            "image": null,
            "seo": { "title": null, "description": "How to avoid contamination." }
        }))
        .unwrap();

        let article = convert_article(raw);
        assert_eq!(article.author_name.as_deref(), Some("Morgan"));
        assert_eq!(
            article.seo.description.as_deref(),
            Some("How to avoid contamination.")
        );
        assert_eq!(article.summary(), "Wipe everything down.");
    }

    #[test]
    fn test_convert_customer_display_name_fallback() {
        let raw: RawCustomer = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Customer/5",
            "email": "grower@example.com",
            "firstName": null,
            "lastName": null,
            "displayName": ""
        }))
        .unwrap();

        assert_eq!(convert_customer(raw).display_name, "grower@example.com");
    }
}
