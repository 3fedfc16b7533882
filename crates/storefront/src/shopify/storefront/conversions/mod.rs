//! Conversions from raw Storefront API responses to domain types.

mod cart;
mod catalog;
mod content;

pub use cart::{cart_from_payload, convert_cart, join_user_errors};
pub use catalog::{
    convert_collection, convert_collection_connection, convert_product,
    convert_product_connection,
};
pub use content::{convert_article, convert_customer};

use crate::shopify::types::{Image, Money, PageInfo, Seo};

use super::queries::{RawImage, RawMoney, RawPageInfo, RawSeo};

fn convert_image(image: RawImage) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

fn convert_money(money: RawMoney) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

fn convert_seo(seo: RawSeo) -> Seo {
    Seo {
        title: seo.title.filter(|t| !t.trim().is_empty()),
        description: seo.description.filter(|d| !d.trim().is_empty()),
    }
}

fn convert_page_info(info: RawPageInfo) -> PageInfo {
    PageInfo {
        has_next_page: info.has_next_page,
        end_cursor: info.end_cursor,
    }
}
