//! Normalizers for the structured (PostgREST-style) backend
//!
//! Table selects return arrays of snake_case rows; RPCs return either a
//! single object or a one-element array.

use serde_json::Value;

use super::fields::{array_field, bool_field, has_any, int_field, lookup, num_field, str_field, uint_field};
use crate::error::{FetchError, FetchResult};
use crate::models::{
    AdditionGroup, AdditionOption, CanonicalBanner, CanonicalCategory, CanonicalProduct, Catalog,
    CouponResult, DeliveryQuote, ProductAdditions, ReferralResult,
};

/// Field tables: canonical field -> primary column aliases
pub mod table {
    pub const PRODUCT_ID: &[&str] = &["id"];
    pub const PRODUCT_NAME: &[&str] = &["name"];
    pub const PRODUCT_DESCRIPTION: &[&str] = &["description"];
    pub const PRODUCT_PRICE: &[&str] = &["price", "sale_price"];
    pub const PRODUCT_STOCK: &[&str] = &["stock", "stock_quantity"];
    pub const PRODUCT_CATEGORY: &[&str] = &["category_name", "category"];
    pub const PRODUCT_IMAGE: &[&str] = &["image_url"];
    pub const PRODUCT_ACTIVE: &[&str] = &["active", "is_active"];
    pub const PRODUCT_FEATURED: &[&str] = &["featured", "is_featured"];
    pub const PRODUCT_HAS_ADDITIONS: &[&str] = &["has_additions"];

    pub const CATEGORY_ID: &[&str] = &["id"];
    pub const CATEGORY_NAME: &[&str] = &["name"];
    pub const CATEGORY_ICON: &[&str] = &["icon"];
    pub const CATEGORY_ORDER: &[&str] = &["sort_order", "position"];

    pub const BANNER_ID: &[&str] = &["id"];
    pub const BANNER_TITLE: &[&str] = &["title"];
    pub const BANNER_IMAGE: &[&str] = &["image_url"];
    pub const BANNER_LINK: &[&str] = &["link_url", "link"];
    pub const BANNER_ORDER: &[&str] = &["sort_order", "position"];

    pub const VALID: &[&str] = &["valid", "is_valid"];
    pub const MESSAGE: &[&str] = &["message"];
    pub const COUPON_CODE: &[&str] = &["code"];
    pub const COUPON_TYPE: &[&str] = &["discount_type"];
    pub const COUPON_VALUE: &[&str] = &["discount_value"];
    pub const COUPON_MIN_ORDER: &[&str] = &["min_order_value", "minimum_order"];

    pub const PRODUCT: &[&str] = &["product"];
    pub const GROUPS: &[&str] = &["groups", "addition_groups"];
    pub const GROUP_ID: &[&str] = &["id"];
    pub const GROUP_NAME: &[&str] = &["name"];
    pub const GROUP_MIN: &[&str] = &["min_select"];
    pub const GROUP_MAX: &[&str] = &["max_select"];
    pub const GROUP_REQUIRED: &[&str] = &["required", "is_required"];
    pub const GROUP_OPTIONS: &[&str] = &["options"];
    pub const OPTION_ID: &[&str] = &["id"];
    pub const OPTION_NAME: &[&str] = &["name"];
    pub const OPTION_PRICE: &[&str] = &["price"];
    pub const OPTION_AVAILABLE: &[&str] = &["available", "is_available"];

    pub const REFERRER: &[&str] = &["referrer_name"];
    pub const REFERRAL_DISCOUNT: &[&str] = &["discount_percent"];

    pub const DELIVERY_FEE: &[&str] = &["fee", "delivery_fee"];
    pub const DELIVERY_ETA: &[&str] = &["eta_minutes"];
    pub const DELIVERY_AVAILABLE: &[&str] = &["available"];
}

/// Unwraps an RPC result that may arrive as `[row]` or `row`
pub fn single_row(value: &Value) -> FetchResult<&Value> {
    let row = match value {
        Value::Array(rows) => rows.first().ok_or_else(|| {
            FetchError::MalformedResponse("empty RPC result".to_string())
        })?,
        other => other,
    };
    if row.is_object() {
        Ok(row)
    } else {
        Err(FetchError::MalformedResponse(
            "RPC result is not an object".to_string(),
        ))
    }
}

fn rows<'a>(value: &'a Value, what: &str) -> FetchResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| FetchError::MalformedResponse(format!("{} is not an array", what)))
}

fn require(row: &Value, aliases: &[&str], what: &str) -> FetchResult<()> {
    if has_any(row, aliases) {
        Ok(())
    } else {
        Err(FetchError::MalformedResponse(format!("missing field: {}", what)))
    }
}

pub fn product(row: &Value) -> CanonicalProduct {
    CanonicalProduct {
        id: str_field(row, table::PRODUCT_ID, ""),
        name: str_field(row, table::PRODUCT_NAME, ""),
        description: str_field(row, table::PRODUCT_DESCRIPTION, ""),
        price: num_field(row, table::PRODUCT_PRICE, 0.0),
        estoque: int_field(row, table::PRODUCT_STOCK, 0),
        category: str_field(row, table::PRODUCT_CATEGORY, "N/A"),
        image_url: str_field(row, table::PRODUCT_IMAGE, ""),
        active: bool_field(row, table::PRODUCT_ACTIVE, true),
        featured: bool_field(row, table::PRODUCT_FEATURED, false),
        has_additions: bool_field(row, table::PRODUCT_HAS_ADDITIONS, false),
    }
}

pub fn category(row: &Value) -> CanonicalCategory {
    CanonicalCategory {
        id: str_field(row, table::CATEGORY_ID, ""),
        name: str_field(row, table::CATEGORY_NAME, "N/A"),
        icon: str_field(row, table::CATEGORY_ICON, ""),
        sort_order: int_field(row, table::CATEGORY_ORDER, 0),
    }
}

pub fn banner(row: &Value) -> CanonicalBanner {
    CanonicalBanner {
        id: str_field(row, table::BANNER_ID, ""),
        title: str_field(row, table::BANNER_TITLE, ""),
        image_url: str_field(row, table::BANNER_IMAGE, ""),
        link: str_field(row, table::BANNER_LINK, ""),
        sort_order: int_field(row, table::BANNER_ORDER, 0),
    }
}

/// Builds the catalog from the three table selects
pub fn catalog(products: &Value, categories: &Value, banners: &Value) -> FetchResult<Catalog> {
    let mut categories: Vec<CanonicalCategory> =
        rows(categories, "categories")?.iter().map(category).collect();
    categories.sort_by_key(|c| c.sort_order);

    let mut banners: Vec<CanonicalBanner> = rows(banners, "banners")?.iter().map(banner).collect();
    banners.sort_by_key(|b| b.sort_order);

    Ok(Catalog {
        products: rows(products, "products")?
            .iter()
            .map(product)
            .filter(|p| !p.id.is_empty())
            .collect(),
        categories,
        banners,
    })
}

/// `validate_coupon` RPC result
pub fn coupon(value: &Value, code: &str) -> FetchResult<CouponResult> {
    let row = single_row(value)?;
    require(row, table::VALID, "valid")?;

    let message = str_field(row, table::MESSAGE, "");
    if !bool_field(row, table::VALID, false) {
        return Ok(CouponResult::invalid(code, message));
    }

    Ok(CouponResult {
        valid: true,
        code: str_field(row, table::COUPON_CODE, code).to_uppercase(),
        discount_type: super::discount_type(&str_field(row, table::COUPON_TYPE, "")),
        discount_value: num_field(row, table::COUPON_VALUE, 0.0),
        min_order_value: num_field(row, table::COUPON_MIN_ORDER, 0.0),
        message,
    })
}

/// `get_product_with_additions` RPC result
pub fn product_additions(value: &Value, product_id: &str) -> FetchResult<ProductAdditions> {
    let row = single_row(value)?;
    require(row, table::PRODUCT, "product")?;

    let message = str_field(row, table::MESSAGE, "");
    let Some(product_row) = lookup(row, table::PRODUCT) else {
        return Ok(ProductAdditions::not_found(product_id, message));
    };

    let groups = array_field(row, table::GROUPS)
        .map(|rows| rows.iter().map(addition_group).collect())
        .unwrap_or_default();

    Ok(ProductAdditions {
        found: true,
        product_id: product_id.to_string(),
        product: Some(product(product_row)),
        groups,
        message,
    })
}

fn addition_group(row: &Value) -> AdditionGroup {
    let required = bool_field(row, table::GROUP_REQUIRED, false);
    AdditionGroup {
        id: str_field(row, table::GROUP_ID, ""),
        name: str_field(row, table::GROUP_NAME, ""),
        min_select: uint_field(row, table::GROUP_MIN, u32::from(required)),
        max_select: uint_field(row, table::GROUP_MAX, 1),
        required,
        options: array_field(row, table::GROUP_OPTIONS)
            .map(|rows| rows.iter().map(addition_option).collect())
            .unwrap_or_default(),
    }
}

fn addition_option(row: &Value) -> AdditionOption {
    AdditionOption {
        id: str_field(row, table::OPTION_ID, ""),
        name: str_field(row, table::OPTION_NAME, ""),
        price: num_field(row, table::OPTION_PRICE, 0.0),
        available: bool_field(row, table::OPTION_AVAILABLE, true),
    }
}

/// `validate_referral_code` RPC result
pub fn referral(value: &Value, code: &str) -> FetchResult<ReferralResult> {
    let row = single_row(value)?;
    require(row, table::VALID, "valid")?;

    let message = str_field(row, table::MESSAGE, "");
    if !bool_field(row, table::VALID, false) {
        return Ok(ReferralResult::invalid(code, message));
    }

    Ok(ReferralResult {
        valid: true,
        code: code.to_string(),
        referrer_name: str_field(row, table::REFERRER, ""),
        discount_percent: num_field(row, table::REFERRAL_DISCOUNT, 0.0),
        message,
    })
}

/// `calculate_delivery` RPC result
pub fn delivery(value: &Value) -> FetchResult<DeliveryQuote> {
    let row = single_row(value)?;
    require(row, table::DELIVERY_FEE, "fee")?;

    Ok(DeliveryQuote {
        available: bool_field(row, table::DELIVERY_AVAILABLE, true),
        fee: num_field(row, table::DELIVERY_FEE, 0.0),
        eta_minutes: uint_field(row, table::DELIVERY_ETA, 0),
        message: str_field(row, table::MESSAGE, ""),
    })
}
