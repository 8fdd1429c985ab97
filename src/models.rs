//! Canonical data models
//!
//! Backend-agnostic shapes produced by the normalizers. Caches only ever hold
//! these types; backend field names stop at `crate::normalize`.

use serde::{Deserialize, Serialize};

/// A sellable product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Units currently in stock
    pub estoque: i64,
    pub category: String,
    pub image_url: String,
    pub active: bool,
    pub featured: bool,
    /// Whether the product offers customization groups
    pub has_additions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCategory {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBanner {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub link: String,
    pub sort_order: i64,
}

/// Everything the storefront home needs in one resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub products: Vec<CanonicalProduct>,
    pub categories: Vec<CanonicalCategory>,
    pub banners: Vec<CanonicalBanner>,
}

impl Catalog {
    pub fn product(&self, id: &str) -> Option<&CanonicalProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Active products whose category matches, ignoring case
    pub fn products_in_category(&self, category: &str) -> Vec<CanonicalProduct> {
        let wanted = category.trim().to_lowercase();
        self.products
            .iter()
            .filter(|p| p.active && p.category.to_lowercase() == wanted)
            .cloned()
            .collect()
    }
}

/// Coupon check as submitted from the checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CouponRequest {
    pub code: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
    FreeShipping,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CouponResult {
    pub valid: bool,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_value: f64,
    pub message: String,
}

impl CouponResult {
    /// Error-shaped result for a code that could not be validated
    pub fn invalid(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            code: code.into(),
            discount_type: DiscountType::None,
            discount_value: 0.0,
            min_order_value: 0.0,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionOption {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub available: bool,
}

/// One customization group ("choose up to 3 toppings")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionGroup {
    pub id: String,
    pub name: String,
    pub min_select: u32,
    pub max_select: u32,
    pub required: bool,
    pub options: Vec<AdditionOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductAdditions {
    pub found: bool,
    pub product_id: String,
    pub product: Option<CanonicalProduct>,
    pub groups: Vec<AdditionGroup>,
    pub message: String,
}

impl ProductAdditions {
    pub fn not_found(product_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            found: false,
            product_id: product_id.into(),
            product: None,
            groups: Vec::new(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralResult {
    pub valid: bool,
    pub code: String,
    pub referrer_name: String,
    pub discount_percent: f64,
    pub message: String,
}

impl ReferralResult {
    pub fn invalid(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            code: code.into(),
            referrer_name: String::new(),
            discount_percent: 0.0,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub neighborhood: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub subtotal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuote {
    pub available: bool,
    pub fee: f64,
    pub eta_minutes: u32,
    pub message: String,
}
