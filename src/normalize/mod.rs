//! Response normalization
//!
//! Maps each backend's native payloads into the canonical models. One
//! function per (backend, resource) pair, each driven by an explicit field
//! table, so backend vocabulary never leaves this module.

pub mod fields;
pub mod legacy;
pub mod primary;

use crate::models::DiscountType;

/// Canonical discount type for the spellings both backends use
pub fn discount_type(raw: &str) -> DiscountType {
    match raw.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
        "percentual" | "porcentagem" | "percentage" | "percent" | "%" => DiscountType::Percentage,
        "fixo" | "valor" | "valor_fixo" | "fixed" | "amount" => DiscountType::Fixed,
        "frete_gratis" | "frete_grátis" | "free_shipping" => DiscountType::FreeShipping,
        _ => DiscountType::None,
    }
}

/// Key normalization for codes typed by customers
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
