//! Normalizers for the legacy action endpoint
//!
//! The legacy endpoint is spreadsheet-backed: Portuguese column names,
//! numbers that may arrive as strings with decimal commas, and a
//! `success` flag on every envelope.

use serde_json::Value;

use super::fields::{
    array_field, bool_field, has_any, int_field, lookup, num_field, str_field, uint_field,
};
use crate::error::{FetchError, FetchResult};
use crate::models::{
    AdditionGroup, AdditionOption, CanonicalBanner, CanonicalCategory, CanonicalProduct, Catalog,
    CouponResult, DeliveryQuote, ProductAdditions, ReferralResult,
};

/// Field tables: canonical field -> legacy aliases, in priority order
pub mod table {
    pub const SUCCESS: &[&str] = &["success", "sucesso"];
    pub const ERROR: &[&str] = &["error", "erro", "mensagem", "message"];

    pub const PRODUCTS: &[&str] = &["produtos", "products"];
    pub const CATEGORIES: &[&str] = &["categorias", "categories"];
    pub const BANNERS: &[&str] = &["banners"];

    pub const PRODUCT_ID: &[&str] = &["ID_Produto", "ID", "id"];
    pub const PRODUCT_NAME: &[&str] = &["Nome_Produto", "Nome", "name"];
    pub const PRODUCT_DESCRIPTION: &[&str] = &["Descricao", "Descrição", "description"];
    pub const PRODUCT_PRICE: &[&str] = &["Preco_Venda", "Preco", "price"];
    pub const PRODUCT_STOCK: &[&str] = &["Estoque_Atual", "Estoque", "estoque"];
    pub const PRODUCT_CATEGORY: &[&str] = &["Categoria", "category"];
    pub const PRODUCT_IMAGE: &[&str] = &["URL_Imagem", "Imagem", "image_url"];
    pub const PRODUCT_ACTIVE: &[&str] = &["Ativo", "active"];
    pub const PRODUCT_FEATURED: &[&str] = &["Destaque", "featured"];
    pub const PRODUCT_HAS_ADDITIONS: &[&str] = &["Tem_Adicionais", "has_additions"];

    pub const CATEGORY_ID: &[&str] = &["ID_Categoria", "ID", "id"];
    pub const CATEGORY_NAME: &[&str] = &["Nome_Categoria", "Nome", "name"];
    pub const CATEGORY_ICON: &[&str] = &["Icone", "Ícone", "icon"];
    pub const CATEGORY_ORDER: &[&str] = &["Ordem", "order"];

    pub const BANNER_ID: &[&str] = &["ID_Banner", "ID", "id"];
    pub const BANNER_TITLE: &[&str] = &["Titulo", "Título", "title"];
    pub const BANNER_IMAGE: &[&str] = &["URL_Imagem", "Imagem", "image_url"];
    pub const BANNER_LINK: &[&str] = &["Link", "link"];
    pub const BANNER_ACTIVE: &[&str] = &["Ativo", "active"];
    pub const BANNER_ORDER: &[&str] = &["Ordem", "order"];

    pub const VALID: &[&str] = &["valido", "válido", "valid"];
    pub const MESSAGE: &[&str] = &["mensagem", "message"];

    pub const COUPON: &[&str] = &["cupom", "coupon"];
    pub const COUPON_CODE: &[&str] = &["Codigo", "Código", "code"];
    pub const COUPON_TYPE: &[&str] = &["Tipo_Desconto", "Tipo", "discount_type"];
    pub const COUPON_VALUE: &[&str] = &["Valor_Desconto", "Valor", "discount_value"];
    pub const COUPON_MIN_ORDER: &[&str] = &["Valor_Minimo", "Pedido_Minimo", "min_order_value"];

    pub const PRODUCT: &[&str] = &["produto", "product"];
    pub const ADDITIONS: &[&str] = &["adicionais", "additions"];
    pub const GROUP_ID: &[&str] = &["ID_Grupo", "id"];
    pub const GROUP_NAME: &[&str] = &["Nome_Grupo", "Nome", "name"];
    pub const GROUP_MIN: &[&str] = &["Min_Selecao", "Minimo", "min_select"];
    pub const GROUP_MAX: &[&str] = &["Max_Selecao", "Maximo", "max_select"];
    pub const GROUP_REQUIRED: &[&str] = &["Obrigatorio", "Obrigatório", "required"];
    pub const GROUP_OPTIONS: &[&str] = &["Opcoes", "Opções", "options"];
    pub const OPTION_ID: &[&str] = &["ID_Opcao", "id"];
    pub const OPTION_NAME: &[&str] = &["Nome_Opcao", "Nome", "name"];
    pub const OPTION_PRICE: &[&str] = &["Preco_Adicional", "Preco", "price"];
    pub const OPTION_AVAILABLE: &[&str] = &["Disponivel", "Disponível", "available"];

    pub const REFERRER: &[&str] = &["indicador", "Nome_Indicador", "referrer_name"];
    pub const REFERRAL_DISCOUNT: &[&str] = &["desconto_percentual", "Desconto", "discount_percent"];

    pub const DELIVERY_FEE: &[&str] = &["taxa", "Taxa_Entrega", "fee"];
    pub const DELIVERY_ETA: &[&str] = &["prazo_minutos", "Prazo", "eta_minutes"];
    pub const DELIVERY_AVAILABLE: &[&str] = &["disponivel", "atende", "available"];
}

/// Rejects envelopes that are not objects or carry `success: false`
fn check_envelope(body: &Value) -> FetchResult<()> {
    if !body.is_object() {
        return Err(FetchError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    }
    if lookup(body, table::SUCCESS).is_some() && !bool_field(body, table::SUCCESS, false) {
        return Err(FetchError::Backend(str_field(
            body,
            table::ERROR,
            "legacy backend reported failure",
        )));
    }
    Ok(())
}

fn require(body: &Value, aliases: &[&str], what: &str) -> FetchResult<()> {
    if has_any(body, aliases) {
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

/// `getCatalogData` response. `produtos` is required; categories and
/// banners default to empty.
pub fn catalog(body: &Value) -> FetchResult<Catalog> {
    check_envelope(body)?;
    let products = array_field(body, table::PRODUCTS)
        .ok_or_else(|| FetchError::MalformedResponse("missing field: produtos".to_string()))?;

    let mut categories: Vec<CanonicalCategory> = array_field(body, table::CATEGORIES)
        .map(|rows| rows.iter().map(category).collect())
        .unwrap_or_default();
    categories.sort_by_key(|c| c.sort_order);

    let mut banners: Vec<CanonicalBanner> = array_field(body, table::BANNERS)
        .map(|rows| {
            rows.iter()
                .filter(|row| bool_field(row, table::BANNER_ACTIVE, true))
                .map(banner)
                .collect()
        })
        .unwrap_or_default();
    banners.sort_by_key(|b| b.sort_order);

    Ok(Catalog {
        products: products
            .iter()
            .map(product)
            .filter(|p| !p.id.is_empty())
            .collect(),
        categories,
        banners,
    })
}

/// `validateCoupon` response. The coupon details may sit under `cupom` or
/// at the top level.
pub fn coupon(body: &Value, code: &str) -> FetchResult<CouponResult> {
    check_envelope(body)?;
    require(body, table::VALID, "valido")?;

    let valid = bool_field(body, table::VALID, false);
    let details = lookup(body, table::COUPON).unwrap_or(body);
    let message = str_field(body, table::MESSAGE, "");

    if !valid {
        return Ok(CouponResult::invalid(code, message));
    }

    Ok(CouponResult {
        valid,
        code: str_field(details, table::COUPON_CODE, code).to_uppercase(),
        discount_type: super::discount_type(&str_field(details, table::COUPON_TYPE, "")),
        discount_value: num_field(details, table::COUPON_VALUE, 0.0),
        min_order_value: num_field(details, table::COUPON_MIN_ORDER, 0.0),
        message,
    })
}

/// `getProductWithAdditions` response. `produto` must be present; a null
/// product means the id is unknown.
pub fn product_additions(body: &Value, product_id: &str) -> FetchResult<ProductAdditions> {
    check_envelope(body)?;
    require(body, table::PRODUCT, "produto")?;

    let message = str_field(body, table::MESSAGE, "");
    let Some(row) = lookup(body, table::PRODUCT) else {
        return Ok(ProductAdditions::not_found(product_id, message));
    };

    let groups = array_field(body, table::ADDITIONS)
        .map(|rows| rows.iter().map(addition_group).collect())
        .unwrap_or_default();

    Ok(ProductAdditions {
        found: true,
        product_id: product_id.to_string(),
        product: Some(product(row)),
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

/// `validateReferralCode` response
pub fn referral(body: &Value, code: &str) -> FetchResult<ReferralResult> {
    check_envelope(body)?;
    require(body, table::VALID, "valido")?;

    let message = str_field(body, table::MESSAGE, "");
    if !bool_field(body, table::VALID, false) {
        return Ok(ReferralResult::invalid(code, message));
    }

    Ok(ReferralResult {
        valid: true,
        code: code.to_string(),
        referrer_name: str_field(body, table::REFERRER, ""),
        discount_percent: num_field(body, table::REFERRAL_DISCOUNT, 0.0),
        message,
    })
}

/// `calculateDelivery` response. `taxa` is required.
pub fn delivery(body: &Value) -> FetchResult<DeliveryQuote> {
    check_envelope(body)?;
    require(body, table::DELIVERY_FEE, "taxa")?;

    Ok(DeliveryQuote {
        available: bool_field(body, table::DELIVERY_AVAILABLE, true),
        fee: num_field(body, table::DELIVERY_FEE, 0.0),
        eta_minutes: uint_field(body, table::DELIVERY_ETA, 0),
        message: str_field(body, table::MESSAGE, ""),
    })
}
