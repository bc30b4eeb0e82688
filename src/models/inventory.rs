// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("A quantidade precisa ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// --- 1. Produtos ---
// `stock_quantity` é denormalizado: ninguém aqui o recalcula a partir das movimentações.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub company_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub stock_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewProduct {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    pub code: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub stock_quantity: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductChanges {
    #[validate(length(min = 1, message = "O código é obrigatório."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<Decimal>,
}

/// Busca da página de produtos: nome ou código.
pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    let term = term.trim().to_lowercase();
    products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&term) || p.code.to_lowercase().contains(&term))
        .collect()
}

// --- 2. Movimentações de Estoque ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Transfer,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Purchase,
    Sale,
    Adjustment,
    Transfer,
}

// Relação embutida pela consulta (`product:products(name)` etc.).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StockMovement {
    pub id: Uuid,
    pub company_id: Uuid,
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub location_id: Option<Uuid>,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<NamedRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<NamedRef>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// `company_id` e `created_by` são carimbados a partir da sessão.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewStockMovement {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,

    pub movement_type: MovementType,

    #[validate(custom(function = "validate_positive"))]
    pub quantity: Decimal,

    pub reference_type: ReferenceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
