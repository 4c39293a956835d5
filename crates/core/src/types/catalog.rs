//! Product catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product as listed by `GET products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    /// Units in stock.
    pub amount: i64,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub sale_open_date: Option<String>,
    #[serde(default)]
    pub sale_close_date: Option<String>,
}

impl Product {
    /// Whether any stock is left to put in a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.amount > 0
    }
}

/// A product category option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub price: Price,
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_open_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_close_date: Option<DateTime<Utc>>,
}
