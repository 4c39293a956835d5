//! Order history and checkout payloads.

use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId, WalletId};
use super::price::Price;

/// One row of the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_amount: i64,
    pub total_price: Price,
    #[serde(default)]
    pub updated_at: String,
}

/// One product line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub amount: u32,
    pub price: Price,
}

impl OrderDetailItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// Sum of the line totals of an order.
#[must_use]
pub fn order_total(items: &[OrderDetailItem]) -> Price {
    items.iter().map(OrderDetailItem::line_total).sum()
}

/// A line of `POST orders`. Snake case on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub amount: u32,
    pub product_id: ProductId,
}

/// Body of `POST orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub orders: Vec<OrderLine>,
    pub wallet_id: WalletId,
}
