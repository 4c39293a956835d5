//! Shopping cart kept in the visitor's session.
//!
//! The cart is a plain list of lines keyed by product id. It is stored as a
//! JSON array so the persisted value stays readable.

use serde::{Deserialize, Serialize};

use super::catalog::Product;
use super::id::ProductId;
use super::order::OrderLine;
use super::price::Price;

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Quantity in the cart.
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
}

impl CartItem {
    /// `price × amount`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.amount)
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartItem>);

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Put one unit of `product` in the cart.
    ///
    /// A product already in the cart has its quantity bumped instead of
    /// gaining a second line.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.0.iter_mut().find(|line| line.id == product.id) {
            line.amount = line.amount.saturating_add(1);
            return;
        }

        self.0.push(CartItem {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            amount: 1,
            img_url: product.img_url.clone(),
        });
    }

    /// Drop the line for `id`. Returns whether a line was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.0.len();
        self.0.retain(|line| line.id != id);
        self.0.len() != before
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.0.iter().map(CartItem::line_total).sum()
    }

    /// Number of distinct products, shown on the nav badge.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.0
    }

    /// Lines in the shape `POST orders` expects.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.0
            .iter()
            .map(|line| OrderLine {
                amount: line.amount,
                product_id: line.id,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(id: i64, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price: Price::new(Decimal::new(cents, 2)),
            amount: 5,
            img_url: None,
            sale_open_date: None,
            sale_close_date: None,
        }
    }

    #[test]
    fn test_adding_same_product_increments_amount() {
        let mut cart = Cart::new();
        let mango = product(1, 150);

        cart.add(&mango);
        cart.add(&mango);

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].amount, 2);
    }

    #[test]
    fn test_total_is_price_times_amount() {
        let mut cart = Cart::new();
        let mango = product(1, 150);
        let kiwi = product(2, 75);

        cart.add(&mango);
        cart.add(&mango);
        cart.add(&kiwi);

        assert_eq!(cart.total(), Price::new(Decimal::new(375, 2)));
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_removing_last_item_empties_cart() {
        let mut cart = Cart::new();
        cart.add(&product(1, 100));

        assert!(cart.remove(ProductId::new(1)));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
        assert!(!cart.remove(ProductId::new(1)));
    }

    #[test]
    fn test_stored_as_json_array() {
        let mut cart = Cart::new();
        cart.add(&product(9, 1000));

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "id": 9, "name": "Product 9", "price": 10.0, "amount": 1 }])
        );

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_order_lines() {
        let mut cart = Cart::new();
        cart.add(&product(4, 100));
        cart.add(&product(4, 100));

        let lines = cart.order_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].amount, 2);
        assert_eq!(lines[0].product_id, ProductId::new(4));
    }
}
