//! Cart pricing.
//!
//! Pricing is a pure read of the catalog: it never writes to the ledger or changes stock. The result is the immutable
//! line-item snapshot that an order is later created from.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use spg_common::Money;

use crate::{
    cart::Cart,
    db_types::{LineItem, Product, ProductId},
    spg_api::errors::CheckoutError,
};

/// A priced cart. `total` is always the sum of the line subtotals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedCart {
    pub total: Money,
    pub items: Vec<LineItem>,
}

/// Prices every line of the cart against `catalog`, using the prices in it right now.
///
/// Lines are checked in product-id order, and the first problem found is reported.
pub fn price_cart(cart: &Cart, catalog: &HashMap<ProductId, Product>) -> Result<PricedCart, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let items = cart
        .iter()
        .map(|(product_id, quantity)| {
            let product = catalog.get(product_id).ok_or_else(|| CheckoutError::UnknownProduct(product_id.clone()))?;
            if product.stock < i64::from(quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity,
                    available: product.stock,
                });
            }
            Ok(LineItem {
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity,
                unit_price: product.price,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let total = items.iter().map(LineItem::subtotal).sum();
    Ok(PricedCart { total, items })
}
