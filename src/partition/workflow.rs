//! Checkout: turning a cart into an immutable order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::order::{CCTransaction, CardDetails, Order, OrderLine, OrderStatus, ShippingType};
use super::PartitionState;
use crate::catalog::EntityCatalog;
use crate::error::{MarketError, Result};
use crate::ids::{AddressId, CartId, CustomerId, OrderRef, PartitionId, Timestamp};

/// Caller-supplied part of a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmBuy {
    pub partition_id: PartitionId,
    pub customer_id: CustomerId,
    pub cart_id: CartId,
    pub card: CardDetails,
    pub ship_type: ShippingType,
    /// Ship somewhere other than the customer's own address.
    #[serde(default)]
    pub shipping_address_id: Option<AddressId>,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Values the coordinator fixes for a checkout: clock, drawn ship date and
/// comment text.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutContext {
    pub now: Timestamp,
    pub ship_date: Timestamp,
    pub comment: String,
}

/// Confirm a purchase inside an already locked partition.
///
/// Lines are priced from the partition's stock at this moment; the order
/// keeps those amounts. Every check that can fail runs before the first
/// mutation, so an error leaves cart, stock and order history untouched.
pub fn confirm_buy(
    state: &mut PartitionState,
    catalog: &EntityCatalog,
    partition_id: PartitionId,
    request: &ConfirmBuy,
    ctx: CheckoutContext,
) -> Result<Arc<Order>> {
    let customer = catalog
        .customer(request.customer_id)?
        .ok_or_else(|| MarketError::not_found("customer", request.customer_id))?;
    let cart = state.carts.cart(request.cart_id)?;
    if cart.is_empty() {
        return Err(MarketError::StateInconsistency(format!(
            "cart {} in partition {partition_id} has no lines",
            cart.id
        )));
    }

    let shipping_address_id = request.shipping_address_id.unwrap_or(customer.address_id);
    let shipping_address = catalog
        .address(shipping_address_id)?
        .ok_or_else(|| MarketError::not_found("address", shipping_address_id))?;

    for line in cart.lines() {
        state.inventory.quantity_after_purchase(line.book_id, line.quantity)?;
    }

    let discount = customer.discount;
    let pricing = cart.pricing_for(&state.inventory, &customer)?;
    let cc = CCTransaction::new(&request.card, pricing.total, ctx.now, shipping_address.country_id)?;

    let lines: Vec<OrderLine> = cart
        .lines()
        .map(|line| OrderLine {
            book_id: line.book_id,
            quantity: line.quantity,
            discount,
            comment: ctx.comment.clone(),
        })
        .collect();

    for line in &lines {
        state.inventory.purchase(line.book_id, line.quantity)?;
    }

    let order = state.orders.insert(Order {
        id: state.orders.next_id(),
        partition_id,
        customer_id: customer.id,
        date: ctx.now,
        sub_total: pricing.sub_total,
        tax: pricing.tax,
        total: pricing.total,
        ship_type: request.ship_type,
        ship_date: ctx.ship_date,
        status: request.status,
        billing_address_id: customer.address_id,
        shipping_address_id,
        cc,
        lines,
    });

    catalog.set_most_recent_order(
        customer.id,
        OrderRef {
            partition_id,
            order_id: order.id,
        },
    )?;
    state.carts.cart_mut(request.cart_id)?.clear();

    info!(
        partition_id,
        order_id = order.id,
        customer_id = customer.id,
        total = order.total,
        lines = order.lines.len(),
        "order confirmed"
    );
    Ok(order)
}
