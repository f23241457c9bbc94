use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};
use crate::workflow::OrderStatus;

/// Order creation carries only line items. Status is not accepted from the
/// client; every order starts `pending`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Admin escape hatch for support and correction workflows. Status changes
/// still go through the transition table.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminOrderUpdateRequest {
    pub status: Option<OrderStatus>,
    pub total_amount: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
