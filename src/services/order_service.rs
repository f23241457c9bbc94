use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        order_stores::ActiveModel as OrderStoreActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    workflow::{OrderStatus, validate_transition},
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderCol::CustomerId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Place an order. Always created `pending`; each line snapshots the
/// product's price and store id, and the distinct store ids go into the
/// order_stores index in the same transaction.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    struct LineSnapshot {
        product_id: Uuid,
        store_id: Uuid,
        unit_price: i64,
        quantity: i32,
    }

    let mut total_amount: i64 = 0;
    let mut lines: Vec<LineSnapshot> = Vec::with_capacity(payload.items.len());

    for item in &payload.items {
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "product {} not found",
                    item.product_id
                )));
            }
        };

        if product.stock_quantity < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product {}",
                product.id
            )));
        }

        total_amount += product.price * (item.quantity as i64);
        lines.push(LineSnapshot {
            product_id: product.id,
            store_id: product.store_id,
            unit_price: product.price,
            quantity: item.quantity,
        });
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        status: Set(OrderStatus::INITIAL.as_str().into()),
        total_amount: Set(total_amount),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            store_id: Set(line.store_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));

        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(line.quantity),
            )
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(&txn)
            .await?;
    }

    let store_ids: BTreeSet<Uuid> = lines.iter().map(|l| l.store_id).collect();
    for store_id in store_ids {
        OrderStoreActive {
            order_id: Set(order.id),
            store_id: Set(store_id),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order)?,
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

/// Visible to the admin, the customer who placed it, and owners of stores
/// with items in it.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    state
        .engine
        .require_order_access(Some(&user.actor()), id)
        .await?
        .check()?;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Drive the status machine. Only admins and relevant store owners get
/// here (the customer cannot self-transition); the transition table is
/// enforced, and the write is conditional on the status we read so a
/// losing concurrent writer gets a conflict instead of clobbering.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    state
        .engine
        .require_order_manage(Some(&user.actor()), id)
        .await?
        .check()?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let current = parse_status(&existing.status)?;
    validate_transition(current, payload.status)?;

    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(payload.status.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "order status changed concurrently".into(),
        ));
    }

    let updated = Orders::find_by_id(id).one(&state.orm).await?;
    let updated = match updated {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": id,
            "from": current.as_str(),
            "to": payload.status.as_str(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order status updated",
        order_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

pub(crate) fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        customer_id: model.customer_id,
        status: parse_status(&model.status)?,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        store_id: model.store_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
