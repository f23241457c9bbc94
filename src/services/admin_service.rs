use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{AdminOrderUpdateRequest, OrderList},
    dto::stores::StoreList,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        stores::{Column as StoreCol, Entity as Stores},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder, StoreListQuery},
    services::order_service::{order_from_entity, parse_status},
    services::store_service::store_from_entity,
    state::AppState,
    workflow::validate_transition,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    state.engine.require_admin(Some(&user.actor())).check()?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
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
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Support/correction escape hatch: admins may patch order fields the
/// normal endpoints never expose. A status change still has to be a legal
/// transition, and the write stays conditional on the status we read.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdminOrderUpdateRequest,
) -> AppResult<ApiResponse<Order>> {
    state.engine.require_admin(Some(&user.actor())).check()?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let current = parse_status(&existing.status)?;

    if payload.status.is_none() && payload.total_amount.is_none() {
        return Err(AppError::BadRequest("nothing to update".into()));
    }

    let mut update = Orders::update_many()
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(current.as_str()));

    if let Some(target) = payload.status {
        validate_transition(current, target)?;
        update = update.col_expr(OrderCol::Status, Expr::value(target.as_str()));
    }
    if let Some(total_amount) = payload.total_amount {
        if total_amount < 0 {
            return Err(AppError::BadRequest("total must not be negative".into()));
        }
        update = update.col_expr(OrderCol::TotalAmount, Expr::value(total_amount));
    }

    let result = update.exec(&state.orm).await?;
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
        "admin_order_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

/// Admin listing sees inactive stores too.
pub async fn list_all_stores(
    state: &AppState,
    user: &AuthUser,
    query: StoreListQuery,
) -> AppResult<ApiResponse<StoreList>> {
    state.engine.require_admin(Some(&user.actor())).check()?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(owner_id) = query.owner_id {
        condition = condition.add(StoreCol::OwnerId.eq(owner_id));
    }

    let finder = Stores::find()
        .filter(condition)
        .order_by_desc(StoreCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(store_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Stores", StoreList { items }, Some(meta)))
}
