use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::stores::{CreateStoreRequest, StoreList, UpdateStoreRequest},
    entity::{
        order_stores::{Column as OrderStoreCol, Entity as OrderStores},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        stores::{ActiveModel as StoreActive, Column as StoreCol, Entity as Stores, Model as StoreModel},
    },
    dto::orders::OrderList,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Store,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder, StoreListQuery},
    services::order_service::order_from_entity,
    state::AppState,
};

pub async fn list_stores(
    state: &AppState,
    query: StoreListQuery,
) -> AppResult<ApiResponse<StoreList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(StoreCol::IsActive.eq(true));
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

pub async fn get_store(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Store>> {
    let store = Stores::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(store_from_entity);
    let store = match store {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Store", store, None))
}

/// Any authenticated profile may open a store and becomes its owner.
pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    let store = StoreActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        name: Set(payload.name),
        description: Set(payload.description),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "store_create",
        Some("stores"),
        Some(serde_json::json!({ "store_id": store.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store created",
        store_from_entity(store),
        Some(Meta::empty()),
    ))
}

pub async fn update_store(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    state
        .engine
        .require_store_owner(Some(&user.actor()), id)
        .await?
        .check()?;

    let existing = Stores::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active: StoreActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let store = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "store_update",
        Some("stores"),
        Some(serde_json::json!({ "store_id": store.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store updated",
        store_from_entity(store),
        Some(Meta::empty()),
    ))
}

/// Deletion is blocked while the store still has products; the catalog has
/// to be emptied (or the store deactivated) first.
pub async fn delete_store(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state
        .engine
        .require_store_owner(Some(&user.actor()), id)
        .await?
        .check()?;

    let product_count = Products::find()
        .filter(ProdCol::StoreId.eq(id))
        .count(&state.orm)
        .await?;
    if product_count > 0 {
        return Err(AppError::Conflict(
            "store still has products".to_string(),
        ));
    }

    let result = Stores::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "store_delete",
        Some("stores"),
        Some(serde_json::json!({ "store_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Store deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Orders that contain at least one of this store's products, resolved
/// through the order_stores index.
pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    state
        .engine
        .require_store_owner(Some(&user.actor()), id)
        .await?
        .check()?;

    let (page, limit, offset) = query.pagination.normalize();

    let order_ids: Vec<Uuid> = OrderStores::find()
        .filter(OrderStoreCol::StoreId.eq(id))
        .select_only()
        .column(OrderStoreCol::OrderId)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut condition = Condition::all().add(OrderCol::Id.is_in(order_ids));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub(crate) fn store_from_entity(model: StoreModel) -> Store {
    Store {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
