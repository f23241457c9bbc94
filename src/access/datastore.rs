use std::collections::HashSet;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::{
        order_stores::{Column as OrderStoreCol, Entity as OrderStores},
        orders::Entity as Orders,
        profiles::Entity as Profiles,
        stores::{Column as StoreCol, Entity as Stores},
    },
    models::Role,
    workflow::OrderStatus,
};

/// Principal making a request. Read from the profiles table (or synthesized
/// from token claims when the profile row has not landed yet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Store row as the engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub is_active: bool,
}

/// Order row as the engine sees it. `store_ids` is the precomputed index
/// written at order creation, so access checks never rescan items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub store_ids: HashSet<Uuid>,
}

/// The backing store could not be reached or returned garbage. Maps to a
/// 500-equivalent at the gateway, never to a deny.
#[derive(Debug, Error)]
#[error("data store unavailable")]
pub struct StoreError(#[from] pub anyhow::Error);

/// Read-only capability the engine is constructed with. Production uses
/// [`OrmStore`]; tests use [`super::MemoryStore`].
pub trait DataStore: Send + Sync {
    fn get_actor(&self, id: Uuid) -> impl Future<Output = Result<Option<Actor>, StoreError>> + Send;
    fn get_store(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<StoreRecord>, StoreError>> + Send;
    fn get_order(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<OrderRecord>, StoreError>> + Send;
    fn stores_owned_by(
        &self,
        actor_id: Uuid,
    ) -> impl Future<Output = Result<HashSet<Uuid>, StoreError>> + Send;
}

/// SeaORM-backed store used by the running service.
#[derive(Clone)]
pub struct OrmStore {
    conn: DatabaseConnection,
}

impl OrmStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn upstream(err: sea_orm::DbErr) -> StoreError {
    StoreError(anyhow::Error::new(err))
}

impl DataStore for OrmStore {
    async fn get_actor(&self, id: Uuid) -> Result<Option<Actor>, StoreError> {
        let profile = Profiles::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(upstream)?;
        Ok(profile.map(|p| Actor {
            id: p.id,
            role: Role::from_str_lossy(&p.role),
        }))
    }

    async fn get_store(&self, id: Uuid) -> Result<Option<StoreRecord>, StoreError> {
        let store = Stores::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(upstream)?;
        Ok(store.map(|s| StoreRecord {
            id: s.id,
            owner_id: s.owner_id,
            is_active: s.is_active,
        }))
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        let order = Orders::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(upstream)?;
        let Some(order) = order else {
            return Ok(None);
        };

        let status = order
            .status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError(anyhow::Error::new(e)))?;

        let store_ids: Vec<Uuid> = OrderStores::find()
            .filter(OrderStoreCol::OrderId.eq(order.id))
            .select_only()
            .column(OrderStoreCol::StoreId)
            .into_tuple()
            .all(&self.conn)
            .await
            .map_err(upstream)?;

        Ok(Some(OrderRecord {
            id: order.id,
            customer_id: order.customer_id,
            status,
            store_ids: store_ids.into_iter().collect(),
        }))
    }

    async fn stores_owned_by(&self, actor_id: Uuid) -> Result<HashSet<Uuid>, StoreError> {
        let ids: Vec<Uuid> = Stores::find()
            .filter(StoreCol::OwnerId.eq(actor_id))
            .select_only()
            .column(StoreCol::Id)
            .into_tuple()
            .all(&self.conn)
            .await
            .map_err(upstream)?;
        Ok(ids.into_iter().collect())
    }
}
