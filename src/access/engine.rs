use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, models::Role};

use super::{
    datastore::{Actor, DataStore, StoreError},
    decision::{Decision, DenyCode},
};

/// Evaluates (actor, action, resource) triples against role, ownership,
/// and relationship data read through the injected [`DataStore`].
///
/// Check ordering is uniform: authentication, then resource existence,
/// then admin bypass, then ownership, then relationship membership. The
/// engine never mutates anything, so identical inputs over unchanged
/// backing data always produce identical decisions.
#[derive(Clone)]
pub struct AuthorizationEngine<S> {
    store: S,
    jwt_secret: String,
}

impl<S: DataStore> AuthorizationEngine<S> {
    pub fn new(store: S, jwt_secret: impl Into<String>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Validate a bearer token and resolve the actor behind it.
    ///
    /// Token problems (malformed, bad signature, expired, unparseable
    /// subject) all resolve to `None`; downstream checks then deny with
    /// 401. A token that verifies but has no profile row yet gets a
    /// minimal actor synthesized from its claims, since profile creation
    /// is eventually consistent with signup.
    pub async fn authenticate(&self, token: &str) -> Result<Option<Actor>, StoreError> {
        let decoded = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => data,
            Err(_) => return Ok(None),
        };

        let Ok(actor_id) = Uuid::parse_str(&decoded.claims.sub) else {
            return Ok(None);
        };

        match self.store.get_actor(actor_id).await? {
            Some(actor) => Ok(Some(actor)),
            None => Ok(Some(Actor {
                id: actor_id,
                role: Role::from_str_lossy(&decoded.claims.role),
            })),
        }
    }

    /// Presence check. Performs no store lookup.
    pub fn require_authenticated(&self, actor: Option<&Actor>) -> Decision {
        match actor {
            Some(_) => Decision::Allow,
            None => Decision::deny(DenyCode::Unauthenticated, "authentication required"),
        }
    }

    pub fn require_admin(&self, actor: Option<&Actor>) -> Decision {
        let Some(actor) = actor else {
            return Decision::deny(DenyCode::Unauthenticated, "authentication required");
        };
        if actor.is_admin() {
            Decision::Allow
        } else {
            Decision::deny(DenyCode::Forbidden, "admin access required")
        }
    }

    /// Admins may manage any store; otherwise the store's `owner_id` must
    /// match the actor.
    pub async fn require_store_owner(
        &self,
        actor: Option<&Actor>,
        store_id: Uuid,
    ) -> Result<Decision, StoreError> {
        let Some(actor) = actor else {
            return Ok(Decision::deny(
                DenyCode::Unauthenticated,
                "authentication required",
            ));
        };

        let Some(store) = self.store.get_store(store_id).await? else {
            return Ok(Decision::deny(DenyCode::NotFound, "store not found"));
        };

        if actor.is_admin() {
            return Ok(Decision::Allow);
        }
        if store.owner_id == actor.id {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::deny(DenyCode::Forbidden, "not the store owner"))
        }
    }

    /// View access to an order: the admin, the customer who placed it, or
    /// any owner of a store with at least one item in it.
    pub async fn require_order_access(
        &self,
        actor: Option<&Actor>,
        order_id: Uuid,
    ) -> Result<Decision, StoreError> {
        let Some(actor) = actor else {
            return Ok(Decision::deny(
                DenyCode::Unauthenticated,
                "authentication required",
            ));
        };

        let Some(order) = self.store.get_order(order_id).await? else {
            return Ok(Decision::deny(DenyCode::NotFound, "order not found"));
        };

        if actor.is_admin() {
            return Ok(Decision::Allow);
        }
        if order.customer_id == actor.id {
            return Ok(Decision::Allow);
        }
        if self.owns_store_in(actor, &order.store_ids).await? {
            return Ok(Decision::Allow);
        }
        Ok(Decision::deny(DenyCode::Forbidden, "no access to this order"))
    }

    /// Manage access to an order: admins and relevant store owners only.
    /// The customer relationship does not grant it, so a customer cannot
    /// drive their own order through the status machine.
    pub async fn require_order_manage(
        &self,
        actor: Option<&Actor>,
        order_id: Uuid,
    ) -> Result<Decision, StoreError> {
        let Some(actor) = actor else {
            return Ok(Decision::deny(
                DenyCode::Unauthenticated,
                "authentication required",
            ));
        };

        let Some(order) = self.store.get_order(order_id).await? else {
            return Ok(Decision::deny(DenyCode::NotFound, "order not found"));
        };

        if actor.is_admin() {
            return Ok(Decision::Allow);
        }
        if self.owns_store_in(actor, &order.store_ids).await? {
            return Ok(Decision::Allow);
        }
        Ok(Decision::deny(
            DenyCode::Forbidden,
            "only a store owner or admin may manage this order",
        ))
    }

    /// Relationship-membership check: does the actor own any store in the
    /// given set? An actor with zero stores and an order referencing zero
    /// stores are both ordinary empty-set cases, not errors.
    async fn owns_store_in(
        &self,
        actor: &Actor,
        store_ids: &std::collections::HashSet<Uuid>,
    ) -> Result<bool, StoreError> {
        if store_ids.is_empty() {
            return Ok(false);
        }
        let owned = self.store.stores_owned_by(actor.id).await?;
        Ok(!owned.is_disjoint(store_ids))
    }
}
