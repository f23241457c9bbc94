use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use storefront_access_api::{
    access::{
        Actor, AuthorizationEngine, Decision, DenyCode, MemoryStore, OrderRecord, StoreRecord,
    },
    dto::auth::Claims,
    models::Role,
    workflow::OrderStatus,
};

const SECRET: &str = "test-secret";

fn engine(store: &MemoryStore) -> AuthorizationEngine<MemoryStore> {
    AuthorizationEngine::new(store.clone(), SECRET)
}

fn user(store: &MemoryStore) -> Actor {
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::User,
    };
    store.insert_actor(actor);
    actor
}

fn admin(store: &MemoryStore) -> Actor {
    let actor = Actor {
        id: Uuid::new_v4(),
        role: Role::Admin,
    };
    store.insert_actor(actor);
    actor
}

fn store_owned_by(store: &MemoryStore, owner: &Actor) -> StoreRecord {
    let record = StoreRecord {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        is_active: true,
    };
    store.insert_store(record);
    record
}

fn order_from(store: &MemoryStore, customer: &Actor, store_ids: &[Uuid]) -> OrderRecord {
    let record = OrderRecord {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        status: OrderStatus::Pending,
        store_ids: store_ids.iter().copied().collect(),
    };
    store.insert_order(record.clone());
    record
}

fn deny_code(decision: Decision) -> DenyCode {
    match decision {
        Decision::Allow => panic!("expected a deny, got allow"),
        Decision::Deny(denial) => denial.code,
    }
}

#[tokio::test]
async fn admin_bypasses_store_and_order_ownership() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let admin = admin(&backing);
    let owner = user(&backing);
    let customer = user(&backing);
    let shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &customer, &[shop.id]);

    let decision = engine
        .require_store_owner(Some(&admin), shop.id)
        .await
        .unwrap();
    assert!(decision.is_allow());

    let decision = engine
        .require_order_access(Some(&admin), order.id)
        .await
        .unwrap();
    assert!(decision.is_allow());

    let decision = engine
        .require_order_manage(Some(&admin), order.id)
        .await
        .unwrap();
    assert!(decision.is_allow());
}

#[tokio::test]
async fn non_owner_is_denied_store_access() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let stranger = user(&backing);
    let shop = store_owned_by(&backing, &owner);

    let decision = engine
        .require_store_owner(Some(&owner), shop.id)
        .await
        .unwrap();
    assert!(decision.is_allow());

    let decision = engine
        .require_store_owner(Some(&stranger), shop.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

#[tokio::test]
async fn customer_can_view_but_not_manage_own_order() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let customer = user(&backing);
    let shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &customer, &[shop.id]);

    let decision = engine
        .require_order_access(Some(&customer), order.id)
        .await
        .unwrap();
    assert!(decision.is_allow());

    // A customer may not drive the status machine on their own order.
    let decision = engine
        .require_order_manage(Some(&customer), order.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

#[tokio::test]
async fn unrelated_user_is_denied_order_access() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let customer = user(&backing);
    let stranger = user(&backing);
    let shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &customer, &[shop.id]);

    let decision = engine
        .require_order_access(Some(&stranger), order.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

// u1 places an order with items from s1 (owned by u2) and s2 (owned by u3).
// Both owners get access; u4, who owns an unrelated store, does not.
#[tokio::test]
async fn every_store_owner_with_an_item_in_the_order_gets_access() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let u1 = user(&backing);
    let u2 = user(&backing);
    let u3 = user(&backing);
    let u4 = user(&backing);
    let s1 = store_owned_by(&backing, &u2);
    let s2 = store_owned_by(&backing, &u3);
    let _unrelated = store_owned_by(&backing, &u4);
    let order = order_from(&backing, &u1, &[s1.id, s2.id]);

    for owner in [&u2, &u3] {
        let decision = engine
            .require_order_access(Some(owner), order.id)
            .await
            .unwrap();
        assert!(decision.is_allow(), "owner {} should see the order", owner.id);

        let decision = engine
            .require_order_manage(Some(owner), order.id)
            .await
            .unwrap();
        assert!(decision.is_allow(), "owner {} should manage the order", owner.id);
    }

    let decision = engine
        .require_order_access(Some(&u4), order.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

#[tokio::test]
async fn missing_resources_deny_with_not_found() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let actor = user(&backing);

    let decision = engine
        .require_store_owner(Some(&actor), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::NotFound);

    let decision = engine
        .require_order_access(Some(&actor), Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::NotFound);
}

#[tokio::test]
async fn anonymous_caller_short_circuits_before_any_lookup() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &owner, &[shop.id]);
    let baseline = backing.lookup_count();

    assert_eq!(
        deny_code(engine.require_authenticated(None)),
        DenyCode::Unauthenticated
    );
    assert_eq!(deny_code(engine.require_admin(None)), DenyCode::Unauthenticated);
    assert_eq!(
        deny_code(engine.require_store_owner(None, shop.id).await.unwrap()),
        DenyCode::Unauthenticated
    );
    assert_eq!(
        deny_code(engine.require_order_access(None, order.id).await.unwrap()),
        DenyCode::Unauthenticated
    );
    assert_eq!(
        deny_code(engine.require_order_manage(None, order.id).await.unwrap()),
        DenyCode::Unauthenticated
    );

    assert_eq!(
        backing.lookup_count(),
        baseline,
        "anonymous checks must not hit the data store"
    );
}

#[tokio::test]
async fn owning_no_stores_is_an_empty_set_not_an_error() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let customer = user(&backing);
    let storeless = user(&backing);
    let shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &customer, &[shop.id]);

    let decision = engine
        .require_order_access(Some(&storeless), order.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

#[tokio::test]
async fn order_referencing_no_stores_denies_everyone_but_admin_and_customer() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let admin = admin(&backing);
    let customer = user(&backing);
    let owner = user(&backing);
    let _shop = store_owned_by(&backing, &owner);
    let order = order_from(&backing, &customer, &[]);

    assert!(engine
        .require_order_access(Some(&admin), order.id)
        .await
        .unwrap()
        .is_allow());
    assert!(engine
        .require_order_access(Some(&customer), order.id)
        .await
        .unwrap()
        .is_allow());
    let decision = engine
        .require_order_access(Some(&owner), order.id)
        .await
        .unwrap();
    assert_eq!(deny_code(decision), DenyCode::Forbidden);
}

#[tokio::test]
async fn identical_inputs_yield_identical_decisions() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let stranger = user(&backing);
    let shop = store_owned_by(&backing, &owner);

    let first = engine
        .require_store_owner(Some(&stranger), shop.id)
        .await
        .unwrap();
    let second = engine
        .require_store_owner(Some(&stranger), shop.id)
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn backend_outage_is_an_error_not_a_deny() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let owner = user(&backing);
    let shop = store_owned_by(&backing, &owner);

    backing.set_failing(true);
    let result = engine.require_store_owner(Some(&owner), shop.id).await;
    assert!(
        result.is_err(),
        "an unreachable backend must not look like a 403"
    );

    backing.set_failing(false);
    let decision = engine
        .require_store_owner(Some(&owner), shop.id)
        .await
        .unwrap();
    assert!(decision.is_allow());
}

fn token_for(id: Uuid, role: &str) -> String {
    let exp = Utc::now() + Duration::hours(1);
    let claims = Claims {
        sub: id.to_string(),
        role: role.to_string(),
        exp: exp.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn authenticate_prefers_the_profile_row_over_token_claims() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let actor = admin(&backing);

    // Stale token still says "user"; the profile row wins.
    let resolved = engine
        .authenticate(&token_for(actor.id, "user"))
        .await
        .unwrap()
        .expect("actor");
    assert_eq!(resolved.role, Role::Admin);
}

#[tokio::test]
async fn authenticate_synthesizes_an_actor_when_the_profile_is_missing() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let id = Uuid::new_v4();

    let resolved = engine
        .authenticate(&token_for(id, "user"))
        .await
        .unwrap()
        .expect("actor");
    assert_eq!(resolved.id, id);
    assert_eq!(resolved.role, Role::User);

    // Unknown role strings in claims degrade to user as well.
    let resolved = engine
        .authenticate(&token_for(id, "superuser"))
        .await
        .unwrap()
        .expect("actor");
    assert_eq!(resolved.role, Role::User);
}

#[tokio::test]
async fn authenticate_resolves_bad_tokens_to_no_actor() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);

    assert!(engine.authenticate("not-a-jwt").await.unwrap().is_none());

    // Wrong signing key.
    let exp = Utc::now() + Duration::hours(1);
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: "user".to_string(),
        exp: exp.timestamp() as usize,
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"other-secret"),
    )
    .unwrap();
    assert!(engine.authenticate(&forged).await.unwrap().is_none());

    // Expired.
    let exp = Utc::now() - Duration::hours(1);
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: "user".to_string(),
        exp: exp.timestamp() as usize,
    };
    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert!(engine.authenticate(&expired).await.unwrap().is_none());
}

#[tokio::test]
async fn store_sets_intersect_not_equal() {
    let backing = MemoryStore::new();
    let engine = engine(&backing);
    let customer = user(&backing);
    let owner = user(&backing);
    let s1 = store_owned_by(&backing, &owner);
    let _s2 = store_owned_by(&backing, &owner);

    // One shared store out of many on each side is enough.
    let other_store = Uuid::new_v4();
    let mut ids: HashSet<Uuid> = HashSet::new();
    ids.insert(s1.id);
    ids.insert(other_store);
    let order = OrderRecord {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        status: OrderStatus::Pending,
        store_ids: ids,
    };
    backing.insert_order(order.clone());

    assert!(engine
        .require_order_manage(Some(&owner), order.id)
        .await
        .unwrap()
        .is_allow());
}
