#![cfg(feature = "memory")]

use eatery_repo::memory::InMemoryRepo;
use eatery_types::domain::cart::ItemId;
use eatery_types::domain::money::Money;
use eatery_types::domain::order::{FulfillmentStatus, Order, OrderLine};
use eatery_types::domain::payment::PaymentReference;
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::{InsertOutcome, OrderRepository};
use eatery_types::ports::profile_repository::ProfileRepository;
use uuid::Uuid;

fn paid_order(user_id: Uuid, reference: &str) -> Order {
    Order::paid(
        user_id,
        vec![OrderLine {
            id: ItemId::from("1"),
            name: "Honey Glazed Chicken Medallions".into(),
            price: Money::from_cents(8900),
            quantity: 2,
            customization: None,
        }],
        "12 Loop St".into(),
        PaymentReference::new(reference),
    )
    .unwrap()
}

#[tokio::test]
async fn memory_repo_order_flow() {
    let repo = InMemoryRepo::new();
    let user = Uuid::new_v4();
    let order = paid_order(user, "ref_a");

    let created = repo.insert_if_absent(order.clone()).await.unwrap();
    assert!(created.was_inserted());
    assert_eq!(created.order().id, order.id);

    let fetched = repo.get(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.total, Money::from_cents(17800));

    let by_ref = repo
        .get_by_reference(&PaymentReference::new("ref_a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_ref.id, order.id);

    let updated = repo
        .update_status(order.id, FulfillmentStatus::Preparing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, FulfillmentStatus::Preparing);
}

#[tokio::test]
async fn memory_repo_dedups_by_reference() {
    let repo = InMemoryRepo::new();
    let user = Uuid::new_v4();
    let first = paid_order(user, "ref_same");
    let second = paid_order(user, "ref_same");

    repo.insert_if_absent(first.clone()).await.unwrap();
    let again = repo.insert_if_absent(second).await.unwrap();
    assert_eq!(again, InsertOutcome::Existing(first.clone()));
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn memory_repo_concurrent_inserts_store_one_order() {
    let repo = InMemoryRepo::new();
    let user = Uuid::new_v4();
    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.insert_if_absent(paid_order(user, "ref_race")).await.unwrap()
        }));
    }
    let mut inserted = 0;
    for h in handles {
        if h.await.unwrap().was_inserted() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn memory_repo_lists_per_user_newest_first() {
    let repo = InMemoryRepo::new();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let older = paid_order(alice, "ref_1");
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let newer = paid_order(alice, "ref_2");
    repo.insert_if_absent(older.clone()).await.unwrap();
    repo.insert_if_absent(newer.clone()).await.unwrap();
    repo.insert_if_absent(paid_order(bob, "ref_3")).await.unwrap();

    let mine = repo.list_for_user(alice).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, newer.id);
    assert_eq!(mine[1].id, older.id);
    assert_eq!(repo.list().await.unwrap().len(), 3);
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo
        .get_by_reference(&PaymentReference::new("nope"))
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .update_status(Uuid::new_v4(), FulfillmentStatus::Ready)
        .await
        .unwrap()
        .is_none());
    assert!(repo.set_active(Uuid::new_v4(), false).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_repo_profiles() {
    let repo = InMemoryRepo::new();
    let mut profile = Profile::new(Uuid::new_v4(), "thandi@example.com");
    profile.address = Some("4 Kloof St".into());
    repo.upsert_profile(profile.clone()).await.unwrap();

    let fetched = repo.get_profile(profile.id).await.unwrap().unwrap();
    assert_eq!(fetched.address.as_deref(), Some("4 Kloof St"));

    let deactivated = repo.set_active(profile.id, false).await.unwrap().unwrap();
    assert!(!deactivated.is_active);
    assert_eq!(repo.list_profiles().await.unwrap().len(), 1);
}
