#![cfg(feature = "sqlite")]

use eatery_repo::sqlite::SqliteRepo;
use eatery_types::domain::cart::{Customization, Extra, ItemId};
use eatery_types::domain::money::Money;
use eatery_types::domain::order::{FulfillmentStatus, Order, OrderLine};
use eatery_types::domain::payment::{PaymentReference, PaymentStatus};
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::OrderRepository;
use eatery_types::ports::profile_repository::ProfileRepository;
use std::path::PathBuf;
use uuid::Uuid;

fn temp_db_url() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut path = PathBuf::from(dir.path());
    path.push(format!("eatery-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (dir, url)
}

fn paid_order(user_id: Uuid, reference: &str) -> Order {
    Order::paid(
        user_id,
        vec![OrderLine {
            id: ItemId::from("4"),
            name: "Crispy Mozzarella Sticks".into(),
            price: Money::from_cents(6900),
            quantity: 1,
            customization: Some(Customization {
                sides: vec!["Tomato Dip".into()],
                extras: vec![Extra {
                    name: "Extra Dip".into(),
                    price: Money::from_cents(800),
                }],
                ..Default::default()
            }),
        }],
        "9 Bree St".into(),
        PaymentReference::new(reference),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_repo_order_flow() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let user = Uuid::new_v4();
    let order = paid_order(user, "ref_sql");

    let created = repo.insert_if_absent(order.clone()).await.unwrap();
    assert!(created.was_inserted());

    let fetched = repo.get(order.id).await.unwrap().unwrap();
    assert_eq!(fetched.items, order.items);
    assert_eq!(fetched.total, Money::from_cents(7700));
    assert_eq!(fetched.payment_status, PaymentStatus::Paid);
    assert_eq!(fetched.status, FulfillmentStatus::Pending);

    let mine = repo.list_for_user(user).await.unwrap();
    assert_eq!(mine.len(), 1);

    let updated = repo
        .update_status(order.id, FulfillmentStatus::Ready)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, FulfillmentStatus::Ready);
}

#[tokio::test]
async fn sqlite_repo_dedups_by_reference() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let user = Uuid::new_v4();
    let first = paid_order(user, "ref_twice");

    repo.insert_if_absent(first.clone()).await.unwrap();
    let again = repo
        .insert_if_absent(paid_order(user, "ref_twice"))
        .await
        .unwrap();
    assert!(!again.was_inserted());
    assert_eq!(again.order().id, first.id);
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_repo_handles_missing_rows() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let missing_id = Uuid::new_v4();

    assert!(repo.get(missing_id).await.unwrap().is_none());
    assert!(repo
        .update_status(missing_id, FulfillmentStatus::Ready)
        .await
        .unwrap()
        .is_none());
    assert!(repo.get_profile(missing_id).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_repo_profiles_upsert_and_toggle() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let mut profile = Profile::new(Uuid::new_v4(), "sipho@example.com");
    repo.upsert_profile(profile.clone()).await.unwrap();

    profile.address = Some("21 Long St".into());
    repo.upsert_profile(profile.clone()).await.unwrap();
    let fetched = repo.get_profile(profile.id).await.unwrap().unwrap();
    assert_eq!(fetched.address.as_deref(), Some("21 Long St"));

    let toggled = repo.set_active(profile.id, false).await.unwrap().unwrap();
    assert!(!toggled.is_active);
    assert_eq!(repo.list_profiles().await.unwrap().len(), 1);
}
