use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Transaction};

use echosavvy_domain::id::{ProductId, UserId};
use echosavvy_shop::domain::repository::CartRepository;
use echosavvy_shop::infra::db::DbCartRepository;
use echosavvy_shop_schema::cart;

use crate::helpers::test_product;

fn cart_row(quantity: i32) -> cart::Model {
    let now = Utc::now();
    cart::Model {
        id: 7,
        user_id: 4,
        product_id: 36,
        product_name: "Keyboard".to_owned(),
        price: Decimal::new(450_000, 2),
        quantity,
        image_url: "/image/36.png".to_owned(),
        total_amount: Decimal::new(450_000, 2) * Decimal::from(quantity),
        created_at: now,
        updated_at: now,
    }
}

/// Run `add` against a mock connection and return the statements it issued.
async fn add_and_log(quantity: i32) -> Vec<Transaction> {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 7,
                rows_affected: 2,
            }])
            .append_query_results([vec![cart_row(quantity + 1)]])
            .into_connection(),
    );
    let repo = DbCartRepository {
        db: Arc::clone(&db),
    };

    let item = repo
        .add(UserId(4), &test_product(36, "Keyboard", 4500), quantity)
        .await
        .unwrap();
    assert_eq!(item.product_id, ProductId(36));
    drop(repo);

    let Ok(conn) = Arc::try_unwrap(db) else {
        panic!("connection still shared");
    };
    DatabaseConnection::into_transaction_log(conn)
}

#[tokio::test]
async fn should_upsert_cart_line_in_a_single_statement() {
    let log = add_and_log(2).await;

    // The upsert, then the read-back of the line.
    assert_eq!(log.len(), 2);
    let upsert = log[0].statements();
    assert_eq!(upsert.len(), 1);
    assert!(upsert[0].sql.starts_with("INSERT INTO `cart`"));
    assert!(upsert[0].sql.contains("ON DUPLICATE KEY UPDATE"));
    assert!(log[1].statements()[0].sql.starts_with("SELECT"));
}

#[tokio::test]
async fn should_assign_total_before_quantity_on_conflict() {
    let log = add_and_log(2).await;
    let sql = &log[0].statements()[0].sql;

    let (_, updates) = sql.split_once("ON DUPLICATE KEY UPDATE").unwrap();
    let total = updates.find("`total_amount` =").unwrap();
    let quantity = updates.find("`quantity` =").unwrap();
    assert!(
        total < quantity,
        "total_amount must read the old quantity: {updates}"
    );
}

#[tokio::test]
async fn should_cap_quantity_inside_the_upsert() {
    let log = add_and_log(2).await;
    let sql = &log[0].statements()[0].sql;

    let (_, updates) = sql.split_once("ON DUPLICATE KEY UPDATE").unwrap();
    assert_eq!(updates.matches("LEAST(").count(), 2, "{updates}");
    assert!(updates.contains("`quantity` + ?"), "{updates}");
}
