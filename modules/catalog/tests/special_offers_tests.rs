#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Special offers against an in-memory `SQLite` catalog.

use storefront_catalog::{CatalogError, SpecialOffers};
use storefront_db::{Connection, DbConnConfig, DebugDisplay, Params};

async fn seeded() -> Connection {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".to_owned()),
        ..Default::default()
    };
    let mut conn = Connection::connect(&cfg, DebugDisplay::new(true)).await.unwrap();

    for sql in [
        "CREATE TABLE tbl_products (productID INTEGER PRIMARY KEY, name TEXT NOT NULL, \
         description TEXT, picture TEXT, Price REAL)",
        "CREATE TABLE tbl_special_offers (offerID INTEGER PRIMARY KEY, productID INTEGER)",
        "INSERT INTO tbl_products VALUES \
         (1, 'Lamp', 'Warm light', 'lamp.jpg', 19.9), \
         (2, 'Chair', NULL, 'chair.jpg', 45), \
         (3, 'Desk', 'Oak <solid>', 'desk.jpg', 120.5)",
        "INSERT INTO tbl_special_offers (offerID, productID) VALUES (1, 3), (2, 1), (3, 2)",
    ] {
        conn.execute(sql, Params::new()).await.unwrap();
    }
    conn
}

#[tokio::test]
async fn loads_offers_in_offer_order() {
    let mut conn = seeded().await;

    let offers = SpecialOffers::load(&mut conn, 10).await.unwrap();
    let names: Vec<_> = offers.offers().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["Desk", "Lamp", "Chair"]);

    let chair = &offers.offers()[2];
    assert_eq!(chair.product_id, 2);
    assert_eq!(chair.description, "");
    assert_eq!(chair.picture, "chair.jpg");
}

#[tokio::test]
async fn limit_is_applied() {
    let mut conn = seeded().await;
    let offers = SpecialOffers::load(&mut conn, 2).await.unwrap();
    assert_eq!(offers.len(), 2);
}

#[tokio::test]
async fn rendered_list_escapes_descriptions() {
    let mut conn = seeded().await;
    let html = SpecialOffers::load(&mut conn, 1).await.unwrap().render();

    assert!(html.contains(r#"href="/product/view?id=3""#));
    assert!(html.contains("Oak &lt;solid&gt;"));
    assert!(html.contains(">$120.50</span>"));
}

#[tokio::test]
async fn missing_tables_surface_as_db_error() {
    let cfg = DbConnConfig {
        dsn: Some("sqlite::memory:".to_owned()),
        ..Default::default()
    };
    let mut conn = Connection::connect(&cfg, DebugDisplay::new(true)).await.unwrap();

    let err = SpecialOffers::load(&mut conn, 4).await.unwrap_err();
    assert!(matches!(err, CatalogError::Db(_)));
    assert!(err.to_string().contains("tbl_special_offers"));
}
