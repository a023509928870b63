mod common;

use cart_reconciler::{
    CartReconciler, CatalogService, InMemoryUnitOfWork, Missing, NewProduct, ServiceError,
    StoreError,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{setup_tracing, user, TEST_USER};

fn catalog() -> (InMemoryUnitOfWork, CatalogService<InMemoryUnitOfWork>) {
    setup_tracing();
    let uow = InMemoryUnitOfWork::new();
    (uow.clone(), CatalogService::new(uow))
}

fn new_product(name: &str, category_id: Option<Uuid>) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: String::new(),
        price: dec!(12.34),
        category_id,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_category_lifecycle() {
    let (_, catalog) = catalog();

    let electronics = catalog
        .create_category("Electronics")
        .await
        .expect("Failed to create category");
    catalog.create_category("Books").await.expect("Failed to create category");

    let listed = catalog.list_categories().await.expect("Failed to list");
    let descriptions: Vec<_> = listed.iter().map(|c| c.description.as_str()).collect();
    assert_eq!(descriptions, ["Books", "Electronics"]);

    let mut renamed = electronics.clone();
    renamed.description = "Updated Electronics".to_string();
    catalog
        .update_category(electronics.id, renamed)
        .await
        .expect("Failed to update category");
    let fetched = catalog.get_category(electronics.id).await.expect("get");
    assert_eq!(fetched.description, "Updated Electronics");

    catalog.delete_category(electronics.id).await.expect("Failed to delete");
    let err = catalog
        .get_category(electronics.id)
        .await
        .expect_err("Deleted category");
    assert_eq!(err.missing(), Some(&Missing::Category(electronics.id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_category_validation() {
    let (_, catalog) = catalog();

    let err = catalog.create_category("   ").await.expect_err("Blank description");
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = catalog
        .create_category(&"x".repeat(201))
        .await
        .expect_err("Description too long");
    assert!(matches!(err, ServiceError::Validation(_)));

    let category = catalog.create_category("Garden").await.expect("create");
    let err = catalog
        .update_category(Uuid::new_v4(), category)
        .await
        .expect_err("Id mismatch");
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "ID mismatch"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_product_crud_and_category_filter() {
    let (_, catalog) = catalog();
    let toys = catalog.create_category("Toys").await.expect("create category");

    let yoyo = catalog
        .create_product(new_product("Yo-yo", Some(toys.id)))
        .await
        .expect("Failed to create product");
    let kite = catalog
        .create_product(new_product("Kite", Some(toys.id)))
        .await
        .expect("Failed to create product");
    catalog
        .create_product(new_product("Loose screw", None))
        .await
        .expect("Failed to create product");

    assert_eq!(catalog.list_products().await.expect("list").len(), 3);

    let in_toys = catalog
        .list_products_by_category(toys.id)
        .await
        .expect("Failed to list by category");
    assert_eq!(in_toys, vec![kite.clone(), yoyo.clone()]);

    let mut cheaper = yoyo.clone();
    cheaper.price = dec!(2.00);
    catalog
        .update_product(yoyo.id, cheaper)
        .await
        .expect("Failed to update product");
    assert_eq!(catalog.get_product(yoyo.id).await.expect("get").price, dec!(2.00));

    catalog.delete_product(kite.id).await.expect("Failed to delete product");
    let err = catalog.delete_product(kite.id).await.expect_err("Already deleted");
    assert_eq!(err.missing(), Some(&Missing::Product(kite.id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_product_validation() {
    let (_, catalog) = catalog();

    let err = catalog
        .create_product(new_product("Orphan", Some(Uuid::new_v4())))
        .await
        .expect_err("Unknown category");
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "Specified category does not exist"));

    let mut negative = new_product("Refund", None);
    negative.price = dec!(-1);
    let err = catalog.create_product(negative).await.expect_err("Negative price");
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = catalog
        .create_product(new_product("", None))
        .await
        .expect_err("Missing name");
    assert!(matches!(err, ServiceError::Validation(_)));

    let product = catalog
        .create_product(new_product("Lamp", None))
        .await
        .expect("create");
    let err = catalog
        .update_product(Uuid::new_v4(), product.clone())
        .await
        .expect_err("Id mismatch");
    assert!(matches!(err, ServiceError::Validation(ref m) if m == "ID mismatch"));

    let mut ghost = product;
    ghost.id = Uuid::new_v4();
    let err = catalog
        .update_product(ghost.id, ghost.clone())
        .await
        .expect_err("Unknown product");
    assert_eq!(err.missing(), Some(&Missing::Product(ghost.id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_referenced_rows_cannot_be_deleted() {
    let (uow, catalog) = catalog();
    let carts = CartReconciler::new(uow.clone());
    let kitchen = catalog.create_category("Kitchen").await.expect("create category");
    let kettle = catalog
        .create_product(new_product("Kettle", Some(kitchen.id)))
        .await
        .expect("create product");

    let err = catalog
        .delete_category(kitchen.id)
        .await
        .expect_err("Category is referenced by a product");
    assert!(matches!(
        err,
        ServiceError::Persistence(StoreError::ConstraintViolation(_))
    ));

    carts
        .add_to_cart(&user(TEST_USER), kettle.id)
        .await
        .expect("add");
    let err = catalog
        .delete_product(kettle.id)
        .await
        .expect_err("Product is referenced by a cart item");
    assert!(matches!(
        err,
        ServiceError::Persistence(StoreError::ConstraintViolation(_))
    ));
    assert!(catalog.get_product(kettle.id).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_padded_text_is_trimmed_before_length_checks() {
    let (_, catalog) = catalog();

    let mut padded = new_product(&format!("{}{}", " ".repeat(10), "a".repeat(100)), None);
    padded.description = format!("   {}   ", "d".repeat(200));
    let created = catalog
        .create_product(padded)
        .await
        .expect("Name fits once trimmed");
    assert_eq!(created.name, "a".repeat(100));
    assert_eq!(created.description, "d".repeat(200));
    let stored = catalog.get_product(created.id).await.expect("get");
    assert_eq!(stored.name.chars().count(), 100);

    let err = catalog
        .create_product(new_product(&format!("  {}  ", "a".repeat(101)), None))
        .await
        .expect_err("Name too long after trimming");
    assert!(matches!(err, ServiceError::Validation(_)));

    let mut renamed = stored.clone();
    renamed.name = format!("{}  ", "b".repeat(100));
    let updated = catalog
        .update_product(stored.id, renamed)
        .await
        .expect("Update with padded name");
    assert_eq!(updated.name, "b".repeat(100));
    assert_eq!(catalog.get_product(stored.id).await.expect("get").name, "b".repeat(100));

    let category = catalog.create_category("Outdoor").await.expect("create");
    let mut padded_category = category.clone();
    padded_category.description = format!("   {}   ", "c".repeat(200));
    let updated = catalog
        .update_category(category.id, padded_category)
        .await
        .expect("Update with padded description");
    assert_eq!(updated.description, "c".repeat(200));
    let fetched = catalog.get_category(category.id).await.expect("get");
    assert_eq!(fetched.description, "c".repeat(200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_price_must_fit_the_price_column() {
    let (_, catalog) = catalog();

    let mut largest = new_product("Yacht", None);
    largest.price = dec!(9999999999999999.99);
    let yacht = catalog.create_product(largest).await.expect("Largest price fits");

    let mut too_large = new_product("Island", None);
    too_large.price = dec!(10000000000000000);
    let err = catalog.create_product(too_large).await.expect_err("Price overflows NUMERIC(18,2)");
    assert!(matches!(err, ServiceError::Validation(_)));

    let mut repriced = yacht.clone();
    repriced.price = dec!(1000000000000000000);
    let err = catalog
        .update_product(yacht.id, repriced)
        .await
        .expect_err("Update price overflows NUMERIC(18,2)");
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(
        catalog.get_product(yacht.id).await.expect("get").price,
        dec!(9999999999999999.99)
    );
}
