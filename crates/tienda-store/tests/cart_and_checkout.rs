mod support;

use std::sync::Arc;
use support::{open_store, product, qty, register};
use tienda_model::{Money, ProductId};
use tienda_store::StoreError;

#[test]
fn adding_merges_lines_and_captures_price() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1999, 5);

    store.add_to_cart(user.id, shirt.id, qty(2)).expect("add");
    let cart = store.add_to_cart(user.id, shirt.id, qty(1)).expect("add again");

    assert_eq!(cart.items.len(), 1);
    let line = &cart.items[0];
    assert_eq!(line.quantity.get(), 3);
    assert_eq!(line.unit_price.cents(), 1999);
    assert_eq!(line.name.as_deref(), Some("Camisa"));
    assert_eq!(line.stock, Some(5));
    assert_eq!(cart.total.cents(), 5997);
}

#[test]
fn cart_refuses_lines_whose_total_overflows() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let cheap = product(&store, "Calcetines", 1000, 10);
    let pricey = product(&store, "Yate", 4_000_000_000_000_000_000, 10);

    store.add_to_cart(user.id, cheap.id, qty(1)).expect("add cheap");
    let cart = store.add_to_cart(user.id, pricey.id, qty(1)).expect("add pricey");
    assert_eq!(cart.total.cents(), 4_000_000_000_000_001_000);

    let err = store
        .add_to_cart(user.id, pricey.id, qty(2))
        .expect_err("combined line overflows");
    assert_eq!(err, StoreError::Invalid("cart total overflows".to_string()));
    let err = store
        .update_cart_item(user.id, pricey.id, qty(5))
        .expect_err("updated line overflows");
    assert_eq!(err, StoreError::Invalid("cart total overflows".to_string()));

    let cart = store.cart_for_user(user.id).expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.items[1].quantity.get(), 1);
    assert_eq!(cart.total.cents(), 4_000_000_000_000_001_000);
}

#[test]
fn adding_beyond_stock_is_rejected() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1000, 3);

    let err = store.add_to_cart(user.id, shirt.id, qty(4)).expect_err("over stock");
    assert!(matches!(err, StoreError::InsufficientStock(_)));

    store.add_to_cart(user.id, shirt.id, qty(2)).expect("add");
    let err = store.add_to_cart(user.id, shirt.id, qty(2)).expect_err("combined over stock");
    assert_eq!(
        err,
        StoreError::InsufficientStock("combined quantity exceeds available stock".to_string())
    );

    let err = store
        .add_to_cart(user.id, ProductId(999), qty(1))
        .expect_err("unknown product");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn update_replaces_quantity_and_requires_existing_line() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1000, 10);

    let err = store
        .update_cart_item(user.id, shirt.id, qty(2))
        .expect_err("no line yet");
    assert_eq!(err, StoreError::NotFound("cart item not found".to_string()));

    store.add_to_cart(user.id, shirt.id, qty(5)).expect("add");
    let cart = store.update_cart_item(user.id, shirt.id, qty(2)).expect("update");
    assert_eq!(cart.items[0].quantity.get(), 2);

    let err = store
        .update_cart_item(user.id, shirt.id, qty(11))
        .expect_err("over stock");
    assert!(matches!(err, StoreError::InsufficientStock(_)));
}

#[test]
fn removing_is_idempotent() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1000, 10);
    store.add_to_cart(user.id, shirt.id, qty(1)).expect("add");

    let cart = store.remove_cart_item(user.id, shirt.id).expect("remove");
    assert!(cart.is_empty());
    let cart = store.remove_cart_item(user.id, shirt.id).expect("remove again");
    assert!(cart.is_empty());
    assert_eq!(cart.total, Money::ZERO);
}

#[test]
fn checkout_records_sale_decrements_stock_and_clears_cart() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1999, 5);
    let cap = product(&store, "Gorra", 500, 2);
    store.add_to_cart(user.id, shirt.id, qty(2)).expect("add shirt");
    store.add_to_cart(user.id, cap.id, qty(2)).expect("add cap");

    // Price changes after adding do not affect the captured price.
    let mut repriced = support::draft("Camisa", 2500, 5);
    repriced.description = None;
    store.update_product(shirt.id, &repriced).expect("reprice");

    let sale = store.checkout(user.id).expect("checkout");
    assert_eq!(sale.user_id, Some(user.id));
    assert_eq!(sale.client_id, None);
    assert_eq!(sale.items.len(), 2);
    assert_eq!(sale.total.cents(), 2 * 1999 + 2 * 500);
    assert_eq!(sale.items[0].unit_price.cents(), 1999);

    let shirt_after = store.product_by_id(shirt.id).expect("load").expect("shirt");
    let cap_after = store.product_by_id(cap.id).expect("load").expect("cap");
    assert_eq!(shirt_after.stock, 3);
    assert_eq!(cap_after.stock, 0);
    assert!(store.cart_for_user(user.id).expect("cart").is_empty());

    let sales = store.list_sales().expect("sales");
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id, sale.id);
    assert_eq!(sales[0].items.len(), 2);
}

#[test]
fn checkout_with_empty_cart_fails() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    assert_eq!(store.checkout(user.id).expect_err("empty"), StoreError::EmptyCart);
}

#[test]
fn checkout_failure_leaves_everything_untouched() {
    let (_dir, store) = open_store();
    let user = register(&store, "ana@tienda.mx");
    let shirt = product(&store, "Camisa", 1000, 5);
    let cap = product(&store, "Gorra", 500, 5);
    store.add_to_cart(user.id, shirt.id, qty(1)).expect("add shirt");
    store.add_to_cart(user.id, cap.id, qty(4)).expect("add cap");

    // Stock for the second line drops below the cart quantity.
    store
        .update_product(cap.id, &support::draft("Gorra", 500, 3))
        .expect("shrink stock");

    let err = store.checkout(user.id).expect_err("insufficient");
    assert_eq!(
        err,
        StoreError::InsufficientStock("not enough stock for Gorra".to_string())
    );

    assert_eq!(store.product_by_id(shirt.id).expect("load").expect("p").stock, 5);
    assert_eq!(store.product_by_id(cap.id).expect("load").expect("p").stock, 3);
    assert_eq!(store.cart_for_user(user.id).expect("cart").items.len(), 2);
    assert!(store.list_sales().expect("sales").is_empty());
}

#[test]
fn concurrent_checkouts_never_oversell() {
    let (_dir, store) = open_store();
    let shirt = product(&store, "Camisa", 1000, 1);
    let buyers: Vec<_> = (0..4)
        .map(|i| register(&store, &format!("buyer{i}@tienda.mx")))
        .collect();
    for buyer in &buyers {
        store.add_to_cart(buyer.id, shirt.id, qty(1)).expect("add");
    }

    let store = Arc::new(store);
    let handles: Vec<_> = buyers
        .iter()
        .map(|buyer| {
            let store = Arc::clone(&store);
            let id = buyer.id;
            std::thread::spawn(move || store.checkout(id))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("join"))
        .collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(err, StoreError::InsufficientStock(_)), "{err}");
    }
    assert_eq!(store.product_by_id(shirt.id).expect("load").expect("p").stock, 0);
}
