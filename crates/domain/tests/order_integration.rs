//! Integration tests for the order and cart aggregates.
//!
//! These tests exercise the public domain API the way the checkout crate
//! uses it: catalog snapshots in, priced orders and merged carts out.

use domain::{
    Cart, CartLine, CustomerInfo, FulfillmentState, Money, Order, OrderDraft, OrderError,
    OrderLine, Product, UserId,
};

fn catalog() -> Vec<Product> {
    vec![
        Product::new("P1", "Mug", Money::from_units(10), 5)
            .unwrap()
            .with_image("uploads/mug.png"),
        Product::new("P2", "Poster", Money::from_cents(1250), 2).unwrap(),
    ]
}

fn address() -> CustomerInfo {
    CustomerInfo::new("Av. Siempre Viva 742", "Springfield", "49007")
        .with_name("Homer")
        .with_email("homer@example.com")
}

fn place(products: &[Product], quantities: &[u32]) -> Order {
    OrderDraft::new(address(), "USD")
        .for_user(Some(UserId::new()))
        .build(products.iter().zip(quantities.iter().copied()))
        .unwrap()
}

mod order_lifecycle {
    use super::*;

    #[test]
    fn order_moves_pending_shipped_delivered() {
        let mut order = place(&catalog(), &[3, 1]);
        assert_eq!(order.fulfillment_state(), FulfillmentState::Pending);

        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        assert_eq!(order.fulfillment_state(), FulfillmentState::Shipped);

        order
            .advance_fulfillment(FulfillmentState::Delivered)
            .unwrap();
        assert!(order.fulfillment_state().is_terminal());
    }

    #[test]
    fn delivered_order_cannot_move() {
        let mut order = place(&catalog(), &[1, 1]);
        order.advance_fulfillment(FulfillmentState::Shipped).unwrap();
        order
            .advance_fulfillment(FulfillmentState::Delivered)
            .unwrap();

        for next in [
            FulfillmentState::Pending,
            FulfillmentState::Shipped,
            FulfillmentState::Delivered,
        ] {
            assert!(matches!(
                order.advance_fulfillment(next),
                Err(OrderError::InvalidTransition { .. })
            ));
        }
    }
}

mod price_integrity {
    use super::*;

    #[test]
    fn total_is_sum_of_snapshot_lines() {
        let order = place(&catalog(), &[3, 2]);
        let expected: Money = order.lines().iter().map(OrderLine::line_total).sum();
        assert_eq!(order.total(), expected);
        assert_eq!(order.total(), Money::from_cents(3000 + 2500));
    }

    #[test]
    fn later_catalog_edits_do_not_change_order() {
        let mut products = catalog();
        let order = place(&products, &[1, 1]);

        products[0].price = Money::from_units(1000);
        products[1].name = "Renamed poster".to_string();

        assert_eq!(order.lines()[0].unit_price, Money::from_units(10));
        assert_eq!(order.lines()[1].name, "Poster");
        assert_eq!(order.total(), Money::from_cents(2250));
    }
}

mod cart_merge {
    use super::*;

    fn line(id: &str, quantity: u32) -> CartLine {
        CartLine::new(id, quantity).unwrap()
    }

    #[test]
    fn merge_is_additive() {
        let server = Cart::from_lines([line("A", 3), line("B", 1)]);
        let merged = server.merge(&[line("A", 2)]);
        assert_eq!(
            merged.lines().collect::<Vec<_>>(),
            vec![line("A", 5), line("B", 1)]
        );
    }

    #[test]
    fn repeated_merge_of_same_snapshot_double_counts() {
        // The plain algorithm has no memory; dedup is the service's job.
        let server = Cart::from_lines([line("A", 1)]);
        let once = server.merge(&[line("A", 2)]);
        let twice = once.merge(&[line("A", 2)]);
        assert_eq!(twice.quantity(&"A".into()), Some(5));
    }
}
