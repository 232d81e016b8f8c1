//! Concurrency tests: the engine is shared across threads and must
//! serialize every balance- and stock-mutating operation.

use rewards_engine::{RewardsEngine, RewardsError};
use std::sync::{Arc, Barrier};
use std::thread;

fn spawn_all<F>(count: usize, f: F) -> Vec<thread::JoinHandle<Result<(), RewardsError>>>
where
    F: Fn(usize) -> Result<(), RewardsError> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let barrier = Arc::new(Barrier::new(count));
    (0..count)
        .map(|i| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect()
}

#[test]
fn test_ten_concurrent_allocations_each_land_once() {
    let engine = Arc::new(RewardsEngine::new());
    engine
        .create_account("EMP001", "alice@example.com", "Alice", "Smith")
        .unwrap();

    let handles = spawn_all(10, {
        let engine = Arc::clone(&engine);
        move |i| {
            engine
                .allocate_points("EMP001", 10, "EVT001", &format!("Batch earning {i}"))
                .map(|_| ())
        }
    });
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(engine.balance("EMP001").unwrap(), 100);
    let history = engine.history("EMP001");
    assert_eq!(history.len(), 10);
    assert!(history.iter().all(|tx| tx.amount == 10));
}

#[test]
fn test_last_unit_of_stock_sells_exactly_once() {
    let engine = Arc::new(RewardsEngine::new());
    let workers = 8;
    for i in 0..workers {
        engine
            .create_account(
                &format!("EMP{i:03}"),
                &format!("user{i}@example.com"),
                "User",
                "Example",
            )
            .unwrap();
        engine
            .allocate_points(&format!("EMP{i:03}"), 1000, "EVT001", "Seed points")
            .unwrap();
    }
    let product_id = engine
        .create_product("Gift Card", "A 50-dollar gift card", 500, 1)
        .unwrap()
        .id;

    let handles = spawn_all(workers, {
        let engine = Arc::clone(&engine);
        move |i| {
            engine
                .request_redemption(&format!("EMP{i:03}"), product_id)
                .map(|_| ())
        }
    });

    let mut successes = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) => successes += 1,
            Err(RewardsError::OutOfStock { .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(out_of_stock, workers - 1);
    assert_eq!(engine.get_product(product_id).unwrap().stock, 0);

    // Exactly one account paid.
    let paid: Vec<_> = engine
        .list_accounts()
        .into_iter()
        .filter(|a| a.balance == 500)
        .collect();
    assert_eq!(paid.len(), 1);
    assert!(engine
        .list_accounts()
        .iter()
        .all(|a| a.balance == 500 || a.balance == 1000));
}

#[test]
fn test_concurrent_requests_cannot_double_spend() {
    let engine = Arc::new(RewardsEngine::new());
    engine
        .create_account("EMP001", "alice@example.com", "Alice", "Smith")
        .unwrap();
    engine
        .allocate_points("EMP001", 500, "EVT001", "Seed points")
        .unwrap();
    let product_id = engine
        .create_product("Backpack", "Laptop bag", 300, 10)
        .unwrap()
        .id;

    let handles = spawn_all(2, {
        let engine = Arc::clone(&engine);
        move |_| engine.request_redemption("EMP001", product_id).map(|_| ())
    });

    let mut successes = 0;
    let mut short = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) => successes += 1,
            Err(RewardsError::InsufficientPoints { .. }) => short += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // 500 points only cover one 300-point redemption.
    assert_eq!(successes, 1);
    assert_eq!(short, 1);
    assert_eq!(engine.balance("EMP001").unwrap(), 200);
    assert_eq!(engine.get_product(product_id).unwrap().stock, 9);
}

#[test]
fn test_conservation_holds_under_mixed_concurrent_traffic() {
    let engine = Arc::new(RewardsEngine::new());
    let workers = 6;
    for i in 0..workers {
        engine
            .create_account(
                &format!("EMP{i:03}"),
                &format!("user{i}@example.com"),
                "User",
                "Example",
            )
            .unwrap();
    }
    let product_id = engine
        .create_product("Mug", "Branded coffee mug", 50, 100)
        .unwrap()
        .id;

    let handles = spawn_all(workers, {
        let engine = Arc::clone(&engine);
        move |i| {
            let employee = format!("EMP{i:03}");
            for round in 0..20 {
                engine
                    .allocate_points(&employee, 30, "EVT001", &format!("Round {round}"))
                    .map(|_| ())?;
                // Every other round, try to redeem; attempts that fail on
                // balance must leave no trace.
                if round % 2 == 0 {
                    let _ = engine.request_redemption(&employee, product_id);
                }
            }
            Ok(())
        }
    });
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    for account in engine.list_accounts() {
        let sum: i64 = engine
            .history(&account.employee_id)
            .iter()
            .map(|tx| tx.amount)
            .sum();
        assert_eq!(account.balance, sum, "ledger diverged for {}", account.employee_id);
        assert!(account.balance >= 0);
    }

    // Stock decrements match recorded redemptions exactly.
    let total_redemptions: usize = (0..workers)
        .map(|i| engine.redemptions_for(&format!("EMP{i:03}")).len())
        .sum();
    let stock = engine.get_product(product_id).unwrap().stock;
    assert_eq!(stock as usize + total_redemptions, 100);
}
