//! Behaviour every `OrderRepository` backend must share.
//!
//! `prefix` keeps order ids unique when the backend outlives a single test run.

use std::sync::Arc;

use futures_util::future::join_all;
use quotedesk_core::{NewOrder, OrderFilter, OrderRepository, OrderStatus, StoreError};

pub type Repo = Arc<dyn OrderRepository>;

fn order(prefix: &str, n: &str, email: &str, quote: i64) -> NewOrder {
    NewOrder::new(format!("{}-{}", prefix, n), email, "website", "5-page site", quote)
}

pub async fn create_then_get_round_trips(repo: Repo, prefix: &str) {
    let input = order(prefix, "1001", "a@b.com", 1200)
        .with_budget("")
        .with_timeline("4 weeks");

    let created = repo.create_order(input.clone()).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.order_id, input.order_id);
    assert_eq!(created.client_email, input.client_email);
    assert_eq!(created.project_type, input.project_type);
    assert_eq!(created.budget.as_deref(), Some(""));
    assert_eq!(created.timeline.as_deref(), Some("4 weeks"));
    assert_eq!(created.payment_method, None);
    assert_eq!(created.description, input.description);
    assert_eq!(created.quote, 1200);
    assert_eq!(created.status, OrderStatus::Pending);

    let fetched = repo.get_order(&input.order_id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(repo.get_order_by_id(created.id).await.unwrap(), created);
}

pub async fn duplicate_order_id_rejected(repo: Repo, prefix: &str) {
    let original = repo.create_order(order(prefix, "1001", "a@b.com", 1200)).await.unwrap();

    let err = repo
        .create_order(order(prefix, "1001", "other@b.com", 99))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateOrderId(original.order_id.clone()));

    assert_eq!(repo.get_order(&original.order_id).await.unwrap(), original);
}

pub async fn concurrent_duplicate_creates_have_one_winner(repo: Repo, prefix: &str) {
    let attempts = (0..16).map(|n| {
        let repo = repo.clone();
        let input = NewOrder::new(
            format!("{}-RACE", prefix),
            format!("client{}@b.com", n),
            "software",
            "CRM",
            n,
        );
        tokio::spawn(async move { repo.create_order(input).await })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::DuplicateOrderId(_))))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(duplicates, results.len() - 1);
}

pub async fn negative_quote_stores_nothing(repo: Repo, prefix: &str) {
    let err = repo.create_order(order(prefix, "NEG", "a@b.com", -5)).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let missing = repo.get_order(&format!("{}-NEG", prefix)).await.unwrap_err();
    assert!(matches!(missing, StoreError::NotFound(_)));
}

pub async fn status_walk_and_immutability(repo: Repo, prefix: &str) {
    let created = repo.create_order(order(prefix, "1001", "a@b.com", 1200)).await.unwrap();
    let id = created.order_id.clone();

    let accepted = repo.update_order_status(&id, OrderStatus::Accepted).await.unwrap();
    assert_eq!(accepted.status, OrderStatus::Accepted);

    let with_payment = repo.set_payment_method(&id, "card").await.unwrap();
    assert_eq!(with_payment.status, OrderStatus::Accepted);
    assert_eq!(with_payment.payment_method.as_deref(), Some("card"));

    let paid = repo.update_order_status(&id, OrderStatus::Paid).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);

    let overwritten = repo.set_payment_method(&id, "bank_transfer").await.unwrap();
    assert_eq!(overwritten.payment_method.as_deref(), Some("bank_transfer"));

    let fetched = repo.get_order(&id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Paid);
    for snapshot in [&accepted, &with_payment, &paid, &overwritten, &fetched] {
        assert_eq!(snapshot.id, created.id);
        assert_eq!(snapshot.order_id, created.order_id);
        assert_eq!(snapshot.created_at, created.created_at);
        assert_eq!(snapshot.quote, created.quote);
    }
}

pub async fn terminal_status_cannot_go_back(repo: Repo, prefix: &str) {
    let created = repo.create_order(order(prefix, "DONE", "a@b.com", 500)).await.unwrap();
    repo.update_order_status(&created.order_id, OrderStatus::Completed).await.unwrap();

    let err = repo
        .update_order_status(&created.order_id, OrderStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::InvalidTransition {
            from: "COMPLETED".into(),
            to: "PENDING".into(),
        }
    );
    assert_eq!(
        repo.get_order(&created.order_id).await.unwrap().status,
        OrderStatus::Completed
    );
}

pub async fn missing_order_not_found(repo: Repo, prefix: &str) {
    let missing = format!("{}-9999", prefix);
    assert!(matches!(
        repo.update_order_status(&missing, OrderStatus::Paid).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        repo.set_payment_method(&missing, "card").await,
        Err(StoreError::NotFound(_))
    ));
}

pub async fn concurrent_writers_do_not_lose_updates(repo: Repo, prefix: &str) {
    let created = repo.create_order(order(prefix, "RMW", "a@b.com", 700)).await.unwrap();
    let id = created.order_id.clone();

    let status_task = {
        let repo = repo.clone();
        let id = id.clone();
        tokio::spawn(async move { repo.update_order_status(&id, OrderStatus::Paid).await })
    };
    let payment_task = {
        let repo = repo.clone();
        let id = id.clone();
        tokio::spawn(async move { repo.set_payment_method(&id, "card").await })
    };

    status_task.await.unwrap().unwrap();
    payment_task.await.unwrap().unwrap();

    let fetched = repo.get_order(&id).await.unwrap();
    assert_eq!(fetched.status, OrderStatus::Paid);
    assert_eq!(fetched.payment_method.as_deref(), Some("card"));
}

pub async fn list_orders_oldest_first_with_filters(repo: Repo, prefix: &str) {
    let alice = format!("alice+{}@b.com", prefix.to_lowercase());
    let bob = format!("bob+{}@b.com", prefix.to_lowercase());

    let mut created = Vec::new();
    for (n, email) in [("L1", &alice), ("L2", &bob), ("L3", &alice), ("L4", &alice)] {
        created.push(repo.create_order(order(prefix, n, email, 100)).await.unwrap());
    }
    repo.update_order_status(&created[2].order_id, OrderStatus::Paid).await.unwrap();

    let mine: Vec<_> = repo
        .list_orders(&OrderFilter::all())
        .await
        .unwrap()
        .into_iter()
        .filter(|o| o.order_id.starts_with(prefix))
        .collect();
    assert_eq!(mine.len(), created.len());
    assert!(mine
        .windows(2)
        .all(|w| (w[0].created_at, w[0].id) <= (w[1].created_at, w[1].id)));

    let alices = repo.list_orders(&OrderFilter::by_client_email(&alice)).await.unwrap();
    let alice_ids: Vec<&str> = alices.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(
        alice_ids,
        vec![
            created[0].order_id.as_str(),
            created[2].order_id.as_str(),
            created[3].order_id.as_str(),
        ]
    );

    let alice_paid = repo
        .list_orders(&OrderFilter::by_client_email(&alice).with_status(OrderStatus::Paid))
        .await
        .unwrap();
    assert_eq!(alice_paid.len(), 1);
    assert_eq!(alice_paid[0].order_id, created[2].order_id);

    let nobody = repo
        .list_orders(&OrderFilter::by_client_email("nobody@nowhere.test"))
        .await
        .unwrap();
    assert!(nobody.is_empty());
}
