use httpmock::prelude::*;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trade_swarm::core::catalog::{
    GET_ALL_NOTIFICATIONS, GET_ALL_POSTS, GET_CLOSED_POSITIONS, GET_OPEN_POSITIONS,
    GET_PENDING_ORDERS, GET_PROFIT_LOSS, GET_STOCK_PERCENTAGES, GET_USER_BALANCE, GET_USER_INFO,
    LOAD_COMPANIES, LOAD_STOCK_PRICE, LOGIN, PLACE_ORDER, REGISTER,
};
use trade_swarm::domain::model::OrderSchema;
use trade_swarm::{CatalogOptions, HttpExecutor, Swarm, SwarmSettings, TaskCatalog, WaitTime};

fn fast_settings(users: usize, iterations: u64) -> SwarmSettings {
    SwarmSettings {
        users,
        spawn_rate: 1000.0,
        wait_time: WaitTime::constant(Duration::ZERO),
        iterations: Some(iterations),
        seed: Some(2024),
        ..SwarmSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_catalog_endpoint_is_exercised_and_counted() {
    let server = MockServer::start_async().await;

    let get_routes = [
        (LOAD_COMPANIES, "/data/companies"),
        (LOAD_STOCK_PRICE, "/data/stock-price/AAPL"),
        (GET_ALL_NOTIFICATIONS, "/notifications/getAllNotifications"),
        (GET_ALL_POSTS, "/posts/"),
        (GET_PENDING_ORDERS, "/summary/pending-orders"),
        (GET_OPEN_POSITIONS, "/summary/open-positions"),
        (GET_CLOSED_POSITIONS, "/summary/closed-positions"),
        (GET_USER_BALANCE, "/auth/balance"),
        (GET_USER_INFO, "/auth/info"),
        (GET_STOCK_PERCENTAGES, "/charts/stock-percentages"),
    ];

    let mut mocks = HashMap::new();
    for (name, path) in get_routes {
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(serde_json::json!({ "ok": true }));
            })
            .await;
        mocks.insert(name, mock);
    }

    let profit_loss = server
        .mock_async(|when, then| {
            when.method(GET).path("/charts/profit-loss");
            then.status(500);
        })
        .await;
    mocks.insert(GET_PROFIT_LOSS, profit_loss);

    let order = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transactions/order")
                .json_body_partial(
                    r#"{"company":"AAPL","quantity":10,"orderType":"market","transactionType":"buy"}"#,
                );
            then.status(200).json_body(serde_json::json!({ "message": "Order placed" }));
        })
        .await;
    mocks.insert(PLACE_ORDER, order);

    let register = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/register");
            then.status(201);
        })
        .await;
    mocks.insert(REGISTER, register);

    let login = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "token": "t" }));
        })
        .await;
    mocks.insert(LOGIN, login);

    let catalog = TaskCatalog::standard(&CatalogOptions::default()).unwrap();
    let executor = HttpExecutor::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let swarm = Swarm::new(catalog, executor, fast_settings(4, 60)).unwrap();

    let snapshot = swarm.run(CancellationToken::new()).await.unwrap();

    assert_eq!(snapshot.aggregated.requests, 240);
    assert_eq!(snapshot.users.spawned, 4);
    assert_eq!(snapshot.users.peak, 4);

    let mut total_hits = 0;
    for (name, mock) in &mocks {
        let hits = mock.hits_async().await as u64;
        total_hits += hits;
        let row_requests = snapshot.endpoint(name).map(|row| row.requests).unwrap_or(0);
        assert_eq!(hits, row_requests, "hit count mismatch for {}", name);
    }
    assert_eq!(total_hits, 240);

    // 只有 profit-loss 回傳 500
    for row in &snapshot.endpoints {
        if row.name == GET_PROFIT_LOSS {
            assert_eq!(row.failures, row.requests);
        } else {
            assert_eq!(row.failures, 0, "{} should not fail", row.name);
        }
    }
    if let Some(failure) = snapshot.failures.first() {
        assert_eq!(failure.name, GET_PROFIT_LOSS);
        assert_eq!(failure.error, "HTTP 500 Internal Server Error");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_symbol_order_schema_sends_symbol_field() {
    let server = MockServer::start_async().await;
    let order = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transactions/order")
                .json_body_partial(r#"{"symbol":"MSFT","unitPrice":100}"#);
            then.status(200);
        })
        .await;

    let options = CatalogOptions {
        symbol: "MSFT".to_string(),
        order_schema: OrderSchema::Symbol,
        include: vec![PLACE_ORDER.to_string()],
        ..CatalogOptions::default()
    };
    let catalog = TaskCatalog::standard(&options).unwrap();
    let executor = HttpExecutor::new(&server.base_url(), Duration::from_secs(5)).unwrap();
    let swarm = Swarm::new(catalog, executor, fast_settings(1, 3)).unwrap();

    let snapshot = swarm.run(CancellationToken::new()).await.unwrap();

    order.assert_hits_async(3).await;
    assert_eq!(snapshot.aggregated.failures, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_host_is_recorded_not_raised() {
    // 使用未監聽的埠
    let catalog = TaskCatalog::builder()
        .register(trade_swarm::core::Operation::get(LOAD_COMPANIES, "/data/companies"))
        .build()
        .unwrap();
    let executor = HttpExecutor::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let swarm = Swarm::new(catalog, executor, fast_settings(2, 2)).unwrap();

    let snapshot = swarm.run(CancellationToken::new()).await.unwrap();

    assert_eq!(snapshot.aggregated.requests, 4);
    assert_eq!(snapshot.aggregated.failures, 4);
    assert!(snapshot.endpoint(LOAD_COMPANIES).unwrap().status_codes.is_empty());
}
