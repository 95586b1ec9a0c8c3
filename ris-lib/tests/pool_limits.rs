//! Concurrency limits of the shared connection pool.
//!
//! ```bash
//! cargo test -p ris-lib --test pool_limits
//! ```

use std::time::{Duration, Instant};

use ris_lib::{ConnectionPool, HttpReply, PoolConfig};
use tokio::task::JoinHandle;
use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

const DELAY: Duration = Duration::from_millis(300);
const FORM: &str = "application/x-www-form-urlencoded";

async fn slow_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK").set_delay(DELAY))
        .mount(&server)
        .await;
    server
}

async fn fast_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;
    server
}

fn spawn_post(pool: &ConnectionPool, url: String) -> JoinHandle<HttpReply> {
    let pool = pool.clone();
    tokio::spawn(async move {
        pool.post_form(&url, &[], FORM, "MODE=Q".to_string())
            .await
            .unwrap()
    })
}

async fn join_all(handles: Vec<JoinHandle<HttpReply>>) {
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_total_limit_spans_routes() {
    let first = slow_server().await;
    let second = slow_server().await;
    let pool = ConnectionPool::new(PoolConfig::default().with_max_connections(2)).unwrap();

    let started = Instant::now();
    let handles = vec![
        spawn_post(&pool, first.uri()),
        spawn_post(&pool, first.uri()),
        spawn_post(&pool, second.uri()),
        spawn_post(&pool, second.uri()),
    ];
    join_all(handles).await;

    // Four requests through two slots take at least two rounds.
    assert!(started.elapsed() >= DELAY * 2, "elapsed {:?}", started.elapsed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_per_route_limit() {
    let server = slow_server().await;
    let pool = ConnectionPool::new(
        PoolConfig::default()
            .with_max_connections(8)
            .with_max_connections_per_route(1),
    )
    .unwrap();

    let started = Instant::now();
    let handles = (0..3).map(|_| spawn_post(&pool, server.uri())).collect();
    join_all(handles).await;

    assert!(started.elapsed() >= DELAY * 3, "elapsed {:?}", started.elapsed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saturated_route_does_not_block_other_routes() {
    let slow = slow_server().await;
    let fast = fast_server().await;
    let pool = ConnectionPool::new(
        PoolConfig::default()
            .with_max_connections(2)
            .with_max_connections_per_route(1),
    )
    .unwrap();

    // One request in flight on the slow route, one queued behind it.
    let handles = vec![spawn_post(&pool, slow.uri()), spawn_post(&pool, slow.uri())];
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let reply = pool
        .post_form(&fast.uri(), &[], FORM, "MODE=Q".to_string())
        .await
        .unwrap();
    assert!(reply.is_success());
    assert!(started.elapsed() < DELAY, "elapsed {:?}", started.elapsed());

    join_all(handles).await;
}
