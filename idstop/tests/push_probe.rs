use std::time::Duration;

use idstop::api::{parse_base, DashboardApi, HttpApi};
use idstop::ws::{push_url, PushChannel};

// Integration probe: only runs when IDSTOP_URL points at a live backend.
// Example: IDSTOP_URL=http://127.0.0.1:5000 cargo test -p idstop --test push_probe -- --nocapture
#[tokio::test]
async fn probe_backend() {
    let url = match std::env::var("IDSTOP_URL") {
        Ok(v) if !v.is_empty() => v,
        _ => {
            eprintln!("skipping push_probe: set IDSTOP_URL=http://host:port to run this integration test");
            return;
        }
    };

    let api = HttpApi::new(&url).expect("valid url");
    let m = api.metrics().await.expect("GET /api/metrics");
    assert!((0.0..=100.0).contains(&m.cpu_percent));
    api.topology().await.expect("GET /api/topology");
    api.alerts(10, None).await.expect("GET /api/alerts");

    let ws = push_url(&parse_base(&url).unwrap()).unwrap();
    let channel = PushChannel::connect(&ws).await.expect("push channel");
    let _sub = channel.subscribe();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(channel.is_open(), "push channel closed right after the handshake");
}
