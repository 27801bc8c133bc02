use std::env;

use poolmath::{PoolMathClient, PoolMonitor, ShareResolver};

/// Run with: cargo test --test integration -- --ignored
/// Requires a real share link, e.g.
///   POOLMATH_SHARE_URL=https://www.troublefreepool.com/mypool/<share-id>
#[tokio::test]
#[ignore]
async fn resolve_and_poll_live_pool() {
    let share_url = env::var("POOLMATH_SHARE_URL").expect("POOLMATH_SHARE_URL not set");

    let identity = ShareResolver::new()
        .resolve(&share_url)
        .await
        .unwrap_or_else(|e| panic!("resolve failed: {e}"));

    let client = PoolMathClient::builder(identity).build().expect("client");
    let mut monitor = PoolMonitor::new(client);

    let snapshot = monitor.poll().await.expect("poll failed");
    assert!(!snapshot.pool_name.is_empty());
    assert!(
        !snapshot.measurements.is_empty(),
        "a shared pool should have at least one reading"
    );
    for m in &snapshot.measurements {
        assert!(m.value.is_finite(), "{} is not finite", m.key);
    }

    // Range state only changes on a flip, so a second poll of unchanged data is quiet.
    let again = monitor.poll().await.expect("second poll failed");
    assert!(again.transitions.is_empty());
}
