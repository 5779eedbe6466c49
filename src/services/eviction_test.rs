use super::*;
use crate::coordinator::Coordinator;
use crate::hub::spawn_hub;
use crate::rate_limit::RateLimiter;
use crate::state::Rooms;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

#[tokio::test]
async fn sweep_task_evicts_abandoned_rooms() {
    let (hub, _hub_task) = spawn_hub(Coordinator::new(Rooms::new()), RateLimiter::disabled(), 16);
    let client = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(16);
    hub.connect(client, tx).await.unwrap();
    hub.inbound(client, json!({"event": "join", "data": "stale"}).to_string())
        .await
        .unwrap();
    hub.disconnect(client).await.unwrap();
    assert_eq!(hub.stats().await.unwrap().len(), 1);

    let _sweeper = spawn_sweep_task(hub.clone(), Duration::from_millis(10), Duration::from_millis(1));

    timeout(Duration::from_secs(2), async {
        while !hub.stats().await.unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("room should be evicted");
}

#[tokio::test]
async fn sweep_task_exits_when_hub_stops() {
    let (hub, hub_task) = spawn_hub(Coordinator::new(Rooms::new()), RateLimiter::disabled(), 4);
    hub_task.abort();
    let _ = hub_task.await;

    let sweeper = spawn_sweep_task(hub, Duration::from_millis(5), Duration::from_secs(1));
    timeout(Duration::from_secs(2), sweeper)
        .await
        .expect("sweep task should exit")
        .unwrap();
}
