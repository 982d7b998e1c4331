// Tests for the broadcast-state primitive: last-value replay on subscribe
// and ordered, lossless fan-out to every subscriber.

use dictaphone::StateCell;

#[tokio::test]
async fn test_subscribe_replays_current_value() {
    let cell = StateCell::new(7u32);

    let mut rx = cell.subscribe();

    // The current value is delivered synchronously, before any update.
    assert_eq!(rx.try_recv(), Ok(7));
}

#[tokio::test]
async fn test_late_subscriber_sees_latest_not_initial() {
    let cell = StateCell::new("idle");
    cell.set("recording");
    cell.set("stopped");

    let mut rx = cell.subscribe();

    assert_eq!(rx.try_recv(), Ok("stopped"));
    assert!(rx.try_recv().is_err(), "No further value should be queued");
}

#[tokio::test]
async fn test_updates_delivered_in_order_without_loss() {
    let cell = StateCell::new(0u32);
    let mut rx = cell.subscribe();

    for n in 1..=50 {
        cell.set(n);
    }

    let mut seen = Vec::new();
    while let Ok(value) = rx.try_recv() {
        seen.push(value);
    }

    let expected: Vec<u32> = (0..=50).collect();
    assert_eq!(seen, expected, "Every transition, in order, none skipped");
}

#[tokio::test]
async fn test_all_subscribers_receive_every_update() {
    let cell = StateCell::new(0u32);
    let mut a = cell.subscribe();
    let mut b = cell.subscribe();

    cell.set(1);
    cell.set(2);

    for rx in [&mut a, &mut b] {
        assert_eq!(rx.try_recv(), Ok(0));
        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(rx.try_recv(), Ok(2));
    }
}

#[tokio::test]
async fn test_dropped_subscriber_does_not_block_others() {
    let cell = StateCell::new(0u32);
    let dropped = cell.subscribe();
    let mut kept = cell.subscribe();
    drop(dropped);

    cell.set(1);

    assert_eq!(kept.try_recv(), Ok(0));
    assert_eq!(kept.try_recv(), Ok(1));
}

#[tokio::test]
async fn test_get_returns_latest() {
    let cell = StateCell::new(1u32);
    assert_eq!(cell.get(), 1);

    cell.set(5);
    assert_eq!(cell.get(), 5);
}

#[tokio::test]
async fn test_clones_share_state() {
    let cell = StateCell::new(0u32);
    let clone = cell.clone();

    let mut rx = cell.subscribe();
    clone.set(9);

    assert_eq!(cell.get(), 9);
    assert_eq!(rx.try_recv(), Ok(0));
    assert_eq!(rx.try_recv(), Ok(9));
}
