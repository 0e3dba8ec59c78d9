use super::*;
use warden_core::{EventKind, Topic};

#[tokio::test]
async fn subscribers_receive_published_envelopes() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    bus.publish(Envelope::new(Topic::global("circus.health"), EventKind::Health { watcher_count: 3 }));
    let received = rx.recv().await.unwrap();
    assert_eq!(received.topic, Topic::global("circus.health"));
}

#[tokio::test]
async fn publish_with_no_subscribers_does_not_error() {
    let bus = EventBus::new();
    bus.publish(Envelope::new(Topic::global("circus.health"), EventKind::Health { watcher_count: 0 }));
}

#[test]
fn subscriber_count_tracks_active_receivers() {
    let bus = EventBus::new();
    assert_eq!(bus.subscriber_count(), 0);
    let _rx1 = bus.subscribe();
    let _rx2 = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);
}
