use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use warden_core::{EventKind, Topic};

async fn connect_and_subscribe(socket_path: &std::path::Path, prefix: &str) -> UnixStream {
    let stream = UnixStream::connect(socket_path).await.unwrap();
    let (mut reader_half, mut writer_half) = stream.into_split();
    let frame = prefix.as_bytes();
    writer_half.write_all(&(frame.len() as u32).to_be_bytes()).await.unwrap();
    writer_half.write_all(frame).await.unwrap();
    writer_half.flush().await.unwrap();
    reader_half.reunite(writer_half).unwrap()
}

async fn read_frame(stream: &mut UnixStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.unwrap();
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn matching_envelopes_are_delivered_as_two_frames() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("publish.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();
    let bus = EventBus::new();
    let publish = PublishListener::new(listener, bus.clone());
    tokio::spawn(publish.run());

    let mut client = connect_and_subscribe(&socket_path, "web.").await;
    // give the spawned subscriber task a chance to register before publishing
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    bus.publish(Envelope::for_watcher(&warden_core::WatcherName::new("web"), "spawn", EventKind::Spawn {
        pid: warden_core::Pid(123),
        wid: warden_core::Wid(0),
    }));

    let topic_frame = read_frame(&mut client).await;
    assert_eq!(topic_frame, b"web.spawn");
    let payload_frame = read_frame(&mut client).await;
    let envelope: Envelope = serde_json::from_slice(&payload_frame).unwrap();
    assert_eq!(envelope.topic, Topic::watcher(&warden_core::WatcherName::new("web"), "spawn"));
}

#[tokio::test]
async fn non_matching_topics_are_not_delivered() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("publish.sock");
    let listener = UnixListener::bind(&socket_path).unwrap();
    let bus = EventBus::new();
    let publish = PublishListener::new(listener, bus.clone());
    tokio::spawn(publish.run());

    let mut client = connect_and_subscribe(&socket_path, "worker.").await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    bus.publish(Envelope::for_watcher(&warden_core::WatcherName::new("web"), "spawn", EventKind::Spawn {
        pid: warden_core::Pid(123),
        wid: warden_core::Wid(0),
    }));
    bus.publish(Envelope::new(Topic::global("circus.health"), EventKind::Health { watcher_count: 1 }));
    bus.publish(Envelope::for_watcher(&warden_core::WatcherName::new("worker"), "stop", EventKind::Stop));

    let topic_frame = read_frame(&mut client).await;
    assert_eq!(topic_frame, b"worker.stop");
}
