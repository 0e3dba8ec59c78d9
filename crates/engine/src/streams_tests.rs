use super::*;

#[test]
fn ring_redirector_drops_oldest_past_capacity() {
    let ring = RingRedirector::new(2);
    ring.write_line("a");
    ring.write_line("b");
    ring.write_line("c");
    assert_eq!(ring.lines(), vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn file_redirector_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let redirector = FileRedirector::open(&path).unwrap();
    redirector.write_line("hello");
    redirector.write_line("world");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "hello\nworld\n");
}

#[test]
fn callback_redirector_invokes_the_closure() {
    let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
    let seen2 = seen.clone();
    let redirector = CallbackRedirector::new(move |line: &str| seen2.lock().push(line.to_string()));
    redirector.write_line("hi");
    assert_eq!(*seen.lock(), vec!["hi".to_string()]);
}

#[test]
fn build_redirector_dispatches_on_sink_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let sink = StreamSink::File { path };
    let resolve = |_: &str| -> std::sync::Arc<dyn Redirector> { std::sync::Arc::new(RingRedirector::new(1)) };
    let redirector = build_redirector(&sink, &resolve).unwrap();
    redirector.write_line("x");
}
