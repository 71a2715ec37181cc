use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use slotwatch::logging::build_subscriber;
use slotwatch::Recipient;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().expect("lock output").clone()).expect("utf8 log output")
    }
}

#[test]
fn json_log_lines_are_valid_json() {
    let sink = SharedBuffer::default();
    let subscriber = build_subscriber(true, EnvFilter::new("info"), sink.clone());
    let recipient = Recipient::parse("+5493410000000").unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(
            target: "slotwatch::notify",
            recipient = %recipient.fingerprint(),
            tick = 3_u64,
            "alert delivered"
        );
    });

    let text = sink.text();
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .expect("log line");
    let parsed: serde_json::Value = serde_json::from_str(line).expect("json log line");

    assert_eq!(parsed.get("level").and_then(|v| v.as_str()), Some("INFO"));
    assert_eq!(
        parsed.get("target").and_then(|v| v.as_str()),
        Some("slotwatch::notify")
    );
    let fields = parsed.get("fields").expect("fields object");
    assert_eq!(
        fields.get("message").and_then(|v| v.as_str()),
        Some("alert delivered")
    );
    assert_eq!(fields.get("tick").and_then(serde_json::Value::as_u64), Some(3));
    // Logs carry the fingerprint, never the number.
    assert!(!text.contains("+5493410000000"));
}

#[test]
fn filter_drops_lower_levels() {
    let sink = SharedBuffer::default();
    let subscriber = build_subscriber(false, EnvFilter::new("warn"), sink.clone());

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("tick complete");
        tracing::warn!("page fetch failed; treating as unavailable");
    });

    let text = sink.text();
    assert!(!text.contains("tick complete"));
    assert!(text.contains("page fetch failed"));
}
