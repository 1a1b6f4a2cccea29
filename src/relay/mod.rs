//! Asynchronous log relay.
//!
//! Worker threads append status lines to a shared buffer; a single
//! presentation consumer renders snapshots of it and applies scrolling.
//! Appends and replaces are short critical sections that never fail to the
//! caller; render requests travel over a channel to a dedicated consumer
//! thread, which coalesces bursts to the latest buffer state. Relay
//! internals report their own errors through the `log` facade, never
//! through the relay itself.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::mpsc;

/// Post-render scroll behavior attached to each flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirective {
    None,
    ToTop,
    #[default]
    ToBottom,
}

/// Presentation seam for the single rendering context.
///
/// A render delivers the full current buffer text; the matching scroll (if
/// any) arrives only after the render, once the grace delay has elapsed.
pub trait RenderSink: Send {
    fn render(&self, text: &str);
    fn scroll(&self, directive: ScrollDirective);
}

/// Grace delay between a render taking effect and the scroll being issued.
const SCROLL_GRACE_DELAY: Duration = Duration::from_millis(200);

/// Thread-safe append-only log buffer plus render/scroll marshaling.
pub struct LogRelay {
    buffer: Mutex<String>,
    flush_tx: mpsc::UnboundedSender<ScrollDirective>,
}

impl LogRelay {
    /// Create a relay and spawn its render consumer.
    ///
    /// The consumer runs on a dedicated thread hosting its own
    /// current-thread runtime, so producers never need an ambient tokio
    /// runtime. It ends when the relay is dropped.
    pub fn new<S: RenderSink + 'static>(sink: S) -> Arc<Self> {
        Self::with_scroll_delay(sink, SCROLL_GRACE_DELAY)
    }

    /// Create a relay with an explicit scroll grace delay.
    pub fn with_scroll_delay<S: RenderSink + 'static>(sink: S, delay: Duration) -> Arc<Self> {
        let (flush_tx, flush_rx) = mpsc::unbounded_channel();
        let relay = Arc::new(Self {
            buffer: Mutex::new(String::new()),
            flush_tx,
        });
        spawn_render_consumer(Arc::downgrade(&relay), flush_rx, sink, delay);
        relay
    }

    /// Append one line to the buffer.
    ///
    /// Thread-safe and infallible: a poisoned buffer lock is recovered and
    /// reported through the side channel. Lines are appended whole; two
    /// concurrent appends never interleave within a line.
    pub fn append(&self, line: &str) {
        let mut buffer = self.lock_buffer();
        buffer.push_str(line);
        buffer.push('\n');
    }

    /// Atomically clear the buffer and set it to `text`.
    pub fn replace(&self, text: &str) {
        let mut buffer = self.lock_buffer();
        buffer.clear();
        buffer.push_str(text);
    }

    /// Schedule a render of the current buffer contents.
    ///
    /// Concurrent flushes coalesce: the consumer renders the latest buffer
    /// state and intermediate states may be skipped, but a render always
    /// reflects every append that completed before the flush was issued.
    pub fn flush(&self, scroll: ScrollDirective) {
        if self.flush_tx.send(scroll).is_err() {
            log::warn!("[LogRelay] render consumer is gone; dropping flush");
        }
    }

    /// Append a line and schedule a render scrolled to the bottom.
    pub fn message(&self, text: &str) {
        self.append(text);
        self.flush(ScrollDirective::ToBottom);
    }

    /// Append a `component:message` error line and schedule a render.
    pub fn error_message(&self, component: &str, text: &str) {
        self.append(&format!("{}:{}", component, text));
        self.flush(ScrollDirective::ToBottom);
    }

    /// Copy of the current buffer contents.
    pub fn snapshot(&self) -> String {
        self.lock_buffer().clone()
    }

    fn lock_buffer(&self) -> std::sync::MutexGuard<'_, String> {
        match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("[LogRelay] buffer lock poisoned; recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Consumer loop: coalesce queued flushes, render the latest buffer state,
/// then apply the scroll after the grace delay.
fn spawn_render_consumer<S: RenderSink + 'static>(
    relay: Weak<LogRelay>,
    mut flush_rx: mpsc::UnboundedReceiver<ScrollDirective>,
    sink: S,
    delay: Duration,
) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(err) => {
                log::error!("[LogRelay] failed to build render runtime: {}", err);
                return;
            }
        };

        rt.block_on(async move {
            while let Some(first) = flush_rx.recv().await {
                // Coalesce any backlog to a single latest-state render
                let mut directive = first;
                while let Ok(next) = flush_rx.try_recv() {
                    directive = next;
                }

                let snapshot = match relay.upgrade() {
                    Some(relay) => relay.snapshot(),
                    None => break,
                };

                sink.render(&snapshot);

                if directive != ScrollDirective::None {
                    tokio::time::sleep(delay).await;
                    sink.scroll(directive);
                }
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Instant;

    /// Sink that records every render and scroll for assertions.
    #[derive(Clone, Default)]
    struct CaptureSink {
        renders: Arc<Mutex<Vec<String>>>,
        scrolls: Arc<Mutex<Vec<ScrollDirective>>>,
    }

    impl RenderSink for CaptureSink {
        fn render(&self, text: &str) {
            self.renders.lock().unwrap().push(text.to_string());
        }

        fn scroll(&self, directive: ScrollDirective) {
            self.scrolls.lock().unwrap().push(directive);
        }
    }

    fn wait_until(deadline_ms: u64, mut predicate: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        predicate()
    }

    #[test]
    fn test_append_adds_newline_terminated_lines() {
        let relay = LogRelay::with_scroll_delay(CaptureSink::default(), Duration::ZERO);
        relay.append("first");
        relay.append("second");
        assert_eq!(relay.snapshot(), "first\nsecond\n");
    }

    #[test]
    fn test_replace_clears_previous_content() {
        let relay = LogRelay::with_scroll_delay(CaptureSink::default(), Duration::ZERO);
        relay.append("old line");
        relay.replace("credits text\n");
        relay.append("after");
        assert_eq!(relay.snapshot(), "credits text\nafter\n");
    }

    #[test]
    fn test_concurrent_appends_stay_line_granular() {
        let relay = LogRelay::with_scroll_delay(CaptureSink::default(), Duration::ZERO);
        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));

        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let relay = Arc::clone(&relay);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    relay.append(&format!("worker-{} first", worker));
                    relay.append(&format!("worker-{} second", worker));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = relay.snapshot();
        let lines: Vec<&str> = snapshot.lines().collect();
        assert_eq!(lines.len(), workers * 2);

        for worker in 0..workers {
            let first = format!("worker-{} first", worker);
            let second = format!("worker-{} second", worker);
            let first_pos = lines.iter().position(|line| **line == first).unwrap();
            let second_pos = lines.iter().position(|line| **line == second).unwrap();
            assert!(first_pos < second_pos, "per-worker order must be preserved");
        }
    }

    #[test]
    fn test_flush_renders_current_buffer() {
        let sink = CaptureSink::default();
        let relay = LogRelay::with_scroll_delay(sink.clone(), Duration::ZERO);

        relay.append("hello");
        relay.flush(ScrollDirective::None);

        assert!(wait_until(5000, || {
            sink.renders.lock().unwrap().last().map(String::as_str) == Some("hello\n")
        }));
    }

    #[test]
    fn test_flush_burst_coalesces_to_latest_state() {
        let sink = CaptureSink::default();
        let relay = LogRelay::with_scroll_delay(sink.clone(), Duration::ZERO);

        for n in 0..50 {
            relay.append(&format!("line {}", n));
            relay.flush(ScrollDirective::ToBottom);
        }

        let expected = relay.snapshot();
        assert!(wait_until(5000, || {
            sink.renders.lock().unwrap().last() == Some(&expected)
        }));
    }

    #[test]
    fn test_scroll_arrives_after_render() {
        let sink = CaptureSink::default();
        let relay = LogRelay::with_scroll_delay(sink.clone(), Duration::from_millis(20));

        relay.append("content");
        relay.flush(ScrollDirective::ToTop);

        assert!(wait_until(5000, || {
            sink.scrolls.lock().unwrap().last() == Some(&ScrollDirective::ToTop)
        }));
        assert!(!sink.renders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_message_formats_component_prefix() {
        let relay = LogRelay::with_scroll_delay(CaptureSink::default(), Duration::ZERO);
        relay.error_message("EngineSession", "construction failed");
        assert_eq!(relay.snapshot(), "EngineSession:construction failed\n");
    }

    #[test]
    fn test_render_reflects_completed_appends() {
        // A render scheduled after an append must include that append.
        let sink = CaptureSink::default();
        let relay = LogRelay::with_scroll_delay(sink.clone(), Duration::ZERO);
        let appended = Arc::new(AtomicUsize::new(0));

        for n in 0..10 {
            appended.fetch_add(1, Ordering::SeqCst);
            relay.append(&format!("entry {}", n));
            relay.flush(ScrollDirective::None);
        }

        assert!(wait_until(5000, || {
            !sink.renders.lock().unwrap().is_empty()
        }));
        for render in sink.renders.lock().unwrap().iter() {
            let rendered_lines = render.lines().count();
            assert!(rendered_lines <= appended.load(Ordering::SeqCst));
        }
        assert!(wait_until(5000, || {
            sink.renders.lock().unwrap().last().map(|r| r.lines().count()) == Some(10)
        }));
    }
}
