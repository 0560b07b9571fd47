//! Host event types and channel plumbing.
//!
//! The semantic core is single threaded; everything that happens to it
//! arrives as an [`Event`] through one bounded mpsc channel consumed
//! by the host loop. Producers (the PTY reader, the tick source,
//! window-system glue) either hold a `Sender` clone or register as an
//! [`AsyncEventSource`].

use std::sync::atomic::AtomicU64;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel policy
// -------------------------------------------------------------------------------------------------
// A bounded channel provides memory safety and natural producer
// backpressure. The PTY reader is the dominant producer: parking it
// when the semantic thread falls behind is exactly the flow control a
// blocking read(2) would give a synchronous terminal, so nothing is
// dropped. Telemetry counts sends/failures; multi-producer priority
// schemes can layer on later without changing the channel type.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 8192;

/// Upper bound on one PTY read chunk carried per event.
pub const PTY_CHUNK_MAX: usize = 64 * 1024;

// Telemetry: relaxed atomic counters, inspected by tests and
// periodically logged.
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static PTY_CHUNKS: AtomicU64 = AtomicU64::new(0);
pub static PTY_BYTES: AtomicU64 = AtomicU64::new(0);
pub static KEY_EVENTS: AtomicU64 = AtomicU64::new(0);
pub static MOUSE_EVENTS: AtomicU64 = AtomicU64::new(0);

/// Everything the host loop reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    /// Bytes read from the PTY, in arrival order.
    PtyData(Vec<u8>),
    /// The PTY hit EOF (child exited).
    PtyClosed,
    Key {
        sym: core_input::KeySym,
        mods: core_input::Mods,
    },
    Mouse(core_input::MouseEvent),
    Paste(Vec<u8>),
    /// New cell geometry from the surface (cols, rows, scale).
    Resize {
        cols: usize,
        rows: usize,
        scale: f64,
    },
    FocusGained,
    FocusLost,
    /// Periodic monotonic tick driving blink, flash expiry and the
    /// resize debouncer.
    Tick,
    /// Clipboard data arriving for a paste request.
    ClipboardData(Vec<u8>),
    Shutdown,
}

/// Trait implemented by any async event producer. Implementors spawn
/// one background task that pushes events into the shared channel and
/// terminate promptly when the channel closes.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier for logging.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the task. Implementations stop when
    /// `tx.send(..)` errors (consumer gone) and must not busy-loop.
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of sources, spawned together at startup.
#[derive(Default)]
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    /// Spawn all registered sources. Call after creating the runtime
    /// channel and before the loop consumes; on shutdown, drop the
    /// final `Sender` before awaiting the handles so sources observe
    /// closure and exit cooperatively.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Built-in tick source: emits [`Event::Tick`] at a fixed interval.
pub struct TickEventSource {
    interval: Duration,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Result alias for event-plumbing fallibility at the host boundary.
pub type EventResult<T> = anyhow::Result<T>;

/// Deadline debouncer for resize events: every new size restarts the
/// quiet period; [`Debouncer::expired`] yields the final size once the
/// period passes without further updates. The latest size always wins.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    /// Take the value if its quiet period has elapsed.
    pub fn expired(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => {
                self.pending.take().map(|(v, _)| v)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use tokio::sync::mpsc;

    #[test]
    fn debouncer_latest_wins() {
        let mut d: Debouncer<(usize, usize)> = Debouncer::new(Duration::from_millis(50));
        let t0 = Instant::now();
        d.push((80, 24));
        d.push((100, 30));
        assert!(d.is_pending());
        // Not yet expired.
        assert_eq!(d.expired(t0), None);
        // Past the deadline the last value comes out once.
        let later = t0 + Duration::from_millis(200);
        assert_eq!(d.expired(later), Some((100, 30)));
        assert_eq!(d.expired(later), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn debouncer_restart_on_push() {
        let mut d: Debouncer<u32> = Debouncer::new(Duration::from_millis(50));
        d.push(1);
        let mid = Instant::now() + Duration::from_millis(30);
        assert_eq!(d.expired(mid), None);
        d.push(2); // restarts the quiet period
        assert_eq!(d.expired(mid + Duration::from_millis(30)), None);
        assert_eq!(
            d.expired(Instant::now() + Duration::from_millis(200)),
            Some(2)
        );
    }

    #[tokio::test]
    async fn tick_source_emits_and_stops_on_close() {
        let (tx, mut rx) = mpsc::channel::<Event>(8);
        let mut reg = EventSourceRegistry::new();
        reg.register(TickEventSource::new(Duration::from_millis(5)));
        let handles = reg.spawn_all(&tx);

        let got = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("tick within deadline");
        assert!(matches!(got, Some(Event::Tick)));

        drop(tx);
        drop(rx);
        for handle in handles {
            tokio::time::timeout(Duration::from_millis(200), handle)
                .await
                .expect("source exits on channel close")
                .expect("clean exit");
        }
    }

    #[test]
    fn telemetry_counters_are_plain_atomics() {
        PTY_CHUNKS.fetch_add(1, Ordering::Relaxed);
        PTY_BYTES.fetch_add(512, Ordering::Relaxed);
        assert!(PTY_BYTES.load(Ordering::Relaxed) >= 512);
    }
}
