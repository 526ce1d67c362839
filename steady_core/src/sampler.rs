//! Background capture thread.
//!
//! Spawns a thread that owns the `PositionSource`, pushes timestamped
//! observations through a bounded channel at a paced rate, and tracks the
//! last successful read for stall detection.
//!
//! Each `Sampler` spawns exactly one thread, signalled and joined on drop.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use steady_traits::clock::Clock;
use steady_traits::{Detection, PositionSource};

/// One paced observation. `detection` is `None` on detection loss or a
/// capture error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Milliseconds since the sampler's epoch.
    pub t_ms: u64,
    pub detection: Option<Detection>,
}

pub struct Sampler {
    rx: xch::Receiver<Sample>,
    last_ok: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    pub fn spawn<P, C>(source: P, hz: u32, clock: C) -> Self
    where
        P: PositionSource + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        Self::spawn_shared(source, hz, Arc::new(clock))
    }

    pub fn spawn_shared<P>(mut source: P, hz: u32, clock: Arc<dyn Clock + Send + Sync>) -> Self
    where
        P: PositionSource + Send + 'static,
    {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let errors = Arc::new(AtomicU64::new(0));
        let errors_clone = errors.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));
        let epoch = clock.now();
        let thread_clock = clock.clone();

        let join_handle = std::thread::spawn(move || {
            let clock = thread_clock;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                let detection = match source.next_sample() {
                    Ok(d) => {
                        last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                        d
                    }
                    Err(e) => {
                        errors_clone.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "capture failed; treating as detection loss");
                        None
                    }
                };
                let sample = Sample {
                    t_ms: clock.ms_since(epoch),
                    detection,
                };

                // Never block forever: a consumer that stopped draining must
                // not keep this thread (and the joining Drop) hostage.
                match tx.send_timeout(sample, period) {
                    Ok(()) => {}
                    Err(xch::SendTimeoutError::Timeout(_)) => {
                        tracing::trace!("consumer behind; sample dropped");
                    }
                    Err(xch::SendTimeoutError::Disconnected(_)) => {
                        tracing::debug!("sampler consumer disconnected, exiting thread");
                        break;
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            errors,
            clock,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Newest pending sample, discarding older ones.
    pub fn latest(&self) -> Option<Sample> {
        self.rx.try_iter().last()
    }

    /// Block up to `timeout` for the next sample.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Sample> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Milliseconds since the last successful read, as of `now_ms`.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    /// Stall measured against the sampler's own clock.
    pub fn stalled_for_now(&self) -> u64 {
        self.stalled_for(self.clock.ms_since(self.epoch))
    }

    /// Capture errors seen so far.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // Exits between reads, or once the in-flight `next_sample` returns.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
