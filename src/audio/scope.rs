use crossbeam::channel::{Sender, TrySendError};
use log::{debug, error};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use crate::audio::ring_buffer::ScopeConsumer;
use crate::settings::ScopeSettings;

/// Vertical share of the trace height that a full-scale sample reaches.
const TRACE_HEIGHT_SCALE: f32 = 0.4;

/// Consumer side of the oscilloscope.
///
/// Drains the telemetry ring into a display buffer of the same size. The
/// display is only mutated here, under a short lock shared with readers so a
/// concurrent paint never sees a half-copied frame.
pub struct Scope {
    consumer: ScopeConsumer,
    scratch: Vec<f32>,
    display: Arc<Mutex<Vec<f32>>>,
}

/// Read-only handle to the display buffer for the render side.
#[derive(Clone)]
pub struct ScopeView {
    display: Arc<Mutex<Vec<f32>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEvent {
    /// The display may have changed and should be redrawn.
    Repaint { drained: usize, ready: usize },
}

fn lock(display: &Mutex<Vec<f32>>) -> MutexGuard<'_, Vec<f32>> {
    // The display holds plain samples; a panic mid-copy leaves nothing to repair.
    display
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl Scope {
    pub fn new(consumer: ScopeConsumer) -> Self {
        let capacity = consumer.capacity();
        Self {
            consumer,
            scratch: vec![0.0; capacity],
            display: Arc::new(Mutex::new(vec![0.0; capacity])),
        }
    }

    pub fn view(&self) -> ScopeView {
        ScopeView {
            display: Arc::clone(&self.display),
        }
    }

    pub fn ready_count(&self) -> usize {
        self.consumer.ready_count()
    }

    /// Pop up to `max_samples` ready samples and copy them, in order, to the
    /// front of the display. Returns how many were moved.
    pub fn drain(&mut self, max_samples: usize) -> usize {
        let wanted = max_samples.min(self.scratch.len());
        let count = self.consumer.pop_into(&mut self.scratch[..wanted]);
        if count == 0 {
            return 0;
        }

        let mut display = lock(&self.display);
        display[..count].copy_from_slice(&self.scratch[..count]);
        count
    }

    /// One timer tick: drain a full display's worth once at least `min_ready`
    /// samples have queued up.
    pub fn tick(&mut self, min_ready: usize) -> usize {
        if self.consumer.ready_count() < min_ready.max(1) {
            return 0;
        }
        self.drain(self.scratch.len())
    }
}

impl ScopeView {
    /// Run `f` over the display while holding the lock.
    pub fn with_samples<R>(&self, f: impl FnOnce(&[f32]) -> R) -> R {
        let display = lock(&self.display);
        f(display.as_slice())
    }

    pub fn snapshot(&self) -> Vec<f32> {
        self.with_samples(<[f32]>::to_vec)
    }

    /// Polyline of the display mapped into a `width` x `height` box, x running
    /// left to right and positive samples pointing up from the centre line.
    pub fn trace(&self, width: f32, height: f32) -> Vec<(f32, f32)> {
        self.with_samples(|samples| {
            let len = samples.len().max(1) as f32;
            let centre = height * 0.5;
            let scale = height * TRACE_HEIGHT_SCALE;
            samples
                .iter()
                .enumerate()
                .map(|(i, s)| (i as f32 / len * width, s.mul_add(-scale, centre)))
                .collect()
        })
    }
}

/// Runs a [`Scope`] on its own thread at a fixed refresh rate.
///
/// Each tick drains the ring and sends a repaint event; the event is dropped
/// if the receiver is lagging. The thread stops when the timer is dropped.
pub struct ScopeTimer {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScopeTimer {
    pub fn spawn(mut scope: Scope, settings: &ScopeSettings, repaint: Sender<ScopeEvent>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = settings.interval();
        let min_ready = settings.min_ready;

        debug!(
            "Starting scope timer at {} Hz (min ready {min_ready})",
            settings.refresh_hz
        );

        let handle = thread::spawn(move || {
            let mut next = Instant::now() + interval;
            while flag.load(Ordering::Acquire) {
                thread::sleep(next.saturating_duration_since(Instant::now()));
                next += interval;

                let drained = scope.tick(min_ready);
                let event = ScopeEvent::Repaint {
                    drained,
                    ready: scope.ready_count(),
                };
                match repaint.try_send(event) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => {
                        debug!("Scope receiver gone, stopping timer");
                        break;
                    }
                }
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            error!("Scope timer thread panicked");
        }
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("Stopping scope timer on drop");
            self.stop();
        }
    }
}
