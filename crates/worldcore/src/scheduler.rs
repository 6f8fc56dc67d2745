//! `Scheduler` (spec's `UpdateManager`): the fixed-rate tick loop, timers,
//! and deferred-task channel (spec §4.6).

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::SchedulerConfig;

/// A per-tick update callback. Errors are recorded but never halt the
/// loop (spec §7, kind 3: "the core never aborts a tick because an
/// external sink misbehaved").
pub type UpdateCallback = Box<dyn FnMut(f32) -> anyhow::Result<()> + Send>;

/// A deferred task submitted via [`Scheduler::post_task`]. Boxed
/// `FnOnce` rather than the teacher's type-erased command buffer: this
/// core has no need for the unsafe, zero-copy command encoding a
/// high-throughput ECS scheduler wants, so a plain `Send` closure is
/// simpler and just as fast at the scale one Map's tick loop runs at.
type DeferredTask = Box<dyn FnOnce() + Send>;

struct Timer {
    id: u64,
    interval: f32,
    elapsed: f32,
    repeat: bool,
    active: bool,
    callback: Box<dyn FnMut() + Send>,
}

/// One per-callback failure recorded during a tick, surfaced to callers
/// that want to observe them without the loop halting.
#[derive(Debug)]
pub struct CallbackError {
    pub index: usize,
    pub error: anyhow::Error,
}

/// The single-threaded cooperative driver described in spec §4.6 and §5.
///
/// Nothing about `Scheduler` requires it to run on any particular OS
/// thread; the spec only requires that whichever thread owns it never
/// blocks except waiting for the next tick or draining the task channel.
pub struct Scheduler {
    config: SchedulerConfig,
    callbacks: Vec<UpdateCallback>,
    timers: Vec<Timer>,
    next_timer_id: u64,
    task_tx: flume::Sender<DeferredTask>,
    task_rx: flume::Receiver<DeferredTask>,
    last_tick: Option<Instant>,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        let (task_tx, task_rx) = flume::bounded(config.task_queue_capacity);
        Self {
            config,
            callbacks: Vec::new(),
            timers: Vec::new(),
            next_timer_id: 1,
            task_tx,
            task_rx,
            last_tick: None,
        }
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    pub fn register_callback(&mut self, callback: UpdateCallback) {
        self.callbacks.push(callback);
    }

    /// Registers a timer; returns its id for later [`Scheduler::remove_timer`].
    pub fn add_timer(&mut self, interval: f32, repeat: bool, callback: Box<dyn FnMut() + Send>) -> u64 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        self.timers.push(Timer {
            id,
            interval,
            elapsed: 0.0,
            repeat,
            active: true,
            callback,
        });
        id
    }

    pub fn remove_timer(&mut self, id: u64) {
        self.timers.retain(|timer| timer.id != id);
    }

    /// Attempts a non-blocking send. On a full channel the task is
    /// dropped and a warning is logged (spec §4.6 `PostTask`, §9 ambiguous
    /// behavior 4: "production systems should make this explicit and
    /// observable").
    pub fn post_task(&self, task: impl FnOnce() + Send + 'static) {
        if self.task_tx.try_send(Box::new(task)).is_err() {
            warn!("deferred task channel full, dropping task");
        }
    }

    /// Runs exactly one tick: computes `dt`, snapshots and invokes every
    /// callback, advances timers, then drains the deferred-task channel
    /// (spec §4.6 "each tick").
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self) -> Vec<CallbackError> {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map_or(self.config.tick_interval(), |prev| now.duration_since(prev))
            .as_secs_f32();
        self.last_tick = Some(now);

        let mut errors = Vec::new();
        for (index, callback) in self.callbacks.iter_mut().enumerate() {
            if let Err(error) = callback(dt) {
                warn!(index, %error, "update callback failed");
                errors.push(CallbackError { index, error });
            }
        }

        self.advance_timers(dt);
        self.drain_tasks();

        trace!(dt, callbacks = self.callbacks.len(), "tick complete");
        errors
    }

    fn advance_timers(&mut self, dt: f32) {
        for timer in &mut self.timers {
            if !timer.active {
                continue;
            }
            timer.elapsed += dt;
            if timer.elapsed >= timer.interval {
                (timer.callback)();
                if timer.repeat {
                    timer.elapsed -= timer.interval;
                } else {
                    timer.active = false;
                }
            }
        }
        self.timers.retain(|timer| timer.active);
    }

    fn drain_tasks(&mut self) {
        let mut drained = 0usize;
        while let Ok(task) = self.task_rx.try_recv() {
            task();
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "drained deferred tasks");
        }
    }
}
