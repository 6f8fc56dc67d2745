//! Construction-time configuration (spec §9: "the redesigned core should
//! accept [singletons] as explicit dependencies... so tests can
//! instantiate isolated worlds").

use std::time::Duration;

/// Tuning for one [`crate::scheduler::Scheduler`] (spec §4.6).
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Ticks per second. Spec default: 30 Hz.
    pub tick_rate: u32,
    /// Deferred-task channel capacity. Spec: "on the order of 10^3".
    pub task_queue_capacity: usize,
}

impl SchedulerConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate as u64)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            task_queue_capacity: 1_000,
        }
    }
}

/// Construction-time tuning for one [`crate::map::Map`] (spec §3 "Map",
/// §4.4 "cell size is a construction parameter").
#[derive(Debug, Clone, Copy)]
pub struct MapConfig {
    pub width: f32,
    pub height: f32,
    /// World-units per AOI cell. Spec default: 100.
    pub cell_size: f32,
    pub view_radius: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            cell_size: 100.0,
            view_radius: 200.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tick_rate_is_30hz() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_rate, 30);
        assert!((config.tick_interval().as_secs_f64() - 1.0 / 30.0).abs() < 1e-9);
    }
}
