//! Fixed-rate world loop

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::core::config::EngineConfig;
use crate::foundation::time::TickTimer;

use super::World;

/// Drives [`World::tick`] at the configured rate with measured, drift-corrected `dt`
pub struct WorldClock {
    timer: TickTimer,
    running: Arc<AtomicBool>,
}

impl WorldClock {
    /// Clock ticking at `config.tick_rate_hz`
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timer: TickTimer::new(config.tick_rate_hz, config.max_catch_up_ticks),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the loop when cleared from another thread
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Timing statistics
    pub const fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Tick `world` until `between` breaks or the stop handle is cleared
    ///
    /// `between` runs after every tick, outside the tick itself; it is where
    /// commands are applied and the save cycle runs. Returns the number of
    /// ticks executed.
    pub fn run<F>(&mut self, world: &mut World, mut between: F) -> u64
    where
        F: FnMut(&mut World) -> ControlFlow<()>,
    {
        self.running.store(true, Ordering::SeqCst);
        self.timer.reset();
        info!("World clock started at {:?} per tick", self.timer.period());

        let mut ticks = 0;
        while self.running.load(Ordering::SeqCst) {
            self.timer.wait();
            let dt = self.timer.advance();
            world.tick(dt);
            ticks += 1;

            if between(world).is_break() {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "World clock stopped after {} ticks ({:.1} tps, {} resyncs)",
            ticks,
            self.timer.average_tps(),
            self.timer.resyncs()
        );
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StaticData;

    #[test]
    fn test_run_stops_on_break() {
        let config = EngineConfig::default().with_tick_rate(200);
        let data = Arc::new(StaticData::parse(include_str!("../../data/world.ron")).unwrap());
        let mut world = World::new(config.clone(), data).unwrap();
        let mut clock = WorldClock::new(&config);

        let mut seen = 0;
        let ticks = clock.run(&mut world, |_| {
            seen += 1;
            if seen == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(ticks, 5);
        assert!(world.state().elapsed() > 0.0);
        assert!(!clock.stop_handle().load(Ordering::SeqCst));
    }
}
