//! Session timer
//!
//! Emits a tick every interval while the content view is open. The timer
//! only signals; crediting time happens on the task that owns the tracker.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Whether the timer is producing ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

/// One elapsed interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    /// Run that produced the tick; ticks from earlier runs are stale
    pub generation: u64,
}

/// Interval-driven tick source with explicit start/stop
#[derive(Debug)]
pub struct SessionTimer {
    period: Duration,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl SessionTimer {
    /// Create a stopped timer
    pub fn new(period: Duration) -> Self {
        Self { period, generation: 0, cancel: None }
    }

    pub fn state(&self) -> TimerState {
        if self.cancel.is_some() { TimerState::Running } else { TimerState::Stopped }
    }

    /// Start ticking into `tx`; returns false if already running
    ///
    /// Must be called from within a tokio runtime. The first tick arrives one
    /// full period after starting.
    pub fn start(&mut self, tx: mpsc::UnboundedSender<TimerTick>) -> bool {
        if self.cancel.is_some() {
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    _ = task_token.cancelled() => break,

                    _ = interval.tick() => {
                        // Receiver dropped, nobody is listening
                        if tx.send(TimerTick { generation }).is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Session timer run {} finished", generation);
        });

        self.cancel = Some(token);
        debug!("Session timer run {} started ({:?})", generation, period);
        true
    }

    /// Stop ticking; returns false if already stopped
    pub fn stop(&mut self) -> bool {
        match self.cancel.take() {
            Some(token) => {
                token.cancel();
                debug!("Session timer run {} stopped", self.generation);
                true
            }
            None => false,
        }
    }

    /// Whether a tick belongs to the current run
    pub fn is_current(&self, tick: &TimerTick) -> bool {
        self.cancel.is_some() && tick.generation == self.generation
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_stopped() {
        let timer = SessionTimer::new(Duration::from_secs(60));
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SessionTimer::new(Duration::from_secs(60));
        let started = Instant::now();

        assert!(timer.start(tx));
        assert_eq!(timer.state(), TimerState::Running);

        let tick = rx.recv().await.unwrap();
        assert!(timer.is_current(&tick));
        assert_eq!(started.elapsed(), Duration::from_secs(60));

        rx.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_is_noop() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = SessionTimer::new(Duration::from_secs(60));
        assert!(timer.start(tx.clone()));
        assert!(!timer.start(tx));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_tick_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SessionTimer::new(Duration::from_secs(60));
        timer.start(tx);

        assert!(timer.stop());
        assert!(!timer.stop());
        assert_eq!(timer.state(), TimerState::Stopped);

        // The task drops its sender on exit
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut timer = SessionTimer::new(Duration::from_secs(60));
            timer.start(tx);
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_from_earlier_runs_are_stale() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = SessionTimer::new(Duration::from_secs(60));

        timer.start(tx.clone());
        let old = rx.recv().await.unwrap();
        timer.stop();
        assert!(!timer.is_current(&old));

        timer.start(tx);
        assert!(!timer.is_current(&old));
        let fresh = rx.recv().await.unwrap();
        assert!(timer.is_current(&fresh));
    }
}
