//! PollScheduler: the data poll and the UI ticker behind one owner.
//!
//! Both timers belong to the scheduler value, so dropping it stops both.
//! The poll's first tick fires immediately; missed ticks are skipped rather
//! than replayed in a burst.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleEvent {
    /// Time to refetch the lead snapshot.
    Poll,
    /// Advance the view's notion of "now". Never implies a network call.
    Tick(DateTime<Utc>),
}

pub struct PollScheduler {
    poll: Interval,
    tick: Interval,
}

impl PollScheduler {
    /// Must be called inside a tokio runtime.
    pub fn new(poll_every: Duration, tick_every: Duration) -> Self {
        let mut poll = interval(poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick = interval(tick_every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { poll, tick }
    }

    /// Wait for whichever timer is due next. Cancel-safe, so it can sit in a
    /// `select!` next to other event sources.
    pub async fn next(&mut self) -> ScheduleEvent {
        tokio::select! {
            biased;
            _ = self.poll.tick() => ScheduleEvent::Poll,
            _ = self.tick.tick() => ScheduleEvent::Tick(Utc::now()),
        }
    }

    /// Restart the poll period from now, e.g. after a manual reload.
    pub fn reset_poll(&mut self) {
        self.poll.reset();
    }
}
