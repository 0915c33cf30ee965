use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::{change_event::ChangeEvent, direction::Direction};
use crate::ports::change_source::EventSink;

/// Emits a poll event for `direction` every `interval`, starting immediately.
///
/// Ticks that would pile up behind a slow consumer are delayed rather than burst.
#[derive(Debug, Clone, Copy)]
pub struct PollTrigger {
    interval: Duration,
    direction: Direction,
}

impl PollTrigger {
    pub fn new(interval: Duration, direction: Direction) -> Self {
        Self {
            interval,
            direction,
        }
    }

    pub fn spawn(self, sink: EventSink, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Polling {} every {}s",
                self.direction,
                self.interval.as_secs_f64()
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    true = async { shutdown.wait_for(|&stop| stop).await.is_ok() } => break,
                    _ = ticker.tick() => {
                        debug!("Poll tick for {}", self.direction);
                        if !sink.send(ChangeEvent::poll(self.direction)).await {
                            break;
                        }
                    }
                }
            }

            debug!("Poll trigger for {} stopped", self.direction);
        })
    }
}
