//! Fleet-wide broadcast of session activity
//!
//! Every charging session publishes onto one [`EventBus`]. A dashboard
//! watching the whole fleet takes [`EventBus::subscribe`]; one following a
//! single car takes [`EventBus::subscribe_vehicle`] and never sees the
//! other sessions' traffic.

use std::sync::Arc;

use log::{trace, warn};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::events::{Event, EventMessage};

/// Messages buffered per subscriber before the slowest one starts missing events
const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Stamp and broadcast `event`. Returns how many subscribers it reached.
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let kind = message.event.event_type();
        let vehicle_id = message.event.vehicle_id().to_string();

        let delivered = self.sender.send(message).unwrap_or(0);
        trace!("{} for {} delivered to {} subscriber(s)", kind, vehicle_id, delivered);
        delivered
    }

    /// Feed of every vehicle's events
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            vehicle_id: None,
            missed: 0,
        }
    }

    /// Feed of the events published for `vehicle_id` only
    pub fn subscribe_vehicle(&self, vehicle_id: impl Into<String>) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            vehicle_id: Some(vehicle_id.into()),
            missed: 0,
        }
    }

    /// Live feeds, dropped subscribers excluded
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the bus, optionally narrowed to a vehicle
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    vehicle_id: Option<String>,
    missed: u64,
}

impl EventSubscriber {
    /// Vehicle this feed is narrowed to, if any
    pub fn vehicle_id(&self) -> Option<&str> {
        self.vehicle_id.as_deref()
    }

    /// Events dropped because this feed fell behind the bus
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.wants(&message.event) => return Some(message),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => self.fell_behind(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already on the bus, without waiting
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if self.wants(&message.event) => return Some(message),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => self.fell_behind(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    fn wants(&self, event: &Event) -> bool {
        self.vehicle_id
            .as_deref()
            .map_or(true, |vehicle_id| event.vehicle_id() == vehicle_id)
    }

    fn fell_behind(&mut self, skipped: u64) {
        self.missed += skipped;
        warn!(
            "Event feed for {} fell behind, {} event(s) lost",
            self.vehicle_id.as_deref().unwrap_or("all vehicles"),
            skipped
        );
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::notifications::events::{ChargeLevelChangedEvent, NotificationEvent, NotificationLevel};

    fn toast(vehicle_id: &str, message: &str) -> Event {
        Event::Notification(NotificationEvent {
            vehicle_id: vehicle_id.to_string(),
            level: NotificationLevel::Info,
            message: message.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        })
    }

    fn charge_level(vehicle_id: &str, state_of_charge: f64) -> Event {
        Event::ChargeLevelChanged(ChargeLevelChangedEvent {
            vehicle_id: vehicle_id.to_string(),
            state_of_charge,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 1).unwrap(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn vehicle_feed_skips_other_vehicles() {
        let bus = EventBus::new();
        let mut kevin = bus.subscribe_vehicle("veh-1");
        let mut fleet = bus.subscribe();

        bus.publish(toast("veh-2", "Car plugged in"));
        bus.publish(charge_level("veh-1", 50.1));

        let message = kevin.recv().await.unwrap();
        assert_eq!(message.event.vehicle_id(), "veh-1");
        assert_eq!(message.event.event_type(), "charge_level_changed");
        assert!(kevin.try_recv().is_none());

        assert_eq!(fleet.try_recv().unwrap().event.vehicle_id(), "veh-2");
        assert_eq!(fleet.try_recv().unwrap().event.vehicle_id(), "veh-1");
        assert!(fleet.try_recv().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn feed_ends_when_the_bus_is_dropped() {
        let bus = EventBus::new();
        let mut feed = bus.subscribe_vehicle("veh-1");
        bus.publish(toast("veh-2", "Car plugged in"));

        drop(bus);
        assert!(feed.recv().await.is_none());
    }

    #[test]
    fn publish_reports_live_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(toast("veh-1", "nobody listening")), 0);

        let all = bus.subscribe();
        let one = bus.subscribe_vehicle("veh-9");
        assert_eq!(one.vehicle_id(), Some("veh-9"));
        assert_eq!(all.vehicle_id(), None);
        // A narrowed feed still counts as a receiver of the channel.
        assert_eq!(bus.publish(toast("veh-1", "hello")), 2);

        drop(all);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn slow_feed_counts_what_it_missed() {
        let bus = EventBus::with_capacity(2);
        let mut feed = bus.subscribe_vehicle("veh-1");

        for percent in [50.0, 50.1, 50.2, 50.3, 50.4] {
            bus.publish(charge_level("veh-1", percent));
        }

        let mut levels = Vec::new();
        while let Some(message) = feed.try_recv() {
            if let Event::ChargeLevelChanged(level) = message.event {
                levels.push(level.state_of_charge);
            }
        }
        assert_eq!(levels, vec![50.3, 50.4]);
        assert_eq!(feed.missed(), 3);
    }
}
