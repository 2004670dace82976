//! Notifications module
//!
//! Broadcasts charging session activity to dashboard clients: user-facing
//! messages, appended charging events, status and charge-level changes.
//!
//! # Usage
//! ```ignore
//! use fleet_charging::notifications::{create_event_bus, Event, NotificationEvent, NotificationLevel};
//! use chrono::Utc;
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.publish(Event::Notification(NotificationEvent {
//!     vehicle_id: "k173x8f9g2h1".to_string(),
//!     level: NotificationLevel::Success,
//!     message: "Car plugged in".to_string(),
//!     timestamp: Utc::now(),
//! }));
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
