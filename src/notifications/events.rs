//! Notification events
//!
//! Defines everything a charging session broadcasts to dashboard clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChargerStatus, ChargingEvent};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// User-facing message (toast)
    Notification(NotificationEvent),
    /// A charging event was appended to a session's history
    ChargingEventRecorded(ChargingEventRecorded),
    /// Charger status changed
    ChargerStatusChanged(ChargerStatusChangedEvent),
    /// Battery level advanced by one tick
    ChargeLevelChanged(ChargeLevelChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Notification(_) => "notification",
            Event::ChargingEventRecorded(_) => "charging_event_recorded",
            Event::ChargerStatusChanged(_) => "charger_status_changed",
            Event::ChargeLevelChanged(_) => "charge_level_changed",
        }
    }

    pub fn vehicle_id(&self) -> &str {
        match self {
            Event::Notification(e) => &e.vehicle_id,
            Event::ChargingEventRecorded(e) => &e.vehicle_id,
            Event::ChargerStatusChanged(e) => &e.vehicle_id,
            Event::ChargeLevelChanged(e) => &e.vehicle_id,
        }
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub vehicle_id: String,
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargingEventRecorded {
    pub vehicle_id: String,
    pub event: ChargingEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerStatusChangedEvent {
    pub vehicle_id: String,
    pub old_status: ChargerStatus,
    pub new_status: ChargerStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeLevelChangedEvent {
    pub vehicle_id: String,
    pub state_of_charge: f64,
    pub timestamp: DateTime<Utc>,
}

/// Event wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Unique message ID
    pub id: String,
    /// Event payload
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_type_and_data() {
        let message = EventMessage::new(Event::Notification(NotificationEvent {
            vehicle_id: "veh-1".to_string(),
            level: NotificationLevel::Success,
            message: "Car plugged in".to_string(),
            timestamp: Utc::now(),
        }));

        let json: serde_json::Value = serde_json::from_str(&message.to_json()).unwrap();
        assert_eq!(json["type"], "Notification");
        assert_eq!(json["data"]["level"], "success");
        assert_eq!(json["data"]["message"], "Car plugged in");
        assert_eq!(message.event.vehicle_id(), "veh-1");
    }
}
