//! Charging audit events and the capped, newest-first history holding them.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of events kept in a session's history
pub const DEFAULT_EVENT_HISTORY_CAP: usize = 50;

/// Category of a charging event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargingEventType {
    Connection,
    Charging,
    Schedule,
    Override,
    Completion,
}

impl ChargingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Charging => "charging",
            Self::Schedule => "schedule",
            Self::Override => "override",
            Self::Completion => "completion",
        }
    }
}

/// Numeric and time details attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_until: Option<DateTime<Utc>>,
}

/// One entry of the charging audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingEvent {
    /// `"{unix_millis}-{sequence}"`
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: ChargingEventType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EventDetails>,
}

impl ChargingEvent {
    pub fn new(
        sequence: u64,
        timestamp: DateTime<Utc>,
        event_type: ChargingEventType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", timestamp.timestamp_millis(), sequence),
            timestamp,
            event_type,
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Append-only event log, newest first, optionally capped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHistory {
    events: VecDeque<ChargingEvent>,
    cap: Option<usize>,
}

impl EventHistory {
    /// History keeping at most `cap` events; `None` keeps everything
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            events: VecDeque::new(),
            cap,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn cap(&self) -> Option<usize> {
        self.cap
    }

    /// Prepend an event, dropping the oldest ones beyond the cap
    pub fn push(&mut self, event: ChargingEvent) {
        self.events.push_front(event);
        if let Some(cap) = self.cap {
            self.events.truncate(cap);
        }
    }

    pub fn latest(&self) -> Option<&ChargingEvent> {
        self.events.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChargingEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_vec(&self) -> Vec<ChargingEvent> {
        self.events.iter().cloned().collect()
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new(Some(DEFAULT_EVENT_HISTORY_CAP))
    }
}
