//! Charging state machine.
//!
//! [`charging_states_reducer`] is a pure function over
//! [`ChargingStateWithEvents`]: it never mutates its input, performs no I/O,
//! and every transition yields the new charger state together with exactly
//! one audit event. Actions that do not apply to the current state return
//! the input unchanged.

use chrono::{DateTime, Days, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::action::ChargingAction;
use super::event::{ChargingEvent, ChargingEventType, EventDetails, EventHistory};
use super::state::{ChargerState, OverrideCharge, ScheduledCharge};

/// Simulated charging speed, in percent per second
pub const CHARGE_RATE_PER_SECOND: f64 = 0.1;
/// Target of automatically scheduled charges
pub const OPTIMAL_CHARGE_PERCENT: f64 = 85.0;
pub const MAXIMUM_CHARGE_PERCENT: f64 = 100.0;
/// Length of a user-forced charge window
pub const OVERRIDE_DURATION_MINUTES: i64 = 60;
/// Delay between scheduling a charge and its start (0.1 minutes)
pub const SCHEDULE_LEAD_SECONDS: i64 = 6;
/// Hour of the day at which a suspended schedule resumes
pub const RESUME_HOUR: i64 = 6;

/// Seconds needed to go from `current_percent` to `target_percent`.
///
/// Negative when the target is below the current charge; not clamped.
pub fn estimate_charge_duration_seconds(current_percent: f64, target_percent: f64) -> f64 {
    (target_percent - current_percent) / CHARGE_RATE_PER_SECOND
}

/// Next calendar day at 06:00:00.000, in the time zone of `now`.
///
/// `None` when that day is past the last representable date.
pub fn next_resume_time<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let tomorrow = now.date_naive().checked_add_days(Days::new(1))?;
    let resume = tomorrow
        .and_time(NaiveTime::default())
        .checked_add_signed(Duration::try_hours(RESUME_HOUR)?)?;

    tz.from_local_datetime(&resume)
        .earliest()
        .or_else(|| Some(tz.from_utc_datetime(&resume)))
}

/// `true` for a battery level a schedule can be planned from
fn is_valid_charge(percent: f64) -> bool {
    percent.is_finite() && (0.0..=MAXIMUM_CHARGE_PERCENT).contains(&percent)
}

/// Charger state and its audit log, updated together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStateWithEvents {
    pub charger_state: ChargerState,
    pub event_history: EventHistory,
    /// Sequence number given to the next appended event
    next_sequence: u64,
}

impl ChargingStateWithEvents {
    pub fn new(charger_state: ChargerState, event_history: EventHistory) -> Self {
        Self {
            charger_state,
            event_history,
            next_sequence: 0,
        }
    }

    /// Unplugged charger with an empty history capped at `history_cap`
    pub fn unplugged(history_cap: Option<usize>) -> Self {
        Self::new(ChargerState::Unplugged, EventHistory::new(history_cap))
    }

    /// Events appended over the lifetime of this state, including ones
    /// since dropped from the capped history
    pub fn recorded_events(&self) -> u64 {
        self.next_sequence
    }

    fn record(&self, charger_state: ChargerState, draft: EventDraft) -> Self {
        let mut event = ChargingEvent::new(
            self.next_sequence,
            draft.at,
            draft.event_type,
            draft.description,
        );
        if let Some(details) = draft.details {
            event = event.with_details(details);
        }

        let mut event_history = self.event_history.clone();
        event_history.push(event);

        Self {
            charger_state,
            event_history,
            next_sequence: self.next_sequence + 1,
        }
    }
}

impl Default for ChargingStateWithEvents {
    fn default() -> Self {
        Self::new(ChargerState::Unplugged, EventHistory::default())
    }
}

struct EventDraft {
    at: DateTime<Utc>,
    event_type: ChargingEventType,
    description: String,
    details: Option<EventDetails>,
}

impl EventDraft {
    fn new(at: DateTime<Utc>, event_type: ChargingEventType, description: impl Into<String>) -> Self {
        Self {
            at,
            event_type,
            description: description.into(),
            details: None,
        }
    }

    fn details(mut self, details: EventDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// Apply `action` to `state`, returning the next state
pub fn charging_states_reducer(
    state: &ChargingStateWithEvents,
    action: &ChargingAction,
) -> ChargingStateWithEvents {
    match transition(&state.charger_state, action) {
        Some((next, draft)) => state.record(next, draft),
        None => state.clone(),
    }
}

fn transition(current: &ChargerState, action: &ChargingAction) -> Option<(ChargerState, EventDraft)> {
    use ChargingEventType as Kind;

    match action {
        ChargingAction::UnplugCar { at } => {
            let description = if current.is_charging() {
                "Vehicle unplugged - charging stopped"
            } else {
                "Vehicle unplugged"
            };
            Some((
                ChargerState::Unplugged,
                EventDraft::new(*at, Kind::Connection, description),
            ))
        }

        ChargingAction::PlugInCar { at } => match current {
            ChargerState::Unplugged => Some((
                ChargerState::Idle,
                EventDraft::new(*at, Kind::Connection, "Vehicle plugged in"),
            )),
            _ => None,
        },

        ChargingAction::TriggerOverride { at } => {
            let charge = OverrideCharge {
                start_time: *at,
                end_time: at.checked_add_signed(Duration::try_minutes(OVERRIDE_DURATION_MINUTES)?)?,
            };
            let draft = EventDraft::new(*at, Kind::Override, "Override charging started").details(
                EventDetails {
                    start_time: Some(charge.start_time),
                    end_time: Some(charge.end_time),
                    ..EventDetails::default()
                },
            );
            Some((ChargerState::ChargingOverride { charge }, draft))
        }

        ChargingAction::CancelOverrideCharge { at } => {
            let (start_time, end_time) = charging_window(current)?;
            let draft = EventDraft::new(*at, Kind::Charging, "Charging stopped").details(EventDetails {
                start_time: Some(start_time),
                end_time: Some(end_time),
                ..EventDetails::default()
            });
            Some((ChargerState::Idle, draft))
        }

        ChargingAction::CancelScheduledCharge { at } => {
            let suspended_until = next_resume_time(at)?;
            let draft = EventDraft::new(
                *at,
                Kind::Schedule,
                format!(
                    "Scheduled charging suspended until {}",
                    suspended_until.format("%Y-%m-%d %H:%M")
                ),
            )
            .details(EventDetails {
                suspended_until: Some(suspended_until),
                ..EventDetails::default()
            });
            Some((ChargerState::ScheduleSuspended { suspended_until }, draft))
        }

        ChargingAction::ScheduleCharge { at, car_state } => {
            if !is_valid_charge(car_state.state_of_charge) {
                return None;
            }
            let start_time = at.checked_add_signed(Duration::try_seconds(SCHEDULE_LEAD_SECONDS)?)?;
            let seconds =
                estimate_charge_duration_seconds(car_state.state_of_charge, OPTIMAL_CHARGE_PERCENT);
            let window = Duration::try_milliseconds((seconds * 1000.0).round() as i64)?;
            let end_time = start_time.checked_add_signed(window)?;
            let charge = ScheduledCharge {
                start_time,
                end_time,
                target_charge_percent: OPTIMAL_CHARGE_PERCENT,
            };
            let draft = EventDraft::new(
                *at,
                Kind::Schedule,
                format!("Charging scheduled for {}", start_time.format("%H:%M")),
            )
            .details(EventDetails {
                target_charge: Some(OPTIMAL_CHARGE_PERCENT),
                current_charge: Some(car_state.state_of_charge),
                start_time: Some(start_time),
                end_time: Some(end_time),
                ..EventDetails::default()
            });
            Some((ChargerState::AwaitingScheduledCharge { charge }, draft))
        }

        ChargingAction::StartScheduledCharge { at } => match current {
            ChargerState::AwaitingScheduledCharge { charge } => {
                let draft = EventDraft::new(*at, Kind::Charging, "Scheduled charging started").details(
                    EventDetails {
                        target_charge: Some(charge.target_charge_percent),
                        start_time: Some(charge.start_time),
                        end_time: Some(charge.end_time),
                        ..EventDetails::default()
                    },
                );
                Some((
                    ChargerState::ChargingScheduled {
                        charge: charge.clone(),
                    },
                    draft,
                ))
            }
            _ => None,
        },

        ChargingAction::ResumeFromSuspension { at } => Some((
            ChargerState::Idle,
            EventDraft::new(*at, Kind::Schedule, "Schedule suspension expired"),
        )),

        ChargingAction::CompleteCharge { at, state_of_charge } => {
            let target_charge = match current {
                ChargerState::ChargingScheduled { charge } => Some(charge.target_charge_percent),
                ChargerState::ChargingOverride { .. } => None,
                _ => return None,
            };
            let description = if *state_of_charge >= MAXIMUM_CHARGE_PERCENT {
                "Charging complete - 100% charged".to_string()
            } else {
                format!(
                    "Target charge of {}% reached",
                    target_charge.unwrap_or(MAXIMUM_CHARGE_PERCENT)
                )
            };
            let draft = EventDraft::new(*at, Kind::Completion, description).details(EventDetails {
                target_charge,
                current_charge: Some(*state_of_charge),
                ..EventDetails::default()
            });
            Some((ChargerState::Idle, draft))
        }

        ChargingAction::Unknown => None,
    }
}

/// Window of the active charge, if the charger is charging
fn charging_window(state: &ChargerState) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match state {
        ChargerState::ChargingScheduled { charge } => Some((charge.start_time, charge.end_time)),
        ChargerState::ChargingOverride { charge } => Some((charge.start_time, charge.end_time)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::charging::ChargerStatus;
    use crate::domain::vehicle::CarState;
    use chrono::FixedOffset;

    fn mock_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn mock_car_state() -> CarState {
        CarState::new("Test Car", "Test", 50.0)
    }

    fn with_state(charger_state: ChargerState) -> ChargingStateWithEvents {
        ChargingStateWithEvents::new(charger_state, EventHistory::unbounded())
    }

    fn scheduled_charge() -> ScheduledCharge {
        ScheduledCharge {
            start_time: mock_timestamp(),
            end_time: mock_timestamp() + Duration::minutes(30),
            target_charge_percent: 85.0,
        }
    }

    fn override_charge() -> OverrideCharge {
        OverrideCharge {
            start_time: mock_timestamp(),
            end_time: mock_timestamp() + Duration::minutes(60),
        }
    }

    fn all_states() -> Vec<ChargerState> {
        vec![
            ChargerState::Unplugged,
            ChargerState::Idle,
            ChargerState::AwaitingScheduledCharge { charge: scheduled_charge() },
            ChargerState::ChargingScheduled { charge: scheduled_charge() },
            ChargerState::ChargingOverride { charge: override_charge() },
            ChargerState::ScheduleSuspended { suspended_until: mock_timestamp() },
        ]
    }

    #[test]
    fn estimates_charge_duration() {
        assert_eq!(estimate_charge_duration_seconds(50.0, 85.0), 350.0);
        assert_eq!(estimate_charge_duration_seconds(99.0, 100.0), 10.0);
        assert_eq!(estimate_charge_duration_seconds(85.0, 85.0), 0.0);
        assert!((estimate_charge_duration_seconds(50.5, 75.3) - 248.0).abs() < 0.1);
    }

    #[test]
    fn negative_duration_is_not_clamped() {
        assert_eq!(estimate_charge_duration_seconds(80.0, 70.0), -100.0);
    }

    #[test]
    fn unplug_from_any_state_appends_one_connection_event() {
        let action = ChargingAction::UnplugCar { at: mock_timestamp() };

        for charger_state in all_states() {
            let result = charging_states_reducer(&with_state(charger_state), &action);
            assert_eq!(result.charger_state, ChargerState::Unplugged);
            assert_eq!(result.event_history.len(), 1);
            assert_eq!(
                result.event_history.latest().unwrap().event_type,
                ChargingEventType::Connection
            );
        }
    }

    #[test]
    fn unplug_while_charging_mentions_stop() {
        let state = with_state(ChargerState::ChargingOverride { charge: override_charge() });
        let result = charging_states_reducer(&state, &ChargingAction::UnplugCar { at: mock_timestamp() });

        assert_eq!(
            result.event_history.latest().unwrap().description,
            "Vehicle unplugged - charging stopped"
        );
    }

    #[test]
    fn plug_in_moves_unplugged_to_idle() {
        let result = charging_states_reducer(
            &with_state(ChargerState::Unplugged),
            &ChargingAction::PlugInCar { at: mock_timestamp() },
        );

        assert_eq!(result.charger_state, ChargerState::Idle);
        assert_eq!(result.event_history.len(), 1);
        assert_eq!(
            result.event_history.latest().unwrap().event_type,
            ChargingEventType::Connection
        );
    }

    #[test]
    fn plug_in_when_already_plugged_is_a_no_op() {
        let state = with_state(ChargerState::ChargingOverride { charge: override_charge() });
        let result = charging_states_reducer(&state, &ChargingAction::PlugInCar { at: mock_timestamp() });
        assert_eq!(result, state);
    }

    #[test]
    fn trigger_override_opens_sixty_minute_window() {
        let result = charging_states_reducer(
            &with_state(ChargerState::Idle),
            &ChargingAction::TriggerOverride { at: mock_timestamp() },
        );

        match &result.charger_state {
            ChargerState::ChargingOverride { charge } => {
                assert_eq!(charge.start_time, mock_timestamp());
                assert_eq!(charge.end_time, mock_timestamp() + Duration::minutes(60));
            }
            other => panic!("unexpected state {other:?}"),
        }
        let event = result.event_history.latest().unwrap();
        assert_eq!(event.event_type, ChargingEventType::Override);
        assert_eq!(
            event.details.as_ref().and_then(|d| d.end_time),
            Some(mock_timestamp() + Duration::minutes(60))
        );
    }

    #[test]
    fn cancel_override_returns_to_idle() {
        for charger_state in [
            ChargerState::ChargingOverride { charge: override_charge() },
            ChargerState::ChargingScheduled { charge: scheduled_charge() },
        ] {
            let result = charging_states_reducer(
                &with_state(charger_state),
                &ChargingAction::CancelOverrideCharge { at: mock_timestamp() },
            );
            assert_eq!(result.charger_state, ChargerState::Idle);
            assert_eq!(result.event_history.len(), 1);
            assert_eq!(
                result.event_history.latest().unwrap().event_type,
                ChargingEventType::Charging
            );
        }
    }

    #[test]
    fn cancel_override_outside_charging_is_a_no_op() {
        let state = with_state(ChargerState::Idle);
        let result =
            charging_states_reducer(&state, &ChargingAction::CancelOverrideCharge { at: mock_timestamp() });
        assert_eq!(result, state);
    }

    #[test]
    fn cancel_scheduled_suspends_until_tomorrow_six_am() {
        let result = charging_states_reducer(
            &with_state(ChargerState::Idle),
            &ChargingAction::CancelScheduledCharge { at: mock_timestamp() },
        );

        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 6, 0, 0).unwrap();
        assert_eq!(
            result.charger_state,
            ChargerState::ScheduleSuspended { suspended_until: expected }
        );
        let event = result.event_history.latest().unwrap();
        assert_eq!(event.event_type, ChargingEventType::Schedule);
        assert_eq!(event.details.as_ref().and_then(|d| d.suspended_until), Some(expected));
    }

    #[test]
    fn resume_time_keeps_the_callers_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();

        let resume = next_resume_time(&now).unwrap();

        assert_eq!(resume, tz.with_ymd_and_hms(2025, 1, 1, 6, 0, 0).unwrap());
        assert_eq!(resume.offset(), &tz);
    }

    #[test]
    fn schedule_charge_plans_window_to_optimal_target() {
        let result = charging_states_reducer(
            &with_state(ChargerState::Idle),
            &ChargingAction::ScheduleCharge {
                at: mock_timestamp(),
                car_state: mock_car_state(),
            },
        );

        let expected_start = mock_timestamp() + Duration::seconds(6);
        match &result.charger_state {
            ChargerState::AwaitingScheduledCharge { charge } => {
                assert_eq!(charge.start_time, expected_start);
                assert_eq!(charge.end_time, expected_start + Duration::seconds(350));
                assert_eq!(charge.target_charge_percent, 85.0);
            }
            other => panic!("unexpected state {other:?}"),
        }
        let event = result.event_history.latest().unwrap();
        assert_eq!(event.event_type, ChargingEventType::Schedule);
        assert_eq!(event.details.as_ref().and_then(|d| d.current_charge), Some(50.0));
    }

    #[test]
    fn start_scheduled_charge_keeps_the_window() {
        let charge = scheduled_charge();
        let result = charging_states_reducer(
            &with_state(ChargerState::AwaitingScheduledCharge { charge: charge.clone() }),
            &ChargingAction::StartScheduledCharge { at: mock_timestamp() },
        );

        assert_eq!(result.charger_state, ChargerState::ChargingScheduled { charge });
        assert_eq!(result.event_history.len(), 1);
        assert_eq!(
            result.event_history.latest().unwrap().event_type,
            ChargingEventType::Charging
        );
    }

    #[test]
    fn start_scheduled_charge_when_idle_is_a_no_op() {
        let state = with_state(ChargerState::Idle);
        let result =
            charging_states_reducer(&state, &ChargingAction::StartScheduledCharge { at: mock_timestamp() });

        assert_eq!(result, state);
        assert!(result.event_history.is_empty());
    }

    #[test]
    fn resume_from_suspension_returns_to_idle() {
        let result = charging_states_reducer(
            &with_state(ChargerState::ScheduleSuspended { suspended_until: mock_timestamp() }),
            &ChargingAction::ResumeFromSuspension { at: mock_timestamp() },
        );

        assert_eq!(result.charger_state, ChargerState::Idle);
        assert_eq!(
            result.event_history.latest().unwrap().event_type,
            ChargingEventType::Schedule
        );
    }

    #[test]
    fn complete_charge_records_completion() {
        let result = charging_states_reducer(
            &with_state(ChargerState::ChargingScheduled { charge: scheduled_charge() }),
            &ChargingAction::CompleteCharge {
                at: mock_timestamp(),
                state_of_charge: 85.0,
            },
        );

        assert_eq!(result.charger_state, ChargerState::Idle);
        let event = result.event_history.latest().unwrap();
        assert_eq!(event.event_type, ChargingEventType::Completion);
        assert_eq!(event.description, "Target charge of 85% reached");
        assert_eq!(event.details.as_ref().and_then(|d| d.target_charge), Some(85.0));
    }

    #[test]
    fn complete_charge_outside_charging_is_a_no_op() {
        let state = with_state(ChargerState::Idle);
        let result = charging_states_reducer(
            &state,
            &ChargingAction::CompleteCharge {
                at: mock_timestamp(),
                state_of_charge: 100.0,
            },
        );
        assert_eq!(result, state);
    }

    #[test]
    fn does_not_mutate_the_input() {
        let state = with_state(ChargerState::Unplugged);
        let snapshot = state.clone();

        let result = charging_states_reducer(&state, &ChargingAction::PlugInCar { at: mock_timestamp() });

        assert_ne!(result, state);
        assert_eq!(state, snapshot);
        assert!(state.event_history.is_empty());
    }

    #[test]
    fn unknown_action_returns_state_unchanged() {
        let state = with_state(ChargerState::Idle);
        let action = ChargingAction::from_json(r#"{"type":"INVALID_ACTION"}"#).unwrap();

        assert_eq!(charging_states_reducer(&state, &action), state);
    }

    #[test]
    fn override_survives_any_elapsed_time_until_unplugged() {
        let t0 = mock_timestamp();
        let mut state = ChargingStateWithEvents::default();

        state = charging_states_reducer(&state, &ChargingAction::PlugInCar { at: t0 });
        assert_eq!(state.charger_state.status(), ChargerStatus::Idle);

        state = charging_states_reducer(
            &state,
            &ChargingAction::TriggerOverride { at: t0 + Duration::days(3) },
        );
        assert_eq!(state.charger_state.status(), ChargerStatus::ChargingOverride);

        state = charging_states_reducer(
            &state,
            &ChargingAction::UnplugCar { at: t0 + Duration::days(30) },
        );
        assert_eq!(state.charger_state.status(), ChargerStatus::Unplugged);
        assert_eq!(state.event_history.len(), 3);
    }

    #[test]
    fn handles_complex_transition_sequence() {
        let at = mock_timestamp();
        let steps = [
            (ChargingAction::PlugInCar { at }, ChargerStatus::Idle),
            (ChargingAction::TriggerOverride { at }, ChargerStatus::ChargingOverride),
            (ChargingAction::CancelOverrideCharge { at }, ChargerStatus::Idle),
            (ChargingAction::CancelScheduledCharge { at }, ChargerStatus::ScheduleSuspended),
            (ChargingAction::ResumeFromSuspension { at }, ChargerStatus::Idle),
        ];

        let mut state = ChargingStateWithEvents::default();
        for (action, expected) in steps {
            state = charging_states_reducer(&state, &action);
            assert_eq!(state.charger_state.status(), expected, "after {}", action.name());
        }

        let ids: Vec<_> = state.event_history.iter().map(|e| e.id.clone()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), 5);
        assert_eq!(unique.len(), 5, "event ids must be unique: {ids:?}");
    }

    #[test]
    fn history_cap_drops_the_oldest_event() {
        let at = mock_timestamp();
        let mut state = ChargingStateWithEvents::unplugged(Some(50));
        for i in 0..51 {
            state = charging_states_reducer(
                &state,
                &ChargingAction::UnplugCar { at: at + Duration::seconds(i) },
            );
        }

        assert_eq!(state.event_history.len(), 50);
        assert_eq!(
            state.event_history.iter().last().unwrap().timestamp,
            at + Duration::seconds(1)
        );
        assert_eq!(state.event_history.latest().unwrap().timestamp, at + Duration::seconds(50));
    }

    #[test]
    fn schedule_with_out_of_range_charge_is_a_no_op() {
        let state = with_state(ChargerState::Idle);
        for state_of_charge in [1e15, -0.5, 100.5, f64::NAN, f64::INFINITY] {
            let action = ChargingAction::ScheduleCharge {
                at: mock_timestamp(),
                car_state: CarState::new("Test Car", "Test", state_of_charge),
            };
            assert_eq!(charging_states_reducer(&state, &action), state, "charge {state_of_charge}");
        }
    }

    #[test]
    fn schedule_from_json_with_huge_charge_is_a_no_op() {
        let state = with_state(ChargerState::Idle);
        let action = ChargingAction::from_json(
            r#"{
                "type": "SCHEDULE_CHARGE",
                "at": "2024-01-01T12:00:00Z",
                "car_state": { "model": "Test Car", "nickname": "Test", "state_of_charge": 1e15 }
            }"#,
        )
        .unwrap();

        assert_eq!(charging_states_reducer(&state, &action), state);
    }

    #[test]
    fn timestamps_at_the_end_of_time_are_a_no_op() {
        let state = with_state(ChargerState::Idle);
        let last = DateTime::<Utc>::MAX_UTC;
        let late = ChargingAction::from_json(
            r#"{"type":"CANCEL_SCHEDULED_CHARGE","at":"+262142-12-31T12:00:00Z"}"#,
        )
        .unwrap();

        let actions = [
            late,
            ChargingAction::CancelScheduledCharge { at: last },
            ChargingAction::TriggerOverride { at: last },
            ChargingAction::ScheduleCharge { at: last, car_state: mock_car_state() },
        ];
        for action in actions {
            assert_eq!(charging_states_reducer(&state, &action), state, "{}", action.name());
        }
        assert_eq!(next_resume_time(&last), None);
    }
}
