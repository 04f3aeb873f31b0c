//! Scenario timeline: one-shot, time-stamped world-generation events.
//!
//! Events are consumed strictly in trigger-time order; events sharing a
//! trigger time keep their authoring order (stations before offers, each in
//! script order). A consumed event is gone for good.

use std::collections::VecDeque;
use std::time::Duration;

use glam::DVec2;

use metro_core::enums::StationType;
use metro_core::types::ElementOption;

use crate::scenario::ScenarioDefinition;

#[derive(Debug, Clone, PartialEq)]
pub enum TimelinePayload {
    StationApparition {
        position: DVec2,
        station_type: StationType,
    },
    ElementChoiceOffer {
        options: Vec<ElementOption>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub trigger_time: Duration,
    pub payload: TimelinePayload,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioTimeline {
    events: VecDeque<TimedEvent>,
}

impl ScenarioTimeline {
    /// Build from events in authoring order.
    pub fn new(events: impl IntoIterator<Item = TimedEvent>) -> Self {
        let mut events: Vec<TimedEvent> = events.into_iter().collect();
        // Stable sort keeps authoring order among equal trigger times.
        events.sort_by_key(|e| e.trigger_time);
        Self {
            events: events.into(),
        }
    }

    pub fn from_scenario(scenario: &ScenarioDefinition) -> Self {
        let stations = scenario.stations.iter().map(|s| TimedEvent {
            trigger_time: s.at,
            payload: TimelinePayload::StationApparition {
                position: s.position,
                station_type: s.station_type,
            },
        });
        let offers = scenario.element_choices.iter().map(|c| TimedEvent {
            trigger_time: c.at,
            payload: TimelinePayload::ElementChoiceOffer {
                options: c.options.clone(),
            },
        });
        Self::new(stations.chain(offers))
    }

    /// Whether the earliest remaining event is due at `at`. Consumes nothing.
    pub fn peek_due(&self, at: Duration) -> bool {
        self.events.front().is_some_and(|e| e.trigger_time <= at)
    }

    /// Remove and return every event due at `at`, earliest first.
    pub fn take_due(&mut self, at: Duration) -> Vec<TimedEvent> {
        let due = self.events.partition_point(|e| e.trigger_time <= at);
        self.events.drain(..due).collect()
    }

    pub fn next_trigger_time(&self) -> Option<Duration> {
        self.events.front().map(|e| e.trigger_time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// No events left. The simulation keeps running regardless.
    pub fn is_exhausted(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::test_map;
    use proptest::prelude::*;

    fn station_at(ms: u64, station_type: StationType) -> TimedEvent {
        TimedEvent {
            trigger_time: Duration::from_millis(ms),
            payload: TimelinePayload::StationApparition {
                position: DVec2::ZERO,
                station_type,
            },
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let timeline = ScenarioTimeline::new([station_at(100, StationType::Circle)]);
        assert!(!timeline.peek_due(Duration::from_millis(99)));
        assert!(timeline.peek_due(Duration::from_millis(100)));
        assert!(timeline.peek_due(Duration::from_millis(100)));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_take_due_is_one_shot() {
        let mut timeline = ScenarioTimeline::new([
            station_at(300, StationType::Square),
            station_at(100, StationType::Circle),
            station_at(200, StationType::Triangle),
        ]);

        let first = timeline.take_due(Duration::from_millis(250));
        let types: Vec<_> = first
            .iter()
            .map(|e| match &e.payload {
                TimelinePayload::StationApparition { station_type, .. } => *station_type,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(types, vec![StationType::Circle, StationType::Triangle]);

        assert!(timeline.take_due(Duration::from_millis(250)).is_empty());
        assert_eq!(timeline.take_due(Duration::from_secs(10)).len(), 1);
        assert!(timeline.is_exhausted());
        assert!(timeline.take_due(Duration::MAX).is_empty());
    }

    #[test]
    fn test_ties_keep_authoring_order() {
        let mut timeline = ScenarioTimeline::new([
            station_at(0, StationType::Star),
            station_at(0, StationType::Cross),
            station_at(0, StationType::Diamond),
        ]);
        let order: Vec<_> = timeline
            .take_due(Duration::ZERO)
            .into_iter()
            .map(|e| match e.payload {
                TimelinePayload::StationApparition { station_type, .. } => station_type,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            order,
            vec![StationType::Star, StationType::Cross, StationType::Diamond]
        );
    }

    #[test]
    fn test_scenario_merges_stations_and_offers() {
        let mut timeline = ScenarioTimeline::from_scenario(&test_map());
        assert_eq!(timeline.len(), 19);

        // At 60 s the Cross station was authored before the train offer.
        let due = timeline.take_due(Duration::from_secs(60));
        assert_eq!(due.len(), 6);
        assert!(matches!(
            due[4].payload,
            TimelinePayload::StationApparition {
                station_type: StationType::Cross,
                ..
            }
        ));
        assert!(matches!(
            due[5].payload,
            TimelinePayload::ElementChoiceOffer { .. }
        ));
        assert_eq!(timeline.next_trigger_time(), Some(Duration::from_secs(90)));
    }

    proptest! {
        #[test]
        fn prop_take_due_ordered_and_unique(
            times in proptest::collection::vec(0u64..10_000, 0..40),
            cuts in proptest::collection::vec(0u64..12_000, 1..10),
        ) {
            let events = times.iter().enumerate().map(|(i, &ms)| TimedEvent {
                trigger_time: Duration::from_millis(ms),
                payload: TimelinePayload::StationApparition {
                    position: DVec2::new(i as f64, 0.0),
                    station_type: StationType::Circle,
                },
            });
            let mut timeline = ScenarioTimeline::new(events);

            let mut cuts = cuts;
            cuts.sort_unstable();
            let mut taken = Vec::new();
            for cut in cuts {
                taken.extend(timeline.take_due(Duration::from_millis(cut)));
            }
            taken.extend(timeline.take_due(Duration::MAX));

            prop_assert_eq!(taken.len(), times.len());
            prop_assert!(taken.windows(2).all(|w| w[0].trigger_time <= w[1].trigger_time));
            let mut seen: Vec<u64> = taken
                .iter()
                .map(|e| match e.payload {
                    TimelinePayload::StationApparition { position, .. } => position.x as u64,
                    _ => unreachable!(),
                })
                .collect();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), times.len());
        }
    }
}
