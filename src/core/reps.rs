//! Two-state rep machine driven by debounced labels.
//!
//! A rep starts on the rising edge of a sustained `Target` signal and is
//! counted on the falling edge, so one activation counts once no matter how
//! many windows report `Target` during it.

use crate::core::gate::BinaryLabel;
use serde::{Deserialize, Serialize};

/// Whether a rep is currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepState {
    #[default]
    Idle,
    InRep,
}

/// Event produced by a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepEvent {
    /// `Idle -> InRep`
    RepStarted,
    /// `InRep -> Idle`; carries the new rep count
    RepCompleted { count: u32 },
    /// The rep count just reached the target
    GoalReached { count: u32 },
}

/// Rep state plus the session's rep counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepStateMachine {
    state: RepState,
    rep_count: u32,
}

impl RepStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure transition over an explicit state value.
    ///
    /// Returns the next machine and the events the transition produced, in
    /// emission order.
    pub fn step(mut self, label: BinaryLabel, target_reps: u32) -> (Self, Vec<RepEvent>) {
        let events = self.advance(label, target_reps);
        (self, events)
    }

    /// Apply one debounced label in place.
    pub fn advance(&mut self, label: BinaryLabel, target_reps: u32) -> Vec<RepEvent> {
        match (self.state, label) {
            (RepState::Idle, BinaryLabel::Target) => {
                self.state = RepState::InRep;
                vec![RepEvent::RepStarted]
            }
            (RepState::InRep, BinaryLabel::Other) => {
                self.state = RepState::Idle;
                self.rep_count += 1;

                let mut events = vec![RepEvent::RepCompleted {
                    count: self.rep_count,
                }];
                if self.rep_count == target_reps {
                    events.push(RepEvent::GoalReached {
                        count: self.rep_count,
                    });
                }
                events
            }
            (RepState::Idle, BinaryLabel::Other) | (RepState::InRep, BinaryLabel::Target) => {
                Vec::new()
            }
        }
    }

    pub fn state(&self) -> RepState {
        self.state
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Back to `Idle` with a zero count.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BinaryLabel::{Other, Target};

    fn drive(labels: &[BinaryLabel], target_reps: u32) -> (RepStateMachine, Vec<RepEvent>) {
        labels
            .iter()
            .fold((RepStateMachine::new(), Vec::new()), |(machine, mut all), &label| {
                let (next, events) = machine.step(label, target_reps);
                all.extend(events);
                (next, all)
            })
    }

    fn completed(events: &[RepEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, RepEvent::RepCompleted { .. }))
            .count()
    }

    fn goals(events: &[RepEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, RepEvent::GoalReached { .. }))
            .count()
    }

    #[test]
    fn test_single_cycle_counts_once() {
        let (machine, events) = drive(&[Other, Target, Target, Other], 10);
        assert_eq!(machine.rep_count(), 1);
        assert_eq!(machine.state(), RepState::Idle);
        assert_eq!(completed(&events), 1);
        assert_eq!(
            events,
            vec![RepEvent::RepStarted, RepEvent::RepCompleted { count: 1 }]
        );
    }

    #[test]
    fn test_goal_reached_on_second_falling_edge() {
        let mut machine = RepStateMachine::new();
        let mut goal_at = None;
        for (i, label) in [Target, Other, Target, Other].into_iter().enumerate() {
            let events = machine.advance(label, 2);
            if events.contains(&RepEvent::GoalReached { count: 2 }) {
                goal_at = Some(i);
            }
        }
        assert_eq!(machine.rep_count(), 2);
        assert_eq!(goal_at, Some(3));
    }

    #[test]
    fn test_goal_emitted_once() {
        let labels: Vec<BinaryLabel> = (0..5).flat_map(|_| [Target, Other]).collect();
        let (machine, events) = drive(&labels, 2);
        assert_eq!(machine.rep_count(), 5);
        assert_eq!(goals(&events), 1);
    }

    #[test]
    fn test_sustained_target_does_not_count() {
        let (machine, events) = drive(&[Target; 20], 1);
        assert_eq!(machine.rep_count(), 0);
        assert_eq!(machine.state(), RepState::InRep);
        assert_eq!(events, vec![RepEvent::RepStarted]);
    }

    #[test]
    fn test_idle_other_is_noop() {
        let mut machine = RepStateMachine::new();
        assert!(machine.advance(Other, 10).is_empty());
        assert_eq!(machine, RepStateMachine::new());
    }

    #[test]
    fn test_reset() {
        let (mut machine, _) = drive(&[Target, Other, Target], 10);
        assert_eq!(machine.state(), RepState::InRep);
        machine.reset();
        assert_eq!(machine.state(), RepState::Idle);
        assert_eq!(machine.rep_count(), 0);
    }
}
