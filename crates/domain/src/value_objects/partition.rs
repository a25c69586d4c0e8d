//! Partition planning - decides whether a combatant earns extra turns and
//! computes their initiative values.
//!
//! The plan is a pure function of the combatant's static bonus and the
//! module settings; the rolled d20 face never enters into it.

use serde::{Deserialize, Serialize};

use super::settings::ModuleSettings;

/// One planned extra-turn entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedTurn {
    /// 1-based partition index; ascending index = descending initiative.
    pub index: u32,
    pub initiative: f64,
}

/// The ordered set of extra turns a combatant should have.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartitionPlan {
    turns: Vec<PlannedTurn>,
}

impl PartitionPlan {
    /// Compute the plan for a static bonus under the given settings.
    ///
    /// Empty when the bonus is below the target threshold, or when the bonus
    /// is unknown. Candidate `i` (1 ..= max - 1) has value
    /// `bonus - i * offset`; each candidate is kept only while positive.
    /// Values decrease monotonically, so the sequence truncates naturally.
    pub fn build(bonus: f64, settings: &ModuleSettings) -> Self {
        if bonus < settings.target_initiative_bonus {
            return Self::default();
        }

        let turns = (1..settings.max_partition_count)
            .map(|index| PlannedTurn {
                index,
                initiative: bonus - f64::from(index) * settings.partition_offset,
            })
            .filter(|turn| turn.initiative > 0.0)
            .collect();

        Self { turns }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Planned turns in ascending index order (descending initiative).
    pub fn turns(&self) -> &[PlannedTurn] {
        &self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(target: f64, max: u32, offset: f64) -> ModuleSettings {
        ModuleSettings {
            target_initiative_bonus: target,
            max_partition_count: max,
            partition_offset: offset,
            ..ModuleSettings::default()
        }
    }

    #[test]
    fn bonus_below_target_plans_nothing() {
        let plan = PartitionPlan::build(20.0, &settings(21.0, 3, 20.0));
        assert!(plan.is_empty());
    }

    #[test]
    fn plan_decrements_by_offset() {
        // bonus 50, offset 20, max 3 -> extra turns at 30 and 10.
        let plan = PartitionPlan::build(50.0, &settings(21.0, 3, 20.0));
        let turns = plan.turns();

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], PlannedTurn { index: 1, initiative: 30.0 });
        assert_eq!(turns[1], PlannedTurn { index: 2, initiative: 10.0 });
    }

    #[test]
    fn plan_truncates_at_non_positive_values() {
        // bonus 30, offset 20, max 5 -> only 10 survives; 30 - 40 <= 0.
        let plan = PartitionPlan::build(30.0, &settings(21.0, 5, 20.0));
        let turns = plan.turns();

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].initiative, 10.0);
    }

    #[test]
    fn exact_zero_is_excluded() {
        // bonus 40, offset 20 -> candidate 2 lands exactly on 0 and is dropped.
        let plan = PartitionPlan::build(40.0, &settings(21.0, 3, 20.0));
        let turns = plan.turns();

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].initiative, 20.0);
    }

    #[test]
    fn max_partition_count_bounds_the_plan() {
        let plan = PartitionPlan::build(100.0, &settings(21.0, 4, 10.0));
        assert_eq!(plan.len(), 3);

        let indexes: Vec<u32> = plan.turns().iter().map(|t| t.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }

    #[test]
    fn bonus_at_target_qualifies() {
        let plan = PartitionPlan::build(21.0, &settings(21.0, 3, 20.0));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.turns()[0].initiative, 1.0);
    }
}
