//! Initiative roll decomposition.
//!
//! The host stores only the composite initiative total. Given the actor's
//! static modifier, the implicit d20 face is `total - modifier`. The host
//! reserves a small fraction of the total (at most `modifier / 100`) as its
//! tie-breaker for equal values, so the face is rounded before
//! classification.
//!
//! Decomposition requires both the total and the modifier. When the host
//! cannot supply a modifier the caller must not guess - absence of a
//! classification degrades to partition-only behavior upstream.

use serde::{Deserialize, Serialize};

/// Critical classification of the d20 component of an initiative roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollClassification {
    /// Natural 20 on the d20 component.
    Natural20,
    /// Natural 1 on the d20 component.
    Natural1,
    /// Neither critical case.
    Normal,
}

impl RollClassification {
    pub fn is_natural_20(&self) -> bool {
        matches!(self, RollClassification::Natural20)
    }

    pub fn is_natural_1(&self) -> bool {
        matches!(self, RollClassification::Natural1)
    }
}

/// The d20 component derived from a composite initiative total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedRoll {
    /// Raw face value, tie-breaker fraction included.
    pub face: f64,
    pub classification: RollClassification,
}

impl DecomposedRoll {
    /// Derive the d20 face from a composite total and a static modifier.
    ///
    /// Classification rounds first: `natural 20` iff `20 <= round(face) < 21`,
    /// `natural 1` iff `1 <= round(face) < 2`. A non-finite total (host sent
    /// garbage) classifies as `Normal`.
    pub fn decompose(total: f64, modifier: f64) -> Self {
        let face = total - modifier;
        let rounded = face.round();

        let classification = if (20.0..21.0).contains(&rounded) {
            RollClassification::Natural20
        } else if (1.0..2.0).contains(&rounded) {
            RollClassification::Natural1
        } else {
            RollClassification::Normal
        };

        Self {
            face,
            classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_rolls_classify_by_face() {
        assert_eq!(
            DecomposedRoll::decompose(25.0, 5.0).classification,
            RollClassification::Natural20
        );
        assert_eq!(
            DecomposedRoll::decompose(6.0, 5.0).classification,
            RollClassification::Natural1
        );
        assert_eq!(
            DecomposedRoll::decompose(15.0, 5.0).classification,
            RollClassification::Normal
        );
    }

    #[test]
    fn zero_modifier_rolls_pass_through() {
        let roll = DecomposedRoll::decompose(20.0, 0.0);
        assert_eq!(roll.face, 20.0);
        assert!(roll.classification.is_natural_20());

        let roll = DecomposedRoll::decompose(1.0, 0.0);
        assert!(roll.classification.is_natural_1());
    }

    #[test]
    fn tie_breaker_fraction_is_absorbed() {
        // Host stores 20 + 5 + 5/100 for a modifier-5 natural 20.
        let roll = DecomposedRoll::decompose(25.05, 5.0);
        assert!(roll.classification.is_natural_20());

        // And 1 + 5 + 5/100 for a natural 1.
        let roll = DecomposedRoll::decompose(6.05, 5.0);
        assert!(roll.classification.is_natural_1());
    }

    #[test]
    fn neighboring_faces_are_not_critical() {
        assert_eq!(
            DecomposedRoll::decompose(19.0, 0.0).classification,
            RollClassification::Normal
        );
        assert_eq!(
            DecomposedRoll::decompose(2.0, 0.0).classification,
            RollClassification::Normal
        );
    }

    #[test]
    fn non_finite_totals_classify_as_normal() {
        let roll = DecomposedRoll::decompose(f64::NAN, 5.0);
        assert_eq!(roll.classification, RollClassification::Normal);
    }
}
