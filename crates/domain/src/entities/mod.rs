//! Domain entities - Tracker objects with identity

mod combat;
mod combatant;

pub use combat::Combat;
pub use combatant::{Combatant, CriticalState, TurnMarker};
