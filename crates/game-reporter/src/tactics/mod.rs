//! Tactical safety analysis used by the Brilliant and Critical checks.
//! Grouped leaves first: attackers feed defenders, both feed safety.

pub mod attackers;
pub mod defenders;
pub mod safety;
pub mod danger;
pub mod trapped;

pub use attackers::{attacking_moves, direct_attacking_moves};
pub use danger::{has_counter_threat, ThreatMode};
pub use defenders::defending_moves;
pub use safety::{is_piece_safe, unsafe_pieces};
pub use trapped::is_piece_trapped;
