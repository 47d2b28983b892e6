//! ECS Systems for the skirmish simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## System Order
//!
//! All systems run in one chained schedule, grouped into phases:
//!
//! **Movement**:
//! - `separation_system` - Pushes overlapping same-side ships apart
//! - `steering_system` - Moves ships toward their destinations
//! - `projectile_motion_system` - Advances and expires projectiles
//!
//! **Collision**:
//! - `projectile_collision_system` - Applies hits and records deaths
//!
//! **Combat/AI**:
//! - `weapon_cooldown_system` - Counts weapon cooldowns down
//! - `player_combat_system` - Executes player attack orders
//! - `group_tactics_system` - Forms and maintains enemy formations
//! - `enemy_ai_system` - Per-unit state machine for enemy ships
//!
//! **Gameplay**:
//! - `production_system` - Ticks build queues and spawns ships
//! - `destruction_effects_system` - Score, loss counters and cues
//! - `planet_wreck_system` - Clears queues of dead planets
//! - `game_over_system` - Latches game over

pub mod ai;
pub mod collision;
pub mod combat;
pub mod destruction;
pub mod formation;
pub mod movement;
pub mod production;
pub mod serialization;
pub mod tactical;

pub use ai::*;
pub use collision::*;
pub use combat::*;
pub use destruction::*;
pub use formation::*;
pub use movement::*;
pub use production::*;
pub use serialization::*;
pub use tactical::*;
