mod resolver;
mod state;
mod weapon;

pub use resolver::{CombatResolver, DAMAGE_PER_HIT, HitReport};
pub use state::{CombatState, STARTING_HEALTH, WeaponBinding};
pub use weapon::{AnimationKind, AttachmentPose, Weapon, WeaponSpec, WeaponTable};
