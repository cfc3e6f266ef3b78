use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Weapon {
    #[default]
    None,
    Dagger,
    Halberd,
    Longsword,
    Spear,
    SwordAndShield,
}

impl Weapon {
    pub const ALL: [Weapon; 6] = [
        Weapon::None,
        Weapon::Dagger,
        Weapon::Halberd,
        Weapon::Longsword,
        Weapon::Spear,
        Weapon::SwordAndShield,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "No Weapon",
            Self::Dagger => "Dagger",
            Self::Halberd => "Halberd",
            Self::Longsword => "Longsword",
            Self::Spear => "Spear",
            Self::SwordAndShield => "Sword and Shield",
        }
    }

    pub fn spec(self) -> &'static WeaponSpec {
        WeaponTable::get(self)
    }
}

impl From<u8> for Weapon {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Dagger,
            2 => Self::Halberd,
            3 => Self::Longsword,
            4 => Self::Spear,
            5 => Self::SwordAndShield,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum AnimationKind {
    Attack,
    Damage,
}

/// Weapon mesh placement relative to the hand socket. Rotation is pitch/yaw/roll in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentPose {
    pub location: Vec3,
    pub rotation: Vec3,
}

impl AttachmentPose {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Vec3::ZERO,
    };

    const fn new(location: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            location: Vec3::from_array(location),
            rotation: Vec3::from_array(rotation),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub weapon: Weapon,
    pub pose: AttachmentPose,
    pub mesh: Option<&'static str>,
    pub attack_animation: Option<&'static str>,
    pub damage_animation: Option<&'static str>,
}

impl WeaponSpec {
    const fn empty(weapon: Weapon) -> Self {
        Self {
            weapon,
            pose: AttachmentPose::IDENTITY,
            mesh: None,
            attack_animation: None,
            damage_animation: None,
        }
    }

    /// Weapons without a mesh carry no overlap geometry.
    pub fn has_hit_volume(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn animation(&self, kind: AnimationKind) -> Option<&'static str> {
        match kind {
            AnimationKind::Attack => self.attack_animation,
            AnimationKind::Damage => self.damage_animation,
        }
    }
}

pub struct WeaponTable;

// SwordAndShield has no assets yet and binds like an empty hand.
static WEAPONS: [WeaponSpec; 6] = [
    WeaponSpec::empty(Weapon::None),
    WeaponSpec {
        weapon: Weapon::Dagger,
        pose: AttachmentPose::new(
            [-8.781104, 4.826352, 0.126374],
            [4.980621, 81.317833, 119.621643],
        ),
        mesh: Some("Player/WeaponPlaceholders/KnifeViking"),
        attack_animation: Some("Player/Mannequin/Animations/Dagger/FPP_Dag_AttackLSlash_Montage"),
        damage_animation: Some("Player/Mannequin/Animations/Dagger/FPP_Dag_HitC_Montage"),
    },
    WeaponSpec {
        weapon: Weapon::Halberd,
        pose: AttachmentPose::new(
            [12.110796, 5.220458, -28.740444],
            [-9.99996, -97.999985, -124.999985],
        ),
        mesh: Some("Player/WeaponPlaceholders/BerdyszViking"),
        attack_animation: Some("Player/Mannequin/Animations/Halberd/FPP_Halb_Attack_D2_Montage"),
        damage_animation: Some("Player/Mannequin/Animations/Halberd/FPP_Halb_Hit1_Montage"),
    },
    WeaponSpec {
        weapon: Weapon::Longsword,
        pose: AttachmentPose::new([-8.573628, 5.381995, 0.508609], [0.000067, 75.0, -47.0]),
        mesh: Some("Player/WeaponPlaceholders/Longsword"),
        attack_animation: Some(
            "Player/Mannequin/Animations/Longsword/FPP_Longs_Attack_R_Montage",
        ),
        damage_animation: Some("Player/Mannequin/Animations/Longsword/FPP_Longs_Hit1_Montage"),
    },
    WeaponSpec {
        weapon: Weapon::Spear,
        pose: AttachmentPose::new([-12.062593, 5.173286, 1.960684], [2.0, 82.0, -43.0]),
        mesh: Some("Player/WeaponPlaceholders/SpearViking"),
        attack_animation: Some("Player/Mannequin/Animations/Spear/FPPSpear_Attack1_Montage"),
        damage_animation: Some("Player/Mannequin/Animations/Spear/FPPSpear_Hit1_Montage"),
    },
    WeaponSpec::empty(Weapon::SwordAndShield),
];

impl WeaponTable {
    pub fn get(weapon: Weapon) -> &'static WeaponSpec {
        &WEAPONS[weapon as usize]
    }

    pub fn iter() -> impl Iterator<Item = &'static WeaponSpec> {
        WEAPONS.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_weapon() {
        for weapon in Weapon::ALL {
            assert_eq!(WeaponTable::get(weapon).weapon, weapon);
            assert_eq!(Weapon::from(weapon as u8), weapon);
        }
    }

    #[test]
    fn empty_hands_have_no_hit_volume() {
        assert!(!Weapon::None.spec().has_hit_volume());
        assert!(!Weapon::SwordAndShield.spec().has_hit_volume());
        assert!(Weapon::Spear.spec().has_hit_volume());
        assert_eq!(Weapon::None.spec().pose, AttachmentPose::IDENTITY);
    }

    #[test]
    fn animations_resolve_by_kind() {
        let spec = Weapon::Halberd.spec();
        assert!(spec.animation(AnimationKind::Attack).unwrap().contains("Attack"));
        assert!(spec.animation(AnimationKind::Damage).unwrap().contains("Hit"));
        assert!(Weapon::SwordAndShield.spec().animation(AnimationKind::Attack).is_none());
    }
}
