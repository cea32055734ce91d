//! Exercise definitions - built-in catalog seeded into a fresh database

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Muscle groups for volume breakdowns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Forearms,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
    Obliques,
    LowerBack,
}

impl MuscleGroup {
    pub fn name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Forearms => "Forearms",
            MuscleGroup::Quads => "Quads",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Calves => "Calves",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Obliques => "Obliques",
            MuscleGroup::LowerBack => "Lower Back",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Forearms,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
            MuscleGroup::Abs,
            MuscleGroup::Obliques,
            MuscleGroup::LowerBack,
        ]
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MuscleGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        MuscleGroup::all()
            .iter()
            .find(|m| m.name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown muscle group: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    Push,
    Pull,
    Legs,
    Core,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Push => "Push",
            Category::Pull => "Pull",
            Category::Legs => "Legs",
            Category::Core => "Core",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Push => "💪",
            Category::Pull => "🏋️",
            Category::Legs => "🦵",
            Category::Core => "🎯",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(Category::Push),
            "pull" => Ok(Category::Pull),
            "legs" => Ok(Category::Legs),
            "core" => Ok(Category::Core),
            _ => anyhow::bail!("unknown category: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Cable,
    Machine,
    Bodyweight,
    Kettlebell,
    EzBar,
    TrapBar,
}

impl Equipment {
    pub fn name(&self) -> &'static str {
        match self {
            Equipment::Barbell => "Barbell",
            Equipment::Dumbbell => "Dumbbell",
            Equipment::Cable => "Cable",
            Equipment::Machine => "Machine",
            Equipment::Bodyweight => "Bodyweight",
            Equipment::Kettlebell => "Kettlebell",
            Equipment::EzBar => "EZ Bar",
            Equipment::TrapBar => "Trap Bar",
        }
    }

    fn all() -> &'static [Equipment] {
        &[
            Equipment::Barbell,
            Equipment::Dumbbell,
            Equipment::Cable,
            Equipment::Machine,
            Equipment::Bodyweight,
            Equipment::Kettlebell,
            Equipment::EzBar,
            Equipment::TrapBar,
        ]
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Equipment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Equipment::all()
            .iter()
            .find(|e| e.name().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown equipment: {}", s))
    }
}

/// Catalog entry for the seed data
#[derive(Debug, Clone)]
pub struct CatalogExercise {
    pub name: &'static str,
    pub category: Category,
    pub primary_muscle: MuscleGroup,
    pub secondary_muscles: &'static [MuscleGroup],
    pub equipment: Equipment,
}

pub const BUILTIN_EXERCISES: &[CatalogExercise] = &[
    // Push
    CatalogExercise {
        name: "Bench Press",
        category: Category::Push,
        primary_muscle: MuscleGroup::Chest,
        secondary_muscles: &[MuscleGroup::Triceps, MuscleGroup::Shoulders],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Incline Dumbbell Press",
        category: Category::Push,
        primary_muscle: MuscleGroup::Chest,
        secondary_muscles: &[MuscleGroup::Shoulders, MuscleGroup::Triceps],
        equipment: Equipment::Dumbbell,
    },
    CatalogExercise {
        name: "Overhead Press",
        category: Category::Push,
        primary_muscle: MuscleGroup::Shoulders,
        secondary_muscles: &[MuscleGroup::Triceps],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Dips",
        category: Category::Push,
        primary_muscle: MuscleGroup::Triceps,
        secondary_muscles: &[MuscleGroup::Chest, MuscleGroup::Shoulders],
        equipment: Equipment::Bodyweight,
    },
    CatalogExercise {
        name: "Tricep Pushdown",
        category: Category::Push,
        primary_muscle: MuscleGroup::Triceps,
        secondary_muscles: &[],
        equipment: Equipment::Cable,
    },
    CatalogExercise {
        name: "Lateral Raise",
        category: Category::Push,
        primary_muscle: MuscleGroup::Shoulders,
        secondary_muscles: &[],
        equipment: Equipment::Dumbbell,
    },
    // Pull
    CatalogExercise {
        name: "Deadlift",
        category: Category::Pull,
        primary_muscle: MuscleGroup::LowerBack,
        secondary_muscles: &[MuscleGroup::Hamstrings, MuscleGroup::Glutes, MuscleGroup::Back, MuscleGroup::Forearms],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Barbell Row",
        category: Category::Pull,
        primary_muscle: MuscleGroup::Back,
        secondary_muscles: &[MuscleGroup::Biceps],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Pull-up",
        category: Category::Pull,
        primary_muscle: MuscleGroup::Back,
        secondary_muscles: &[MuscleGroup::Biceps, MuscleGroup::Forearms],
        equipment: Equipment::Bodyweight,
    },
    CatalogExercise {
        name: "Lat Pulldown",
        category: Category::Pull,
        primary_muscle: MuscleGroup::Back,
        secondary_muscles: &[MuscleGroup::Biceps],
        equipment: Equipment::Cable,
    },
    CatalogExercise {
        name: "Barbell Curl",
        category: Category::Pull,
        primary_muscle: MuscleGroup::Biceps,
        secondary_muscles: &[MuscleGroup::Forearms],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Face Pull",
        category: Category::Pull,
        primary_muscle: MuscleGroup::Shoulders,
        secondary_muscles: &[MuscleGroup::Back],
        equipment: Equipment::Cable,
    },
    // Legs
    CatalogExercise {
        name: "Squat",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Quads,
        secondary_muscles: &[MuscleGroup::Glutes, MuscleGroup::Hamstrings, MuscleGroup::LowerBack],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Front Squat",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Quads,
        secondary_muscles: &[MuscleGroup::Glutes, MuscleGroup::Abs],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Romanian Deadlift",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Hamstrings,
        secondary_muscles: &[MuscleGroup::Glutes, MuscleGroup::LowerBack],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Leg Press",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Quads,
        secondary_muscles: &[MuscleGroup::Glutes],
        equipment: Equipment::Machine,
    },
    CatalogExercise {
        name: "Hip Thrust",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Glutes,
        secondary_muscles: &[MuscleGroup::Hamstrings],
        equipment: Equipment::Barbell,
    },
    CatalogExercise {
        name: "Standing Calf Raise",
        category: Category::Legs,
        primary_muscle: MuscleGroup::Calves,
        secondary_muscles: &[],
        equipment: Equipment::Machine,
    },
    // Core
    CatalogExercise {
        name: "Hanging Leg Raise",
        category: Category::Core,
        primary_muscle: MuscleGroup::Abs,
        secondary_muscles: &[MuscleGroup::Obliques],
        equipment: Equipment::Bodyweight,
    },
    CatalogExercise {
        name: "Cable Crunch",
        category: Category::Core,
        primary_muscle: MuscleGroup::Abs,
        secondary_muscles: &[],
        equipment: Equipment::Cable,
    },
];

pub fn find_builtin(name: &str) -> Option<&'static CatalogExercise> {
    BUILTIN_EXERCISES
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let mut names: Vec<_> = BUILTIN_EXERCISES.iter().map(|e| e.name.to_lowercase()).collect();
        names.sort();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_find_builtin_case_insensitive() {
        let ex = find_builtin("bench press").unwrap();
        assert_eq!(ex.category, Category::Push);
        assert_eq!(ex.primary_muscle, MuscleGroup::Chest);
        assert!(find_builtin("jumping jacks").is_none());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("lower back".parse::<MuscleGroup>().unwrap(), MuscleGroup::LowerBack);
        assert_eq!("lower_back".parse::<MuscleGroup>().unwrap(), MuscleGroup::LowerBack);
        assert_eq!("LEGS".parse::<Category>().unwrap(), Category::Legs);
        assert_eq!("ez-bar".parse::<Equipment>().unwrap(), Equipment::EzBar);
        assert!("wings".parse::<MuscleGroup>().is_err());
    }
}
