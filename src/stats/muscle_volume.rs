//! Volume per primary muscle group

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::db::{Exercise, Set};
use crate::exercises::MuscleGroup;

/// Working volume credited to one muscle group
#[derive(Debug, Clone, PartialEq)]
pub struct MuscleVolume {
    pub group: MuscleGroup,
    pub volume: f64,
    pub sets: usize,
    pub last_trained: Option<DateTime<Utc>>,
}

/// Builds the per-muscle breakdown from set history
pub struct MuscleVolumeTracker {
    loads: HashMap<MuscleGroup, MuscleVolume>,
}

impl MuscleVolumeTracker {
    /// Credit each working set to the primary muscle of its exercise
    pub fn from_sets(sets: &[Set], exercises: &[Exercise]) -> Self {
        let primary: HashMap<i64, MuscleGroup> =
            exercises.iter().map(|e| (e.id, e.primary_muscle)).collect();

        let mut loads: HashMap<MuscleGroup, MuscleVolume> = MuscleGroup::all()
            .iter()
            .map(|group| {
                (
                    *group,
                    MuscleVolume {
                        group: *group,
                        volume: 0.0,
                        sets: 0,
                        last_trained: None,
                    },
                )
            })
            .collect();

        for set in sets.iter().filter(|s| s.set_type.is_working()) {
            // deleted exercises have no muscle to credit
            let Some(group) = primary.get(&set.exercise_id) else {
                continue;
            };
            if let Some(load) = loads.get_mut(group) {
                load.volume += set.volume();
                load.sets += 1;
                if load.last_trained.is_none_or(|last| last < set.completed_at) {
                    load.last_trained = Some(set.completed_at);
                }
            }
        }

        Self { loads }
    }

    pub fn get(&self, group: MuscleGroup) -> Option<&MuscleVolume> {
        self.loads.get(&group)
    }

    /// Trained groups, most volume first
    pub fn breakdown(&self) -> Vec<&MuscleVolume> {
        let mut trained: Vec<_> = self.loads.values().filter(|l| l.sets > 0).collect();
        trained.sort_by(|a, b| b.volume.total_cmp(&a.volume).then(a.group.cmp(&b.group)));
        trained
    }

    /// Each trained group with a four-step bar relative to the busiest group
    pub fn report(&self) -> Vec<(MuscleGroup, f64, &'static str)> {
        let breakdown = self.breakdown();
        let max_volume = breakdown.first().map_or(0.0, |l| l.volume);

        breakdown
            .into_iter()
            .map(|load| {
                let ratio = if max_volume > 0.0 { load.volume / max_volume } else { 0.0 };
                let bar = match ratio {
                    r if r >= 0.75 => "[++++]",
                    r if r >= 0.50 => "[+++.]",
                    r if r >= 0.25 => "[++..]",
                    r if r > 0.0 => "[+...]",
                    _ => "[....]",
                };
                (load.group, load.volume, bar)
            })
            .collect()
    }
}
