//! Workout session - navigation over the exercise slots of one workout
//!
//! The session is never persisted. Every confirmed set is written through to the
//! set store before the session counts it, so the store stays the source of truth
//! and a session can always be rebuilt from it with [`WorkoutSession::reconstruct`].

pub mod driver;
pub mod parser;

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{NewSet, Prescription, Set, SetStore, SetType, TemplateExercise};

pub use driver::{LoggingSession, Outcome, Prompt};
pub use parser::{RejectReason, SetEntry, looks_like_set, parse_set_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Pending,
    Active,
    Completed,
    Skipped,
}

impl SlotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Active => "active",
            SlotStatus::Completed => "done",
            SlotStatus::Skipped => "skipped",
        }
    }
}

/// One exercise position in the session
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseSlot {
    pub exercise_id: i64,
    /// None if the exercise no longer exists
    pub exercise_name: Option<String>,
    /// Only program workouts carry a prescription
    pub prescription: Option<Prescription>,
    pub status: SlotStatus,
    /// Set numbers already stored for this exercise, ascending
    pub logged_set_numbers: Vec<u32>,
}

impl ExerciseSlot {
    pub fn from_template(template: &TemplateExercise) -> Self {
        Self {
            exercise_id: template.exercise_id,
            exercise_name: template.exercise_name.clone(),
            prescription: Some(template.prescription.clone()),
            status: SlotStatus::Pending,
            logged_set_numbers: Vec::new(),
        }
    }

    pub fn display_name(&self) -> String {
        self.exercise_name
            .clone()
            .unwrap_or_else(|| format!("Exercise #{}", self.exercise_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Slots come from a program template
    Program,
    /// Exercises are chosen one at a time
    Freestyle,
}

/// Running aggregate, always recomputable from the stored sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub total_volume: f64,
    pub total_sets: usize,
    pub distinct_exercise_ids: BTreeSet<i64>,
}

impl Totals {
    pub fn from_sets(sets: &[Set]) -> Self {
        let mut totals = Self::default();
        for set in sets {
            totals.record(set);
        }
        totals
    }

    fn record(&mut self, set: &Set) {
        if set.set_type.is_working() {
            self.total_volume += set.volume();
        }
        self.total_sets += 1;
        self.distinct_exercise_ids.insert(set.exercise_id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("a program workout needs at least one exercise")]
    NoSlots,
    #[error("no exercise #{} (there are {len})", .index + 1)]
    IndexOutOfRange { index: usize, len: usize },
    #[error("exercise #{} is {}", .index + 1, .status.label())]
    SlotNotAvailable { index: usize, status: SlotStatus },
    #[error("no exercise is active")]
    NoActiveSlot,
    #[error("finish or skip the current exercise first")]
    SlotStillActive,
    #[error("the workout is already finished")]
    Finished,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Rejected(#[from] RejectReason),
    #[error(transparent)]
    InvalidNavigation(#[from] NavError),
    /// The store did not take the write (or read); nothing in the session changed
    #[error("storage failed: {0:#}")]
    PersistenceFailed(anyhow::Error),
}

/// In-memory state of one workout being logged
#[derive(Debug, Clone)]
pub struct WorkoutSession {
    workout_id: i64,
    mode: SessionMode,
    slots: Vec<ExerciseSlot>,
    current: Option<usize>,
    finished: bool,
    totals: Totals,
    set_numbers: BTreeMap<i64, Vec<u32>>,
    last_entries: BTreeMap<i64, SetEntry>,
}

impl WorkoutSession {
    fn with_slots(workout_id: i64, mode: SessionMode, slots: Vec<ExerciseSlot>) -> Self {
        Self {
            workout_id,
            mode,
            slots,
            current: None,
            finished: false,
            totals: Totals::default(),
            set_numbers: BTreeMap::new(),
            last_entries: BTreeMap::new(),
        }
    }

    /// Fresh program session; the first slot becomes active
    pub fn start(workout_id: i64, template: &[TemplateExercise]) -> Result<Self, NavError> {
        if template.is_empty() {
            return Err(NavError::NoSlots);
        }
        let slots = template.iter().map(ExerciseSlot::from_template).collect();
        let mut session = Self::with_slots(workout_id, SessionMode::Program, slots);
        session.activate_next();
        info!("Workout {}: program session with {} exercises", workout_id, session.slots.len());
        Ok(session)
    }

    /// Fresh freestyle session without slots
    pub fn freestyle(workout_id: i64) -> Self {
        info!("Workout {}: freestyle session", workout_id);
        Self::with_slots(workout_id, SessionMode::Freestyle, Vec::new())
    }

    /// Rebuild a session from the sets already stored for the workout.
    ///
    /// Template slots whose exercise has stored sets are `Completed` and continue
    /// numbering after the highest stored set number; the rest stay `Pending`.
    /// No slot is activated. Without a template the session is freestyle with no slots.
    pub fn reconstruct(workout_id: i64, persisted: &[Set], template: Option<&[TemplateExercise]>) -> Self {
        let mut by_exercise: BTreeMap<i64, Vec<&Set>> = BTreeMap::new();
        for set in persisted {
            by_exercise.entry(set.exercise_id).or_default().push(set);
        }

        let mut set_numbers = BTreeMap::new();
        let mut last_entries = BTreeMap::new();
        for (exercise_id, sets) in &by_exercise {
            let mut numbers: Vec<u32> = sets.iter().map(|s| s.set_number).collect();
            numbers.sort_unstable();
            numbers.dedup();
            set_numbers.insert(*exercise_id, numbers);

            if let Some(last) = sets.iter().max_by_key(|s| (s.set_number, s.id)) {
                last_entries.insert(*exercise_id, SetEntry::new(last.weight, last.reps, last.rpe));
            }
        }

        let (mode, slots) = match template {
            Some(template) => {
                let slots = template
                    .iter()
                    .map(|t| {
                        let mut slot = ExerciseSlot::from_template(t);
                        if let Some(numbers) = set_numbers.get(&t.exercise_id) {
                            slot.status = SlotStatus::Completed;
                            slot.logged_set_numbers = numbers.clone();
                        }
                        slot
                    })
                    .collect();
                (SessionMode::Program, slots)
            }
            None => (SessionMode::Freestyle, Vec::new()),
        };

        let session = Self {
            workout_id,
            mode,
            slots,
            current: None,
            finished: false,
            totals: Totals::from_sets(persisted),
            set_numbers,
            last_entries,
        };
        info!(
            "Workout {}: resumed with {} stored sets over {} exercises",
            workout_id,
            persisted.len(),
            by_exercise.len()
        );
        session
    }

    pub fn workout_id(&self) -> i64 {
        self.workout_id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn slots(&self) -> &[ExerciseSlot] {
        &self.slots
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn active_slot(&self) -> Option<&ExerciseSlot> {
        self.current.map(|idx| &self.slots[idx])
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Program slots exist and none is pending or active
    pub fn all_slots_visited(&self) -> bool {
        !self.finished
            && !self.slots.is_empty()
            && self
                .slots
                .iter()
                .all(|s| matches!(s.status, SlotStatus::Completed | SlotStatus::Skipped))
    }

    /// Number the next set of this exercise will get
    pub fn next_set_number(&self, exercise_id: i64) -> u32 {
        self.set_numbers
            .get(&exercise_id)
            .and_then(|n| n.last())
            .map_or(1, |max| max + 1)
    }

    /// Most recent set of this exercise in this workout, for shorthand input
    pub fn last_entry(&self, exercise_id: i64) -> Option<&SetEntry> {
        self.last_entries.get(&exercise_id)
    }

    /// Activate the first pending slot if none is active
    pub fn activate_next(&mut self) -> Option<usize> {
        if self.finished {
            return None;
        }
        if self.current.is_some() {
            return self.current;
        }
        let idx = self.slots.iter().position(|s| s.status == SlotStatus::Pending)?;
        self.slots[idx].status = SlotStatus::Active;
        self.current = Some(idx);
        Some(idx)
    }

    /// Write one set through to the store and count it.
    ///
    /// On any error the session is left exactly as it was.
    pub fn log_set<S: SetStore + ?Sized>(
        &mut self,
        store: &S,
        exercise_id: i64,
        entry: SetEntry,
        set_type: SetType,
    ) -> Result<Set, SessionError> {
        if self.finished {
            return Err(NavError::Finished.into());
        }
        entry.check()?;

        let new_set = NewSet {
            workout_id: self.workout_id,
            exercise_id,
            set_number: self.next_set_number(exercise_id),
            weight: entry.weight,
            reps: entry.reps,
            rpe: entry.rpe,
            set_type,
            completed_at: Utc::now(),
        };
        let set = store.insert_set(&new_set).map_err(|e| {
            warn!("Workout {}: failed to store set: {:#}", self.workout_id, e);
            SessionError::PersistenceFailed(e)
        })?;

        self.set_numbers.entry(exercise_id).or_default().push(set.set_number);
        self.last_entries.insert(exercise_id, entry);
        self.totals.record(&set);

        let slot_idx = match self.current {
            Some(idx) if self.slots[idx].exercise_id == exercise_id => Some(idx),
            _ => self.slots.iter().position(|s| s.exercise_id == exercise_id),
        };
        if let Some(idx) = slot_idx {
            self.slots[idx].logged_set_numbers.push(set.set_number);
        }

        debug!(
            "Workout {}: logged set #{} of exercise {}",
            self.workout_id, set.set_number, exercise_id
        );
        Ok(set)
    }

    /// Mark the active slot completed and move on to the next pending one.
    ///
    /// Returns the newly active slot, or `None` once every slot has been visited.
    pub fn finish_current_slot(&mut self) -> Result<Option<usize>, NavError> {
        self.leave_current(SlotStatus::Completed)
    }

    /// Mark the active slot skipped and move on to the next pending one
    pub fn skip_current_slot(&mut self) -> Result<Option<usize>, NavError> {
        self.leave_current(SlotStatus::Skipped)
    }

    fn leave_current(&mut self, status: SlotStatus) -> Result<Option<usize>, NavError> {
        if self.finished {
            return Err(NavError::Finished);
        }
        let idx = self.current.ok_or(NavError::NoActiveSlot)?;
        self.slots[idx].status = status;
        self.current = None;

        // search forward first, then wrap around to slots jumped over
        let len = self.slots.len();
        let next = (1..len)
            .map(|offset| (idx + offset) % len)
            .find(|&i| self.slots[i].status == SlotStatus::Pending);
        if let Some(next) = next {
            self.slots[next].status = SlotStatus::Active;
            self.current = Some(next);
        } else {
            info!("Workout {}: all exercises visited", self.workout_id);
        }
        Ok(next)
    }

    /// Make a pending or skipped slot active.
    ///
    /// A slot left while still active becomes `Completed` if it has sets, `Pending` otherwise.
    pub fn jump_to(&mut self, index: usize) -> Result<(), NavError> {
        if self.finished {
            return Err(NavError::Finished);
        }
        let len = self.slots.len();
        let target = self
            .slots
            .get(index)
            .ok_or(NavError::IndexOutOfRange { index, len })?;
        if !matches!(target.status, SlotStatus::Pending | SlotStatus::Skipped) {
            return Err(NavError::SlotNotAvailable { index, status: target.status });
        }

        if let Some(current) = self.current {
            let slot = &mut self.slots[current];
            slot.status = if slot.logged_set_numbers.is_empty() {
                SlotStatus::Pending
            } else {
                SlotStatus::Completed
            };
        }
        self.slots[index].status = SlotStatus::Active;
        self.current = Some(index);
        debug!("Workout {}: jumped to exercise #{}", self.workout_id, index + 1);
        Ok(())
    }

    /// Append an exercise chosen ad hoc and make it active
    pub fn add_exercise(&mut self, exercise_id: i64, exercise_name: Option<String>) -> Result<usize, NavError> {
        if self.finished {
            return Err(NavError::Finished);
        }
        if self.current.is_some() {
            return Err(NavError::SlotStillActive);
        }
        self.slots.push(ExerciseSlot {
            exercise_id,
            exercise_name,
            prescription: None,
            status: SlotStatus::Active,
            logged_set_numbers: self.set_numbers.get(&exercise_id).cloned().unwrap_or_default(),
        });
        let idx = self.slots.len() - 1;
        self.current = Some(idx);
        Ok(idx)
    }

    /// End the session now: pending slots become skipped.
    ///
    /// Returns the indices that were skipped by this call.
    pub fn finish_workout_now(&mut self) -> Result<Vec<usize>, NavError> {
        if self.finished {
            return Err(NavError::Finished);
        }
        let mut skipped = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            match slot.status {
                SlotStatus::Active if !slot.logged_set_numbers.is_empty() => {
                    slot.status = SlotStatus::Completed;
                }
                SlotStatus::Active | SlotStatus::Pending => {
                    slot.status = SlotStatus::Skipped;
                    skipped.push(idx);
                }
                SlotStatus::Completed | SlotStatus::Skipped => {}
            }
        }
        self.current = None;
        self.finished = true;
        info!(
            "Workout {}: finished ({} sets, {} skipped exercises)",
            self.workout_id,
            self.totals.total_sets,
            skipped.len()
        );
        Ok(skipped)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::{Result, bail};

    use super::*;

    /// Set store double; can be told to fail writes
    #[derive(Default)]
    pub struct MemoryStore {
        pub sets: RefCell<Vec<Set>>,
        pub fail_writes: Cell<bool>,
    }

    impl SetStore for MemoryStore {
        fn insert_set(&self, set: &NewSet) -> Result<Set> {
            if self.fail_writes.get() {
                bail!("disk full");
            }
            let mut sets = self.sets.borrow_mut();
            let stored = Set {
                id: sets.len() as i64 + 1,
                workout_id: set.workout_id,
                exercise_id: set.exercise_id,
                set_number: set.set_number,
                weight: set.weight,
                reps: set.reps,
                rpe: set.rpe,
                set_type: set.set_type,
                completed_at: set.completed_at,
            };
            sets.push(stored.clone());
            Ok(stored)
        }

        fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<Set>> {
            Ok(self.sets.borrow().iter().filter(|s| s.workout_id == workout_id).cloned().collect())
        }

        fn sets_for_exercise(&self, exercise_id: i64, limit: usize) -> Result<Vec<Set>> {
            Ok(self
                .sets
                .borrow()
                .iter()
                .rev()
                .filter(|s| s.exercise_id == exercise_id)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    pub fn template(exercise_ids: &[i64]) -> Vec<TemplateExercise> {
        exercise_ids
            .iter()
            .map(|&id| TemplateExercise {
                exercise_id: id,
                exercise_name: Some(format!("Exercise {}", id)),
                prescription: Prescription {
                    target_sets: 3,
                    reps_min: 8,
                    reps_max: 12,
                    target_rpe: None,
                    rest_seconds: Some(90),
                    tempo: None,
                    notes: None,
                },
            })
            .collect()
    }

    fn statuses(session: &WorkoutSession) -> Vec<SlotStatus> {
        session.slots().iter().map(|s| s.status).collect()
    }

    fn stored(id: i64, exercise_id: i64, set_number: u32, weight: f64, reps: u32, set_type: SetType) -> Set {
        Set {
            id,
            workout_id: 1,
            exercise_id,
            set_number,
            weight,
            reps,
            rpe: None,
            set_type,
            completed_at: Utc::now(),
        }
    }

    use SlotStatus::*;

    #[test]
    fn test_start_activates_first_slot() {
        let session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        assert_eq!(statuses(&session), vec![Active, Pending, Pending]);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.mode(), SessionMode::Program);
    }

    #[test]
    fn test_start_empty_program_fails() {
        assert_eq!(WorkoutSession::start(1, &[]).unwrap_err(), NavError::NoSlots);
        let free = WorkoutSession::freestyle(1);
        assert!(free.slots().is_empty());
        assert_eq!(free.current_index(), None);
    }

    #[test]
    fn test_log_set_numbers_and_totals() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::start(1, &template(&[10, 20])).unwrap();

        let first = session.log_set(&store, 10, SetEntry::new(185.0, 10, None), SetType::Working).unwrap();
        let second = session.log_set(&store, 10, SetEntry::new(185.0, 8, Some(8.5)), SetType::Working).unwrap();
        assert_eq!((first.set_number, second.set_number), (1, 2));

        let totals = session.totals();
        assert_eq!(totals.total_volume, 1850.0 + 1480.0);
        assert_eq!(totals.total_sets, 2);
        assert_eq!(totals.distinct_exercise_ids.len(), 1);
        assert_eq!(session.slots()[0].logged_set_numbers, vec![1, 2]);
        // logging never moves the session
        assert_eq!(statuses(&session), vec![Active, Pending]);
        assert_eq!(session.last_entry(10), Some(&SetEntry::new(185.0, 8, Some(8.5))));
    }

    #[test]
    fn test_warmup_counts_as_set_not_volume() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::freestyle(1);
        session.add_exercise(10, None).unwrap();
        session.log_set(&store, 10, SetEntry::new(95.0, 10, None), SetType::Warmup).unwrap();
        assert_eq!(session.totals().total_volume, 0.0);
        assert_eq!(session.totals().total_sets, 1);
    }

    #[test]
    fn test_persistence_failure_leaves_state() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::start(1, &template(&[10])).unwrap();
        session.log_set(&store, 10, SetEntry::new(100.0, 5, None), SetType::Working).unwrap();
        let before = session.clone();

        store.fail_writes.set(true);
        let err = session
            .log_set(&store, 10, SetEntry::new(105.0, 5, None), SetType::Working)
            .unwrap_err();
        assert!(matches!(err, SessionError::PersistenceFailed(_)));
        assert_eq!(session.totals(), before.totals());
        assert_eq!(session.slots(), before.slots());
        assert_eq!(session.next_set_number(10), 2);

        // retry succeeds with the same number
        store.fail_writes.set(false);
        let set = session.log_set(&store, 10, SetEntry::new(105.0, 5, None), SetType::Working).unwrap();
        assert_eq!(set.set_number, 2);
    }

    #[test]
    fn test_log_set_rejects_bounds_without_writing() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::start(1, &template(&[10])).unwrap();
        let err = session
            .log_set(&store, 10, SetEntry::new(0.0, 5, None), SetType::Working)
            .unwrap_err();
        assert!(matches!(err, SessionError::Rejected(RejectReason::NonPositiveWeight)));
        assert!(store.sets.borrow().is_empty());
    }

    #[test]
    fn test_finish_current_advances_and_ends() {
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        assert_eq!(session.finish_current_slot(), Ok(Some(1)));
        assert_eq!(session.skip_current_slot(), Ok(Some(2)));
        assert_eq!(session.finish_current_slot(), Ok(None));
        assert_eq!(statuses(&session), vec![Completed, Skipped, Completed]);
        assert!(session.all_slots_visited());
        assert_eq!(session.finish_current_slot(), Err(NavError::NoActiveSlot));
    }

    #[test]
    fn test_finish_current_wraps_to_jumped_over_slot() {
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        session.jump_to(2).unwrap();
        assert_eq!(statuses(&session), vec![Pending, Pending, Active]);
        assert_eq!(session.finish_current_slot(), Ok(Some(0)));
        assert_eq!(statuses(&session), vec![Active, Pending, Completed]);
    }

    #[test]
    fn test_jump_out_of_range_is_rejected() {
        let mut session = WorkoutSession::start(1, &template(&[10, 20])).unwrap();
        let before = statuses(&session);
        assert_eq!(session.jump_to(5), Err(NavError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(statuses(&session), before);
        assert_eq!(session.current_index(), Some(0));
    }

    #[test]
    fn test_jump_to_completed_or_active_rejected() {
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        session.finish_current_slot().unwrap();
        assert_eq!(
            session.jump_to(0),
            Err(NavError::SlotNotAvailable { index: 0, status: Completed })
        );
        assert_eq!(
            session.jump_to(1),
            Err(NavError::SlotNotAvailable { index: 1, status: Active })
        );
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn test_skip_and_return() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        session.skip_current_slot().unwrap();
        session.log_set(&store, 20, SetEntry::new(50.0, 10, None), SetType::Working).unwrap();

        // leaving an active slot with sets completes it
        session.jump_to(0).unwrap();
        assert_eq!(statuses(&session), vec![Active, Completed, Pending]);
        assert_eq!(session.finish_current_slot(), Ok(Some(2)));
    }

    #[test]
    fn test_exactly_one_active() {
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30, 40])).unwrap();
        session.jump_to(3).unwrap();
        session.jump_to(1).unwrap();
        session.skip_current_slot().unwrap();
        let active = session.slots().iter().filter(|s| s.status == Active).count();
        assert_eq!(active, 1);
    }

    #[test]
    fn test_finish_workout_now() {
        let store = MemoryStore::default();
        let mut session = WorkoutSession::start(1, &template(&[10, 20, 30])).unwrap();
        session.log_set(&store, 10, SetEntry::new(100.0, 5, None), SetType::Working).unwrap();

        assert_eq!(session.finish_workout_now(), Ok(vec![1, 2]));
        assert_eq!(statuses(&session), vec![Completed, Skipped, Skipped]);
        assert!(session.is_finished());
        assert!(!session.all_slots_visited());
        assert_eq!(session.jump_to(1), Err(NavError::Finished));
        assert!(matches!(
            session.log_set(&store, 10, SetEntry::new(100.0, 5, None), SetType::Working),
            Err(SessionError::InvalidNavigation(NavError::Finished))
        ));
    }

    #[test]
    fn test_freestyle_add_exercise() {
        let mut session = WorkoutSession::freestyle(1);
        assert_eq!(session.add_exercise(10, Some("Squat".into())), Ok(0));
        assert_eq!(session.add_exercise(20, None), Err(NavError::SlotStillActive));
        assert_eq!(session.finish_current_slot(), Ok(None));
        assert_eq!(session.add_exercise(20, None), Ok(1));
        assert_eq!(session.slots()[1].display_name(), "Exercise #20");
    }

    #[test]
    fn test_reconstruct_resume_scenario() {
        let persisted = vec![
            stored(1, 10, 1, 185.0, 10, SetType::Working),
            stored(2, 10, 2, 185.0, 8, SetType::Working),
            stored(3, 10, 3, 185.0, 7, SetType::Working),
            stored(4, 30, 1, 95.0, 12, SetType::Warmup),
            stored(5, 30, 2, 135.0, 10, SetType::Working),
        ];
        let template = template(&[10, 20, 30, 40]);
        let session = WorkoutSession::reconstruct(1, &persisted, Some(&template));

        assert_eq!(statuses(&session), vec![Completed, Pending, Completed, Pending]);
        assert_eq!(session.slots()[0].logged_set_numbers.iter().max(), Some(&3));
        assert_eq!(session.slots()[2].logged_set_numbers.iter().max(), Some(&2));
        assert_eq!(session.next_set_number(10), 4);
        assert_eq!(session.next_set_number(20), 1);
        assert_eq!(session.current_index(), None);

        // volume only over working sets
        assert_eq!(session.totals().total_volume, 185.0 * 25.0 + 1350.0);
        assert_eq!(session.totals().total_sets, 5);
        assert_eq!(session.last_entry(10), Some(&SetEntry::new(185.0, 7, None)));
    }

    #[test]
    fn test_reconstruct_is_idempotent() {
        let persisted = vec![
            stored(1, 20, 1, 100.0, 5, SetType::Working),
            stored(2, 20, 2, 100.0, 5, SetType::Working),
        ];
        let template = template(&[10, 20, 30]);
        let a = WorkoutSession::reconstruct(1, &persisted, Some(&template));
        let b = WorkoutSession::reconstruct(1, &persisted, Some(&template));
        assert_eq!(a.slots(), b.slots());
        assert_eq!(a.totals(), b.totals());
    }

    #[test]
    fn test_reconstruct_then_continue_numbering() {
        let store = MemoryStore::default();
        let persisted = vec![stored(1, 10, 1, 100.0, 5, SetType::Working), stored(2, 10, 2, 100.0, 5, SetType::Working)];
        let mut session = WorkoutSession::reconstruct(1, &persisted, Some(&template(&[10, 20])));
        assert_eq!(session.activate_next(), Some(1));

        session.jump_to(0).unwrap_err();
        let set = session.log_set(&store, 10, SetEntry::new(100.0, 5, None), SetType::Working).unwrap();
        assert_eq!(set.set_number, 3);
    }

    #[test]
    fn test_reconstruct_freestyle_keeps_numbering() {
        let persisted = vec![stored(1, 10, 1, 100.0, 5, SetType::Working)];
        let mut session = WorkoutSession::reconstruct(1, &persisted, None);
        assert_eq!(session.mode(), SessionMode::Freestyle);
        assert!(session.slots().is_empty());

        session.add_exercise(10, None).unwrap();
        assert_eq!(session.slots()[0].logged_set_numbers, vec![1]);
        assert_eq!(session.next_set_number(10), 2);
    }
}
