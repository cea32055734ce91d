//! Line-at-a-time driver for a workout session
//!
//! The driver never reads input itself. A front end asks [`LoggingSession::next_prompt`]
//! what to show, reads one line and hands it to [`LoggingSession::submit`].

use tracing::debug;

use super::{
    NavError, RejectReason, SessionError, SessionMode, WorkoutSession, looks_like_set, parse_set_input,
};
use crate::db::{ExerciseLookup, Set, SetStore, SetType};

/// What the front end should ask for next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// No exercise is active; an exercise name adds one
    ChooseExercise,
    /// Waiting for a set of the active slot
    SetEntry { slot: usize, exercise_id: i64, set_number: u32 },
    /// Every program exercise was completed or skipped
    AllSlotsVisited,
    Done,
}

/// Result of one submitted line
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    SetLogged(Set),
    InputRejected(RejectReason),
    NavigationRejected(NavError),
    ExerciseAdded { slot: usize },
    ExerciseNotFound(String),
    SlotFinished { next: Option<usize> },
    SlotSkipped { next: Option<usize> },
    Jumped { slot: usize },
    /// The front end should show the slot list
    Listing,
    Usage(&'static str),
    Finished { skipped: Vec<usize> },
}

enum Command<'l> {
    Done,
    Skip,
    Jump(Option<usize>),
    List,
    Finish,
    Text(&'l str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match words.next().map(str::to_lowercase).as_deref() {
        None | Some("done") => Command::Done,
        Some("skip") => Command::Skip,
        Some("list") => Command::List,
        Some("finish") => Command::Finish,
        Some("jump") => {
            let target = words.next().and_then(|w| w.parse::<usize>().ok());
            match (target, words.next()) {
                (Some(n), None) if n >= 1 => Command::Jump(Some(n - 1)),
                _ => Command::Jump(None),
            }
        }
        Some(_) => Command::Text(line),
    }
}

/// A session bound to its stores, driven one line at a time.
///
/// `submit` only returns `Err` when a store fails; rejected input and
/// navigation come back as [`Outcome`] values.
pub struct LoggingSession<'a, S: ?Sized> {
    session: WorkoutSession,
    store: &'a S,
    rpe_enabled: bool,
}

impl<'a, S> LoggingSession<'a, S>
where
    S: SetStore + ExerciseLookup + ?Sized,
{
    /// Wrap a fresh or reconstructed session; the first pending slot becomes active
    pub fn new(mut session: WorkoutSession, store: &'a S, rpe_enabled: bool) -> Self {
        session.activate_next();
        Self { session, store, rpe_enabled }
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn into_session(self) -> WorkoutSession {
        self.session
    }

    pub fn next_prompt(&self) -> Prompt {
        if self.session.is_finished() {
            return Prompt::Done;
        }
        if let Some(idx) = self.session.current_index() {
            let exercise_id = self.session.slots()[idx].exercise_id;
            return Prompt::SetEntry {
                slot: idx,
                exercise_id,
                set_number: self.session.next_set_number(exercise_id),
            };
        }
        if self.session.mode() == SessionMode::Program && self.session.all_slots_visited() {
            Prompt::AllSlotsVisited
        } else {
            Prompt::ChooseExercise
        }
    }

    pub fn submit(&mut self, line: &str) -> Result<Outcome, SessionError> {
        if self.session.is_finished() {
            return Ok(Outcome::NavigationRejected(NavError::Finished));
        }
        let outcome = match (self.next_prompt(), parse_command(line)) {
            (_, Command::List) => Outcome::Listing,
            (_, Command::Finish) => self.finish(),
            (_, Command::Jump(None)) => Outcome::Usage("jump <exercise number>"),
            (_, Command::Jump(Some(idx))) => match self.session.jump_to(idx) {
                Ok(()) => Outcome::Jumped { slot: idx },
                Err(e) => Outcome::NavigationRejected(e),
            },
            (Prompt::SetEntry { .. }, Command::Done) => match self.session.finish_current_slot() {
                Ok(next) => Outcome::SlotFinished { next },
                Err(e) => Outcome::NavigationRejected(e),
            },
            (Prompt::SetEntry { .. }, Command::Skip) => match self.session.skip_current_slot() {
                Ok(next) => Outcome::SlotSkipped { next },
                Err(e) => Outcome::NavigationRejected(e),
            },
            (Prompt::SetEntry { exercise_id, .. }, Command::Text(text)) => {
                self.log(exercise_id, text)?
            }
            (_, Command::Done) => self.finish(),
            (_, Command::Skip) => Outcome::NavigationRejected(NavError::NoActiveSlot),
            (_, Command::Text(text)) if looks_like_set(text) => {
                Outcome::InputRejected(RejectReason::NoActiveExercise)
            }
            (_, Command::Text(name)) => self.add_exercise(name)?,
        };
        debug!("Workout {}: {:?}", self.session.workout_id(), outcome);
        Ok(outcome)
    }

    fn log(&mut self, exercise_id: i64, text: &str) -> Result<Outcome, SessionError> {
        let last = self.session.last_entry(exercise_id);
        let entry = match parse_set_input(text, last, self.rpe_enabled) {
            Ok(entry) => entry,
            Err(reason) => return Ok(Outcome::InputRejected(reason)),
        };
        match self.session.log_set(self.store, exercise_id, entry, SetType::Working) {
            Ok(set) => Ok(Outcome::SetLogged(set)),
            Err(SessionError::Rejected(reason)) => Ok(Outcome::InputRejected(reason)),
            Err(SessionError::InvalidNavigation(e)) => Ok(Outcome::NavigationRejected(e)),
            Err(e) => Err(e),
        }
    }

    fn add_exercise(&mut self, name: &str) -> Result<Outcome, SessionError> {
        let found = self
            .store
            .find_exercise(name)
            .map_err(SessionError::PersistenceFailed)?;
        let Some(exercise) = found else {
            return Ok(Outcome::ExerciseNotFound(name.to_string()));
        };
        Ok(match self.session.add_exercise(exercise.id, Some(exercise.name)) {
            Ok(slot) => Outcome::ExerciseAdded { slot },
            Err(e) => Outcome::NavigationRejected(e),
        })
    }

    fn finish(&mut self) -> Outcome {
        match self.session.finish_workout_now() {
            Ok(skipped) => Outcome::Finished { skipped },
            Err(e) => Outcome::NavigationRejected(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{exercise_id, import_ppl, memory_db};
    use crate::db::{Database, NewWorkout, TemplateProvider};
    use crate::session::SlotStatus;

    fn push_session(db: &Database) -> LoggingSession<'_, Database> {
        let program = import_ppl(db);
        let push = db.program_workouts(program).unwrap().remove(0);
        let workout = db
            .create_workout(&NewWorkout {
                program_workout_id: Some(push.id),
                ..Default::default()
            })
            .unwrap();
        let template = db.workout_exercises(push.id).unwrap();
        LoggingSession::new(WorkoutSession::start(workout.id, &template).unwrap(), db, true)
    }

    fn logged(outcome: Outcome) -> Set {
        match outcome {
            Outcome::SetLogged(set) => set,
            other => panic!("expected a logged set, got {:?}", other),
        }
    }

    #[test]
    fn test_program_walkthrough() {
        let db = memory_db();
        let bench = exercise_id(&db, "Bench Press");
        let mut driver = push_session(&db);

        assert_eq!(
            driver.next_prompt(),
            Prompt::SetEntry { slot: 0, exercise_id: bench, set_number: 1 }
        );
        let first = logged(driver.submit("185 10").unwrap());
        let second = logged(driver.submit("s").unwrap());
        assert_eq!((first.set_number, second.set_number), (1, 2));
        assert_eq!(second.weight, 185.0);

        let third = logged(driver.submit("+5 8").unwrap());
        assert_eq!((third.weight, third.reps), (190.0, 8));

        assert_eq!(driver.submit("").unwrap(), Outcome::SlotFinished { next: Some(1) });
        assert_eq!(driver.submit("skip").unwrap(), Outcome::SlotSkipped { next: Some(2) });
        assert_eq!(driver.submit("done").unwrap(), Outcome::SlotFinished { next: None });
        assert_eq!(driver.next_prompt(), Prompt::AllSlotsVisited);

        // come back to the skipped one
        assert_eq!(driver.submit("jump 2").unwrap(), Outcome::Jumped { slot: 1 });
        logged(driver.submit("95 10").unwrap());
        assert_eq!(driver.submit("done").unwrap(), Outcome::SlotFinished { next: None });

        assert_eq!(driver.submit("").unwrap(), Outcome::Finished { skipped: vec![] });
        assert_eq!(driver.next_prompt(), Prompt::Done);
        assert_eq!(db.sets_for_workout(driver.session().workout_id()).unwrap().len(), 4);
    }

    #[test]
    fn test_rejected_input_writes_nothing() {
        let db = memory_db();
        let mut driver = push_session(&db);
        let workout_id = driver.session().workout_id();

        assert_eq!(driver.submit("s").unwrap(), Outcome::InputRejected(RejectReason::NoPreviousSet));
        assert_eq!(driver.submit("heavy 5").unwrap(), Outcome::InputRejected(RejectReason::Malformed));
        assert_eq!(driver.submit("0 5").unwrap(), Outcome::InputRejected(RejectReason::NonPositiveWeight));
        assert!(db.sets_for_workout(workout_id).unwrap().is_empty());
        assert!(matches!(driver.next_prompt(), Prompt::SetEntry { set_number: 1, .. }));
    }

    #[test]
    fn test_bad_jumps() {
        let db = memory_db();
        let mut driver = push_session(&db);
        assert_eq!(
            driver.submit("jump 9").unwrap(),
            Outcome::NavigationRejected(NavError::IndexOutOfRange { index: 8, len: 3 })
        );
        assert_eq!(driver.submit("jump").unwrap(), Outcome::Usage("jump <exercise number>"));
        assert_eq!(driver.submit("jump 0").unwrap(), Outcome::Usage("jump <exercise number>"));
        assert_eq!(driver.session().current_index(), Some(0));
    }

    #[test]
    fn test_finish_skips_remaining() {
        let db = memory_db();
        let mut driver = push_session(&db);
        logged(driver.submit("185 5").unwrap());
        assert_eq!(driver.submit("list").unwrap(), Outcome::Listing);
        assert_eq!(driver.submit("finish").unwrap(), Outcome::Finished { skipped: vec![1, 2] });
        assert_eq!(
            driver.submit("185 5").unwrap(),
            Outcome::NavigationRejected(NavError::Finished)
        );
    }

    #[test]
    fn test_freestyle_flow() {
        let db = memory_db();
        let squat = exercise_id(&db, "Squat");
        let workout = db.create_workout(&NewWorkout::default()).unwrap();
        let mut driver = LoggingSession::new(WorkoutSession::freestyle(workout.id), &db, true);

        assert_eq!(driver.next_prompt(), Prompt::ChooseExercise);
        assert_eq!(
            driver.submit("moon jump").unwrap(),
            Outcome::ExerciseNotFound("moon jump".to_string())
        );
        assert_eq!(driver.submit("skip").unwrap(), Outcome::NavigationRejected(NavError::NoActiveSlot));
        assert_eq!(driver.submit("squat").unwrap(), Outcome::ExerciseAdded { slot: 0 });
        assert_eq!(
            driver.next_prompt(),
            Prompt::SetEntry { slot: 0, exercise_id: squat, set_number: 1 }
        );
        let set = logged(driver.submit("225 5 8.5").unwrap());
        assert_eq!(set.rpe, Some(8.5));
        assert_eq!(driver.submit("").unwrap(), Outcome::SlotFinished { next: None });
        assert_eq!(driver.next_prompt(), Prompt::ChooseExercise);
        assert_eq!(driver.submit("").unwrap(), Outcome::Finished { skipped: vec![] });
    }

    #[test]
    fn test_set_shorthand_without_exercise_rejected() {
        let db = memory_db();
        let workout = db.create_workout(&NewWorkout::default()).unwrap();
        let mut driver = LoggingSession::new(WorkoutSession::freestyle(workout.id), &db, true);

        for input in ["s", "+5", "-10 8", "185 5"] {
            assert_eq!(
                driver.submit(input).unwrap(),
                Outcome::InputRejected(RejectReason::NoActiveExercise),
                "input: {:?}",
                input
            );
        }
        assert_eq!(driver.submit("%").unwrap(), Outcome::ExerciseNotFound("%".to_string()));
        assert!(driver.session().slots().is_empty());
        assert_eq!(driver.next_prompt(), Prompt::ChooseExercise);
    }

    #[test]
    fn test_rpe_disabled_drops_third_token() {
        let db = memory_db();
        let workout = db.create_workout(&NewWorkout::default()).unwrap();
        let mut driver = LoggingSession::new(WorkoutSession::freestyle(workout.id), &db, false);
        driver.submit("bench press").unwrap();
        let set = logged(driver.submit("185 5 9").unwrap());
        assert_eq!(set.rpe, None);
    }

    #[test]
    fn test_resume_activates_first_pending() {
        let db = memory_db();
        let mut driver = push_session(&db);
        let workout_id = driver.session().workout_id();
        logged(driver.submit("185 5").unwrap());
        logged(driver.submit("185 5").unwrap());
        let template = {
            let workout = db.workout(workout_id).unwrap().unwrap();
            db.workout_exercises(workout.program_workout_id.unwrap()).unwrap()
        };
        drop(driver);

        let persisted = db.sets_for_workout(workout_id).unwrap();
        let session = WorkoutSession::reconstruct(workout_id, &persisted, Some(&template));
        let mut resumed = LoggingSession::new(session, &db, true);

        let statuses: Vec<_> = resumed.session().slots().iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![SlotStatus::Completed, SlotStatus::Active, SlotStatus::Pending]);

        // going back to the first exercise continues its numbering
        assert_eq!(
            resumed.submit("jump 1").unwrap(),
            Outcome::NavigationRejected(NavError::SlotNotAvailable { index: 0, status: SlotStatus::Completed })
        );
        resumed.submit("finish").unwrap();
        let bench = exercise_id(&db, "Bench Press");
        assert_eq!(resumed.session().next_set_number(bench), 3);
    }
}
