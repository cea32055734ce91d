//! Interactive set logging on a terminal
//!
//! Reads one line per prompt and feeds it to the session driver. Every set is
//! stored as soon as it is entered, so closing the input leaves a workout that
//! `workout resume` can pick up again.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::db::{Database, NewWorkout, PersonalRecord, SetStore, TemplateProvider, Workout};
use crate::records;
use crate::session::{LoggingSession, Outcome, Prompt, SessionMode, WorkoutSession};

/// How `workout start` should build the session
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    pub name: Option<String>,
    pub freestyle: bool,
    pub bodyweight: Option<f64>,
}

/// How an interactive run ended
#[derive(Debug)]
pub enum RunEnd {
    Finished { records: Vec<PersonalRecord> },
    /// Input ran out before `finish`
    LeftOpen,
}

/// Create the workout row and its session; the active program's next day unless freestyle
pub fn start(db: &Database, options: &StartOptions) -> Result<(Workout, WorkoutSession)> {
    let day = if options.freestyle {
        None
    } else {
        match db.active_program()? {
            Some(program) => db.next_program_workout(program.id)?,
            None => {
                info!("No active program, starting a freestyle workout");
                None
            }
        }
    };

    let template = match &day {
        Some(day) => db.workout_exercises(day.id)?,
        None => Vec::new(),
    };
    if day.is_some() && template.is_empty() {
        bail!("program workout has no exercises; start with --freestyle");
    }

    let workout = db.create_workout(&NewWorkout {
        name: options
            .name
            .clone()
            .or_else(|| day.as_ref().map(|d| d.name.clone())),
        program_workout_id: day.as_ref().map(|d| d.id),
        bodyweight: options.bodyweight,
        ..Default::default()
    })?;

    let session = if template.is_empty() {
        WorkoutSession::freestyle(workout.id)
    } else {
        WorkoutSession::start(workout.id, &template)?
    };
    Ok((workout, session))
}

/// Rebuild the session of an unfinished workout from its stored sets
pub fn resume(db: &Database, workout_id: Option<i64>) -> Result<(Workout, WorkoutSession)> {
    let workout = match workout_id {
        Some(id) => db.workout(id)?,
        None => db.last_unfinished_workout()?,
    };
    let Some(workout) = workout else {
        bail!("no unfinished workout to resume");
    };
    if workout.completed {
        bail!("workout {} is already finished", workout.id);
    }

    let persisted = db.sets_for_workout(workout.id)?;
    let template = match workout.program_workout_id {
        Some(day) => Some(db.workout_exercises(day)?).filter(|t| !t.is_empty()),
        None => None,
    };
    let session = WorkoutSession::reconstruct(workout.id, &persisted, template.as_deref());
    Ok((workout, session))
}

/// Drive a session from `input` until it is finished or the input ends
pub fn run<R: BufRead, W: Write>(
    db: &Database,
    settings: &Settings,
    workout: &Workout,
    session: WorkoutSession,
    mut input: R,
    out: &mut W,
) -> Result<RunEnd> {
    let unit = settings.weight_unit.as_str();
    let mut driver = LoggingSession::new(session, db, settings.rpe_enabled);
    let mut shown_slot: Option<usize> = None;

    writeln!(
        out,
        "{} (workout {})",
        workout.name.as_deref().unwrap_or("Workout"),
        workout.id
    )?;
    writeln!(
        out,
        "Sets: <weight> <reps> [rpe], s (same), +5/-5 [reps] [rpe]. Commands: done, skip, jump <n>, list, finish"
    )?;

    loop {
        match driver.next_prompt() {
            Prompt::Done => break,
            Prompt::SetEntry { slot, exercise_id, set_number } => {
                if shown_slot != Some(slot) {
                    show_exercise(db, &driver, slot, exercise_id, workout.id, unit, out)?;
                    shown_slot = Some(slot);
                }
                write!(out, "Set {}> ", set_number)?;
            }
            Prompt::ChooseExercise => {
                shown_slot = None;
                write!(out, "\nExercise (name, or done to finish)> ")?;
            }
            Prompt::AllSlotsVisited => {
                shown_slot = None;
                writeln!(out, "\nAll exercises visited. jump <n> to go back, a name adds an exercise, done finishes.")?;
                write!(out, "> ")?;
            }
        }
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            writeln!(
                out,
                "Workout {} left open; continue with `lift workout resume {}`",
                workout.id, workout.id
            )?;
            info!("Input closed, workout {} left unfinished", workout.id);
            return Ok(RunEnd::LeftOpen);
        }

        match driver.submit(&line) {
            Ok(outcome) => report(&driver, outcome, settings, unit, out)?,
            Err(e) => {
                warn!("Workout {}: {}", workout.id, e);
                writeln!(out, "  Could not save: {}", e)?;
            }
        }
    }

    let session = driver.into_session();
    let minutes = (Utc::now() - workout.date).num_minutes().max(0) as u32;
    db.finish_workout(workout.id, minutes)?;

    let totals = session.totals();
    writeln!(out, "\nWorkout complete: {} min", minutes)?;
    writeln!(
        out,
        "  {} sets, {} exercises, {:.0} {} volume",
        totals.total_sets,
        totals.distinct_exercise_ids.len(),
        totals.total_volume,
        unit
    )?;

    let records = if settings.auto_detect_pr {
        records::detect(db, db, workout.id)?
    } else {
        Vec::new()
    };
    for record in &records {
        writeln!(
            out,
            "  New PR! {} {}: {:.1} ({} x {})",
            db.exercise_label(record.exercise_id)?,
            record.record_type,
            record.value,
            record.weight.unwrap_or_default(),
            record.reps.unwrap_or_default()
        )?;
    }
    Ok(RunEnd::Finished { records })
}

fn show_exercise<W: Write>(
    db: &Database,
    driver: &LoggingSession<'_, Database>,
    slot_idx: usize,
    exercise_id: i64,
    workout_id: i64,
    unit: &str,
    out: &mut W,
) -> Result<()> {
    let session = driver.session();
    let slot = &session.slots()[slot_idx];

    writeln!(out)?;
    if session.mode() == SessionMode::Program {
        writeln!(out, "[{}/{}] {}", slot_idx + 1, session.slots().len(), slot.display_name())?;
    } else {
        writeln!(out, "{}", slot.display_name())?;
    }
    if let Some(prescription) = &slot.prescription {
        writeln!(out, "  Target: {}", prescription.describe())?;
        if let Some(notes) = &prescription.notes {
            writeln!(out, "  Notes: {}", notes)?;
        }
    }

    let last = db.last_performance(exercise_id, Some(workout_id))?;
    if let Some(first) = last.first() {
        let sets: Vec<String> = last.iter().map(|s| format!("{}x{}", s.weight, s.reps)).collect();
        writeln!(
            out,
            "  Last time ({}): {} {}",
            first.completed_at.format("%Y-%m-%d"),
            sets.join(", "),
            unit
        )?;
    }
    if !slot.logged_set_numbers.is_empty() {
        writeln!(out, "  Already logged: {} sets", slot.logged_set_numbers.len())?;
    }
    Ok(())
}

fn report<W: Write>(
    driver: &LoggingSession<'_, Database>,
    outcome: Outcome,
    settings: &Settings,
    unit: &str,
    out: &mut W,
) -> Result<()> {
    let session = driver.session();
    match outcome {
        Outcome::SetLogged(set) => {
            let rpe = set.rpe.map(|r| format!(" @ RPE {}", r)).unwrap_or_default();
            writeln!(
                out,
                "  ✓ {} {} x {}{} ({:.0} {} volume)",
                set.weight,
                unit,
                set.reps,
                rpe,
                set.volume(),
                unit
            )?;
            let rest = session
                .active_slot()
                .and_then(|s| s.prescription.as_ref())
                .and_then(|p| p.rest_seconds)
                .unwrap_or(settings.rest_timer_seconds);
            if rest > 0 {
                writeln!(out, "  Rest {}s", rest)?;
            }
        }
        Outcome::InputRejected(reason) => writeln!(out, "  {}", reason)?,
        Outcome::NavigationRejected(err) => writeln!(out, "  {}", err)?,
        Outcome::ExerciseNotFound(name) => {
            writeln!(out, "  No exercise matches '{}'. See `lift exercise list`.", name.trim())?
        }
        Outcome::SlotSkipped { .. } => writeln!(out, "  Skipped")?,
        Outcome::Usage(usage) => writeln!(out, "  usage: {}", usage)?,
        Outcome::Listing => {
            for (idx, slot) in session.slots().iter().enumerate() {
                let marker = if session.current_index() == Some(idx) { ">" } else { " " };
                writeln!(
                    out,
                    " {} {}. {:<28} {:<8} {} sets",
                    marker,
                    idx + 1,
                    slot.display_name(),
                    slot.status.label(),
                    slot.logged_set_numbers.len()
                )?;
            }
        }
        Outcome::Finished { skipped } if !skipped.is_empty() => {
            writeln!(out, "  {} exercises skipped", skipped.len())?
        }
        Outcome::ExerciseAdded { .. }
        | Outcome::SlotFinished { .. }
        | Outcome::Jumped { .. }
        | Outcome::Finished { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::db::RecordType;
    use crate::db::test_support::{exercise_id, import_ppl, memory_db};

    fn run_with(db: &Database, settings: &Settings, workout: &Workout, session: WorkoutSession, input: &str) -> (RunEnd, String) {
        let mut out = Vec::new();
        let end = run(db, settings, workout, session, Cursor::new(input.to_string()), &mut out).unwrap();
        (end, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_freestyle_run_detects_records() {
        let db = memory_db();
        let (workout, session) = start(&db, &StartOptions::default()).unwrap();
        assert_eq!(session.mode(), SessionMode::Freestyle);

        let (end, output) = run_with(&db, &Settings::default(), &workout, session, "squat\n225 5\ns\n\n\n");
        let RunEnd::Finished { records } = end else {
            panic!("workout should be finished");
        };
        let types: Vec<_> = records.iter().map(|r| r.record_type).collect();
        assert_eq!(types, vec![RecordType::FiveRm, RecordType::Volume, RecordType::MaxWeight]);
        assert!(output.contains("Rest 90s"));
        assert!(output.contains("New PR!"));
        assert!(db.workout(workout.id).unwrap().unwrap().completed);
    }

    #[test]
    fn test_end_of_input_leaves_workout_open() {
        let db = memory_db();
        let (workout, session) = start(&db, &StartOptions { freestyle: true, ..Default::default() }).unwrap();

        let (end, output) = run_with(&db, &Settings::default(), &workout, session, "squat\n225 5\n");
        assert!(matches!(end, RunEnd::LeftOpen));
        assert!(output.contains("left open"));
        assert!(!db.workout(workout.id).unwrap().unwrap().completed);
        assert_eq!(db.sets_for_workout(workout.id).unwrap().len(), 1);

        // resume continues numbering
        let (resumed, session) = resume(&db, None).unwrap();
        assert_eq!(resumed.id, workout.id);
        let squat = exercise_id(&db, "Squat");
        assert_eq!(session.next_set_number(squat), 2);
    }

    #[test]
    fn test_program_run_with_skip_and_finish() {
        let db = memory_db();
        let program = import_ppl(&db);
        db.activate_program(program).unwrap();

        let (workout, session) = start(&db, &StartOptions::default()).unwrap();
        assert_eq!(workout.name.as_deref(), Some("Push"));
        assert_eq!(session.slots().len(), 3);

        let settings = Settings { auto_detect_pr: false, ..Settings::default() };
        let (end, output) = run_with(&db, &settings, &workout, session, "185 8\nbad\nskip\nlist\nfinish\n");
        assert!(matches!(end, RunEnd::Finished { ref records } if records.is_empty()));
        assert!(output.contains("[1/3] Bench Press"));
        assert!(output.contains("Target: 4 x 5-8 @ RPE 8, rest 180s"));
        assert!(output.contains("Rest 180s"));
        assert!(output.contains("Skipped"));
        assert!(output.contains("2 exercises skipped"));
        assert_eq!(db.workout_summary(workout.id).unwrap().total_sets, 1);
    }

    #[test]
    fn test_resume_finished_workout_fails() {
        let db = memory_db();
        let (workout, _) = start(&db, &StartOptions::default()).unwrap();
        db.finish_workout(workout.id, 30).unwrap();
        assert!(resume(&db, Some(workout.id)).is_err());
        assert!(resume(&db, None).is_err());
    }
}
