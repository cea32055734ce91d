//! lift - Personal strength training log

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lift::calc::Formula;
use lift::config::{self, Settings};
use lift::console::{self, StartOptions};
use lift::db::{
    Database, ExerciseLookup, NewExercise, PersonalRecord, ProgramFile, RecordType, SetStore,
    TemplateProvider,
};
use lift::exercises::Category;
use lift::records;
use lift::stats::{Analytics, MuscleVolumeTracker, ProgressPredictor};
use lift::tui::App;

#[derive(Parser)]
#[command(name = "lift")]
#[command(author, version, about = "Strength training log with programs and personal records")]
struct Cli {
    /// SQLite database file [default: ~/.lift/lift.db]
    #[arg(long, global = true, env = "LIFT_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Log and review workouts
    #[command(subcommand)]
    Workout(WorkoutCommand),

    /// Manage logged sets
    #[command(subcommand)]
    Set(SetCommand),

    /// Browse and extend the exercise catalog
    #[command(subcommand)]
    Exercise(ExerciseCommand),

    /// Import and manage training programs
    #[command(subcommand)]
    Program(ProgramCommand),

    /// Personal records
    #[command(subcommand)]
    Pr(PrCommand),

    /// Show training statistics
    Stats {
        /// Exercise to show progression for
        exercise: Option<String>,

        /// Only consider the last N weeks
        #[arg(short, long)]
        weeks: Option<i64>,
    },

    /// Read and change settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum WorkoutCommand {
    /// Start logging a workout (next day of the active program unless --freestyle)
    Start {
        #[arg(short, long)]
        name: Option<String>,

        /// Pick exercises as you go instead of following the program
        #[arg(short, long)]
        freestyle: bool,

        #[arg(short, long)]
        bodyweight: Option<f64>,
    },

    /// Continue an unfinished workout
    Resume {
        /// Workout id [default: most recent unfinished]
        id: Option<i64>,
    },

    /// Show the most recent workout
    Last,

    /// List recent workouts
    History {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Delete a workout with its sets and records
    Delete {
        id: i64,

        /// Do not ask for confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SetCommand {
    /// Delete a single set
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// List exercises
    List {
        /// push, pull, legs or core
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Add a custom exercise
    Add {
        name: String,

        #[arg(short, long)]
        category: String,

        /// Primary muscle group
        #[arg(short, long)]
        muscle: String,

        /// Secondary muscle groups, comma separated
        #[arg(short, long, value_delimiter = ',')]
        secondary: Vec<String>,

        #[arg(short, long, default_value = "barbell")]
        equipment: String,
    },

    /// Show one exercise with its records
    Show { name: String },
}

#[derive(Subcommand)]
enum ProgramCommand {
    /// Import programs from a JSON file
    Import { file: PathBuf },

    /// List programs
    List,

    /// Show a program's workouts and prescriptions
    Show { name: String },

    /// Make a program the active one
    Activate { name: String },

    /// Delete a program
    Delete { name: String },
}

#[derive(Subcommand)]
enum PrCommand {
    /// Best record of each type
    List {
        #[arg(short, long)]
        exercise: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Progression of one record type
    History {
        exercise: String,

        /// 1RM, 3RM, 5RM, 10RM, volume or max_weight
        record_type: String,
    },

    /// Run record detection on a workout again
    Detect { workout_id: i64 },

    /// Delete a record
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Get { key: String },
    Set { key: String, value: String },
    List,
    /// Restore every setting to its default
    Reset,
    /// Remove a stored value so the default applies again
    Delete { key: String },
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never mix with prompts
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let db = open_database(cli.db.unwrap_or_else(config::default_db_path))?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(db)?;
            app.run()?;
        }
        Some(Commands::Workout(cmd)) => workout_command(&db, cmd)?,
        Some(Commands::Set(SetCommand::Delete { id })) => {
            if db.delete_set(id)? {
                println!("Deleted set {}", id);
            } else {
                bail!("set {} not found", id);
            }
        }
        Some(Commands::Exercise(cmd)) => exercise_command(&db, cmd)?,
        Some(Commands::Program(cmd)) => program_command(&db, cmd)?,
        Some(Commands::Pr(cmd)) => pr_command(&db, cmd)?,
        Some(Commands::Stats { exercise, weeks }) => stats_command(&db, exercise, weeks)?,
        Some(Commands::Config(cmd)) => config_command(&db, cmd)?,
    }

    Ok(())
}

fn open_database(path: PathBuf) -> Result<Database> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let path_str = path.to_string_lossy();
    Database::open(&path_str).with_context(|| format!("cannot open database {}", path_str))
}

fn find_exercise(db: &Database, name: &str) -> Result<lift::db::Exercise> {
    db.find_exercise(name)?
        .with_context(|| format!("no exercise matches '{}'", name))
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn workout_command(db: &Database, cmd: WorkoutCommand) -> Result<()> {
    match cmd {
        WorkoutCommand::Start { name, freestyle, bodyweight } => {
            let settings = Settings::load(db)?;
            if !freestyle && let Some(open) = db.last_unfinished_workout()? {
                println!(
                    "Workout {} from {} is still open; `lift workout resume` continues it.",
                    open.id,
                    open.date.format("%Y-%m-%d")
                );
            }
            let (workout, session) = console::start(db, &StartOptions { name, freestyle, bodyweight })?;
            let stdin = std::io::stdin();
            console::run(db, &settings, &workout, session, stdin.lock(), &mut std::io::stdout())?;
        }

        WorkoutCommand::Resume { id } => {
            let settings = Settings::load(db)?;
            let (workout, session) = console::resume(db, id)?;
            let stdin = std::io::stdin();
            console::run(db, &settings, &workout, session, stdin.lock(), &mut std::io::stdout())?;
        }

        WorkoutCommand::Last => {
            let Some(workout) = db.last_workout()? else {
                println!("No workouts yet. Start one with `lift workout start`.");
                return Ok(());
            };
            let unit = Settings::load(db)?.weight_unit;
            let summary = db.workout_summary(workout.id)?;

            println!(
                "{} | {} (workout {}){}",
                workout.date.format("%Y-%m-%d %H:%M"),
                workout.name.as_deref().unwrap_or("Workout"),
                workout.id,
                if workout.completed { "" } else { " [open]" }
            );
            println!("{:-<60}", "");
            let mut current_exercise = None;
            for set in db.sets_for_workout(workout.id)? {
                if current_exercise != Some(set.exercise_id) {
                    println!("{}", db.exercise_label(set.exercise_id)?);
                    current_exercise = Some(set.exercise_id);
                }
                let rpe = set.rpe.map(|r| format!(" @ {}", r)).unwrap_or_default();
                println!(
                    "  #{:<3} {} {} x {}{}  [{}] (set {})",
                    set.set_number,
                    set.weight,
                    unit.as_str(),
                    set.reps,
                    rpe,
                    set.set_type,
                    set.id
                );
            }
            println!("{:-<60}", "");
            println!(
                "{} sets, {} exercises, {:.0} {} volume",
                summary.total_sets,
                summary.exercises,
                summary.total_volume,
                unit.as_str()
            );
        }

        WorkoutCommand::History { limit } => {
            let workouts = db.recent_workouts(limit)?;
            println!("Recent workouts:");
            println!("{:-<70}", "");
            for w in &workouts {
                let summary = db.workout_summary(w.id)?;
                println!(
                    "{:>4} | {} | {:20} | {:>3} sets | {:>8.0} vol | {}",
                    w.id,
                    w.date.format("%Y-%m-%d"),
                    w.name.as_deref().unwrap_or("Workout"),
                    summary.total_sets,
                    summary.total_volume,
                    w.duration_minutes
                        .map(|m| format!("{} min", m))
                        .unwrap_or_else(|| "open".to_string())
                );
            }
        }

        WorkoutCommand::Delete { id, force } => {
            let Some(workout) = db.workout(id)? else {
                bail!("workout {} not found", id);
            };
            let summary = db.workout_summary(id)?;
            let question = format!(
                "Delete workout {} from {} with {} sets?",
                id,
                workout.date.format("%Y-%m-%d"),
                summary.total_sets
            );
            if !force && !confirm(&question)? {
                println!("Kept workout {}", id);
                return Ok(());
            }
            db.delete_workout(id)?;
            println!("Deleted workout {}", id);
        }
    }
    Ok(())
}

fn exercise_command(db: &Database, cmd: ExerciseCommand) -> Result<()> {
    match cmd {
        ExerciseCommand::List { category } => {
            let category = category.map(|c| c.parse::<Category>()).transpose()?;
            for e in db.exercises(category)? {
                println!(
                    "{} {:28} {:12} {:12}{}",
                    e.category.emoji(),
                    e.name,
                    e.primary_muscle,
                    e.equipment,
                    if e.is_custom { " (custom)" } else { "" }
                );
            }
        }

        ExerciseCommand::Add { name, category, muscle, secondary, equipment } => {
            let exercise = NewExercise {
                name,
                category: category.parse()?,
                primary_muscle: muscle.parse()?,
                secondary_muscles: secondary
                    .iter()
                    .map(|m| m.trim().parse())
                    .collect::<Result<Vec<_>>>()?,
                equipment: equipment.parse()?,
            };
            let id = db.add_exercise(&exercise)?;
            println!("Added {} (id: {})", exercise.name.trim(), id);
        }

        ExerciseCommand::Show { name } => {
            let e = find_exercise(db, &name)?;
            println!("{} {}", e.category.emoji(), e.name);
            println!("{:-<40}", "");
            println!("Category:  {}", e.category);
            println!("Primary:   {}", e.primary_muscle);
            if !e.secondary_muscles.is_empty() {
                let secondary: Vec<_> = e.secondary_muscles.iter().map(|m| m.name()).collect();
                println!("Secondary: {}", secondary.join(", "));
            }
            println!("Equipment: {}", e.equipment);

            let records = db.best_records(Some(e.id))?;
            if !records.is_empty() {
                println!("\nPersonal records:");
                for r in records {
                    print_record(&r, None);
                }
            }
        }
    }
    Ok(())
}

fn program_command(db: &Database, cmd: ProgramCommand) -> Result<()> {
    match cmd {
        ProgramCommand::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let parsed: ProgramFile = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid program file", file.display()))?;
            for spec in parsed.into_programs() {
                let id = db.import_program(&spec)?;
                println!("Imported '{}' (id: {}, {} workouts)", spec.name, id, spec.workouts.len());
            }
        }

        ProgramCommand::List => {
            for p in db.programs()? {
                println!(
                    "{} {:30} {} days/week{}",
                    if p.is_active { "*" } else { " " },
                    p.name,
                    p.days_per_week.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                    p.description.map(|d| format!("  {}", d)).unwrap_or_default()
                );
            }
        }

        ProgramCommand::Show { name } => {
            let program = db
                .program_by_name(&name)?
                .with_context(|| format!("program '{}' not found", name))?;
            println!("{}{}", program.name, if program.is_active { " (active)" } else { "" });
            if let Some(description) = &program.description {
                println!("{}", description);
            }
            let next = db.next_program_workout(program.id)?.map(|w| w.id);
            for day in db.program_workouts(program.id)? {
                println!(
                    "\nDay {}: {}{}",
                    day.day_number,
                    day.name,
                    if next == Some(day.id) { "  <- next" } else { "" }
                );
                for (i, ex) in db.workout_exercises(day.id)?.iter().enumerate() {
                    println!(
                        "  {}. {:28} {}",
                        i + 1,
                        ex.exercise_name
                            .clone()
                            .unwrap_or_else(|| format!("Exercise #{}", ex.exercise_id)),
                        ex.prescription.describe()
                    );
                }
            }
        }

        ProgramCommand::Activate { name } => {
            let program = db
                .program_by_name(&name)?
                .with_context(|| format!("program '{}' not found", name))?;
            db.activate_program(program.id)?;
            println!("Active program: {}", program.name);
        }

        ProgramCommand::Delete { name } => {
            let program = db
                .program_by_name(&name)?
                .with_context(|| format!("program '{}' not found", name))?;
            db.delete_program(program.id)?;
            println!("Deleted program {}", program.name);
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct RecordRow<'a> {
    exercise: String,
    #[serde(flatten)]
    record: &'a PersonalRecord,
}

fn print_record(r: &PersonalRecord, exercise: Option<&str>) {
    let set = match (r.weight, r.reps) {
        (Some(weight), Some(reps)) => format!("{} x {}", weight, reps),
        _ => "-".to_string(),
    };
    println!(
        "{:>4} | {}{:10} | {:>8.1} | {:10} | {}",
        r.id,
        exercise.map(|e| format!("{:24} | ", e)).unwrap_or_default(),
        r.record_type.label(),
        r.value,
        set,
        r.date.format("%Y-%m-%d")
    );
}

fn pr_command(db: &Database, cmd: PrCommand) -> Result<()> {
    match cmd {
        PrCommand::List { exercise, json } => {
            let exercise_id = match exercise {
                Some(name) => Some(find_exercise(db, &name)?.id),
                None => None,
            };
            let records = db.best_records(exercise_id)?;
            if json {
                let rows = records
                    .iter()
                    .map(|record| {
                        Ok(RecordRow {
                            exercise: db.exercise_label(record.exercise_id)?,
                            record,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if records.is_empty() {
                println!("No personal records yet.");
            } else {
                for r in &records {
                    print_record(r, Some(&db.exercise_label(r.exercise_id)?));
                }
            }
        }

        PrCommand::History { exercise, record_type } => {
            let e = find_exercise(db, &exercise)?;
            let record_type: RecordType = record_type.parse()?;
            println!("{} {} history", e.name, record_type);
            println!("{:-<50}", "");
            for r in db.record_history(e.id, record_type)? {
                print_record(&r, None);
            }
        }

        PrCommand::Detect { workout_id } => {
            if db.workout(workout_id)?.is_none() {
                bail!("workout {} not found", workout_id);
            }
            let found = records::detect(db, db, workout_id)?;
            if found.is_empty() {
                println!("No new records in workout {}", workout_id);
            }
            for r in &found {
                print_record(r, Some(&db.exercise_label(r.exercise_id)?));
            }
        }

        PrCommand::Delete { id } => {
            if db.delete_record(id)? {
                println!("Deleted record {}", id);
            } else {
                bail!("record {} not found", id);
            }
        }
    }
    Ok(())
}

fn stats_command(db: &Database, exercise: Option<String>, weeks: Option<i64>) -> Result<()> {
    let since = weeks.map(|w| Utc::now() - chrono::Duration::weeks(w));
    let analytics = Analytics::load(db, since)?;
    let unit = Settings::load(db)?.weight_unit;

    println!("Training Statistics");
    println!("{:-<40}", "");

    let Some(name) = exercise else {
        let summary = analytics.summary();
        println!("Workouts:         {}", summary.workouts);
        println!("Sets:             {}", summary.sets);
        println!("Total volume:     {:.0} {}", summary.total_volume, unit.as_str());
        if let Some(avg) = summary.avg_duration_minutes {
            println!("Average duration: {:.0} min", avg);
        }
        println!("Weekly frequency: {:.1} workouts/week", summary.weekly_frequency);
        println!("Current streak:   {} days", analytics.streak_days(Utc::now().date_naive()));

        let tracker = MuscleVolumeTracker::from_sets(analytics.sets(), &db.exercises(None)?);
        let report = tracker.report();
        if !report.is_empty() {
            println!("\nVolume by muscle:");
            for (group, volume, bar) in report {
                println!("  {} {:12} {:>10.0}", bar, group.name(), volume);
            }
        }
        return Ok(());
    };

    let e = find_exercise(db, &name)?;
    let points = analytics.progression(e.id);
    println!("Exercise: {}", e.name);
    if points.is_empty() {
        println!("No working sets logged yet.");
        return Ok(());
    }

    println!("\nBest estimated 1RM per workout:");
    for p in &points {
        println!(
            "  {} | {} x {} | {:.1} {}",
            p.date.format("%Y-%m-%d"),
            p.weight,
            p.reps,
            p.estimated_1rm,
            unit.as_str()
        );
    }

    if let Some(last) = points.last() {
        println!("\nLatest best set by formula:");
        for formula in Formula::all() {
            println!("  {:8} {:.1}", formula.name(), formula.estimate(last.weight, last.reps));
        }
    }

    match ProgressPredictor::train(&points) {
        Some(predictor) => {
            let trend = predictor.trend();
            let sign = if trend.per_week >= 0.0 { "+" } else { "" };
            println!(
                "\nTrend: {}{:.1} {}/week (R2 {:.2}, {} workouts)",
                sign,
                trend.per_week,
                unit.as_str(),
                trend.r2_score,
                trend.data_points
            );
            println!("Projected in 4 weeks: {:.1} {}", trend.in_four_weeks, unit.as_str());
        }
        None => println!("\nLog this exercise in at least three workouts to see a trend."),
    }
    Ok(())
}

fn config_command(db: &Database, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Get { key } => println!("{}", config::get_setting(db, &key)?),
        ConfigCommand::Set { key, value } => {
            let stored = config::set_setting(db, &key, &value)?;
            println!("{} = {}", key, stored);
        }
        ConfigCommand::List => {
            for (key, value, customized) in config::list_settings(db)? {
                println!("{:20} {}{}", key, value, if customized { "  (custom)" } else { "" });
            }
        }
        ConfigCommand::Reset => {
            config::reset_settings(db)?;
            println!("Settings restored to defaults");
        }
        ConfigCommand::Delete { key } => {
            config::get_setting(db, &key)?;
            if db.delete_setting(&key)? {
                println!("{} reverted to its default", key);
            } else {
                println!("{} was not set", key);
            }
        }
    }
    Ok(())
}
