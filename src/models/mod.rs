pub mod preferences;
pub mod profile;
pub mod program;
pub mod workout;

pub use preferences::{ChangeAction, SubstitutionTable, UserPreferences, WorkoutChange};
pub use profile::UserProfile;
pub use program::{DayTemplate, ExerciseSlot, Intake, Program, Split, SplitKind};
pub use workout::{DayPlan, ExerciseHistory, FinishSummary, HistoryPoint, LogEntry, NewLogEntry};
