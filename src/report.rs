//! Post-workout progress report
//!
//! Compares each exercise logged today against the most recent log of the
//! same exercise from a different workout.

use std::collections::{BTreeMap, HashMap};

use crate::models::LogEntry;

/// Signed delta with one decimal and a kg suffix, e.g. "+2.5kg" or "-1.0kg"
pub fn format_delta(delta_kg: f64) -> String {
  // Avoid rendering "-0.0kg" for tiny negative float noise
  let rounded = (delta_kg * 10.0).round() / 10.0;
  let rounded = if rounded == 0.0 { 0.0 } else { rounded };
  format!("{:+.1}kg", rounded)
}

/// Build the per-exercise delta map.
///
/// `prior` holds, per exercise id, the latest log from any other workout.
/// Exercises without a resolvable value on either side are left out, and an
/// empty report comes back as `None`.
pub fn build_progress_report(
  today: &[LogEntry],
  prior: &HashMap<String, LogEntry>,
) -> Option<BTreeMap<String, String>> {
  let mut latest_today: HashMap<&str, &LogEntry> = HashMap::new();
  for log in today {
    latest_today
      .entry(log.exercise_id.as_str())
      .and_modify(|current| {
        if (log.logged_at, log.id) > (current.logged_at, current.id) {
          *current = log;
        }
      })
      .or_insert(log);
  }

  let progress: BTreeMap<String, String> = latest_today
    .into_iter()
    .filter_map(|(exercise_id, log)| {
      let current = log.effective_weight()?;
      let previous = prior.get(exercise_id)?.effective_weight()?;
      Some((exercise_id.to_string(), format_delta(current - previous)))
    })
    .collect();

  if progress.is_empty() {
    None
  } else {
    Some(progress)
  }
}
