use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Intake;

/// Profile derived from intake. Upserted on every program initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub user_id: String,
  pub goal: Option<String>,
  pub experience: Option<String>,
  pub equipment: Vec<String>,
  pub training_days_per_week: Option<i64>,
  pub known_lifts: BTreeMap<String, f64>,
}

impl UserProfile {
  pub fn from_intake(user_id: &str, intake: &Intake) -> Self {
    Self {
      user_id: user_id.to_string(),
      goal: intake.goal.clone(),
      experience: intake.experience.clone(),
      equipment: intake.equipment.clone(),
      training_days_per_week: intake.training_days_per_week,
      known_lifts: intake
        .lifts
        .as_ref()
        .map(|lifts| lifts.iter().map(|(k, v)| (k.clone(), *v)).collect())
        .unwrap_or_default(),
    }
  }
}
