use std::{fs, path::Path};

use shared_definitions::flight_plan::{FlightPlanDocument, FlightPlanStep};

use crate::util::{
    error::{FlightError, FlightResult},
    math::vectors::Vector3D,
};

pub fn default_flight_plan() -> Vec<FlightPlanStep> {
    vec![
        FlightPlanStep::new("RTF", 0.0, 0.0, 0.0, 0.0),
        FlightPlanStep::new("ASCENT", 0.0, 0.0, 0.5, 2.0),
        FlightPlanStep::new("HOVER", 0.0, 0.0, 0.0, 5.0),
        FlightPlanStep::new("DESCENT", 0.0, 0.0, -0.5, 2.0),
        FlightPlanStep::new("STOP", 0.0, 0.0, 0.0, 0.0),
    ]
}

pub fn validate_flight_plan(steps: &[FlightPlanStep]) -> FlightResult<()> {
    if steps.is_empty() {
        return Err(FlightError::FlightPlan("no steps".to_string()));
    }
    for step in steps {
        let values = [step.velocity_x, step.velocity_y, step.velocity_z, step.duration];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(FlightError::FlightPlan(format!("step {} is not finite", step.name)));
        }
        if step.duration < 0.0 {
            return Err(FlightError::FlightPlan(format!(
                "step {} has negative duration",
                step.name
            )));
        }
    }
    Ok(())
}

/// Reads `[[step]]` tables from a TOML file.
pub fn load_flight_plan(path: &Path) -> FlightResult<Vec<FlightPlanStep>> {
    let text = fs::read_to_string(path)?;
    let document: FlightPlanDocument =
        toml::from_str(&text).map_err(|error| FlightError::FlightPlan(error.to_string()))?;
    validate_flight_plan(&document.steps)?;
    Ok(document.steps)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanProgress {
    InProgress(Vector3D),
    /// Past the end; carries the final step's velocity.
    Complete(Vector3D),
}

/// Earth frame velocity targets over time, started once the craft is
/// ready to fly.
pub struct FlightPlan {
    steps: Vec<FlightPlanStep>,
    start_time: f64,
    current_step: Option<usize>,
}

impl FlightPlan {
    /// `steps` must be non-empty, see [`validate_flight_plan`].
    pub fn new(steps: Vec<FlightPlanStep>, start_time: f64) -> Self {
        FlightPlan {
            steps,
            start_time,
            current_step: None,
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.steps.iter().map(|step| step.duration).sum()
    }

    pub fn current_step_name(&self) -> Option<&str> {
        self.current_step
            .and_then(|index| self.steps.get(index))
            .map(|step| step.name.as_str())
    }

    pub fn get_targets(&mut self, now: f64) -> PlanProgress {
        let elapsed = now - self.start_time;
        let last_index = self.steps.len().saturating_sub(1);

        let mut cumulative = 0.0;
        let mut found = None;
        for (index, step) in self.steps.iter().enumerate() {
            cumulative += step.duration;
            if elapsed < cumulative {
                found = Some(index);
                break;
            }
        }
        let index = found.unwrap_or(last_index);

        if self.current_step != Some(index) {
            if let Some(step) = self.steps.get(index) {
                log::error!("{}", step.name);
                self.current_step = Some(index);
            }
        }

        let velocity = self
            .steps
            .get(index)
            .map(|step| Vector3D::new(step.velocity_x, step.velocity_y, step.velocity_z))
            .unwrap_or_default();
        match found {
            Some(_) => PlanProgress::InProgress(velocity),
            None => PlanProgress::Complete(velocity),
        }
    }
}

/// Ramps the hover thrust up from zero before the plan starts.
pub struct TakeoffRamp {
    hover_target: i32,
    increment: i32,
    hover_speed: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampState {
    Ramping(i32),
    /// The hover target was reached on this update.
    Ready(i32),
}

impl TakeoffRamp {
    pub fn new(hover_target: i32, motion_period: f64, rtf_period: f64) -> Self {
        TakeoffRamp {
            hover_target,
            increment: Self::increment(hover_target, motion_period, rtf_period),
            hover_speed: 0,
        }
    }

    /// Thrust added per motion period; truncated.
    pub fn increment(hover_target: i32, motion_period: f64, rtf_period: f64) -> i32 {
        (hover_target as f64 * motion_period / rtf_period) as i32
    }

    pub fn hover_speed(&self) -> i32 {
        self.hover_speed
    }

    /// One motion period. Checks before stepping, so the target is reported
    /// one period after it is first met.
    pub fn advance(&mut self) -> RampState {
        if self.hover_speed >= self.hover_target {
            self.hover_speed = self.hover_target;
            RampState::Ready(self.hover_speed)
        } else {
            self.hover_speed += self.increment;
            RampState::Ramping(self.hover_speed)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn five_step_plan() -> Vec<FlightPlanStep> {
        vec![
            FlightPlanStep::new("A", 0.0, 0.0, 0.0, 0.0),
            FlightPlanStep::new("B", 0.0, 0.0, 0.5, 2.0),
            FlightPlanStep::new("C", 0.0, 0.0, 0.0, 5.0),
            FlightPlanStep::new("D", 0.0, 0.0, -0.5, 2.0),
            FlightPlanStep::new("E", 0.0, 0.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn targets_follow_cumulative_durations() {
        let mut plan = FlightPlan::new(five_step_plan(), 10.0);

        assert_eq!(plan.get_targets(11.0), PlanProgress::InProgress(Vector3D::new(0.0, 0.0, 0.5)));
        assert_eq!(plan.current_step_name(), Some("B"));
        assert_eq!(plan.get_targets(13.0), PlanProgress::InProgress(Vector3D::new(0.0, 0.0, 0.0)));
        assert_eq!(plan.current_step_name(), Some("C"));
        assert_eq!(plan.get_targets(17.5), PlanProgress::InProgress(Vector3D::new(0.0, 0.0, -0.5)));
        assert_eq!(plan.get_targets(21.0), PlanProgress::Complete(Vector3D::new(0.0, 0.0, 0.0)));
        assert_eq!(plan.current_step_name(), Some("E"));
    }

    #[test]
    fn boundary_belongs_to_the_next_step() {
        let mut plan = FlightPlan::new(five_step_plan(), 0.0);
        assert_eq!(plan.get_targets(2.0), PlanProgress::InProgress(Vector3D::new(0.0, 0.0, 0.0)));
        assert!(matches!(plan.get_targets(9.0), PlanProgress::Complete(_)));
    }

    #[test]
    fn empty_plan_is_complete_with_no_current_step() {
        let mut plan = FlightPlan::new(Vec::new(), 0.0);
        assert_eq!(plan.get_targets(1.0), PlanProgress::Complete(Vector3D::default()));
        assert_eq!(plan.current_step_name(), None);
    }

    #[test]
    fn default_plan_lasts_nine_seconds() {
        let plan = FlightPlan::new(default_flight_plan(), 0.0);
        assert_eq!(plan.total_duration(), 9.0);
        assert!(validate_flight_plan(&default_flight_plan()).is_ok());
    }

    #[test]
    fn invalid_plans_are_rejected() {
        assert!(validate_flight_plan(&[]).is_err());
        assert!(validate_flight_plan(&[FlightPlanStep::new("X", 0.0, 0.0, 0.0, -1.0)]).is_err());
        assert!(validate_flight_plan(&[FlightPlanStep::new("X", f64::NAN, 0.0, 0.0, 1.0)]).is_err());
    }

    #[test]
    fn loads_plan_from_toml_file() {
        let path = std::env::temp_dir().join(format!("flight_plan_{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[[step]]\nname = \"UP\"\nvelocity_z = 0.3\nduration = 1.5\n\n[[step]]\nname = \"STOP\"\nduration = 0.0"
        )
        .unwrap();

        let steps = load_flight_plan(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0], FlightPlanStep::new("UP", 0.0, 0.0, 0.3, 1.5));
    }

    #[test]
    fn ramp_reaches_hover_in_whole_increments() {
        let mut ramp = TakeoffRamp::new(600, 1.0 / 43.0, 1.0);
        let mut periods = 0;
        let ready_at = loop {
            periods += 1;
            if let RampState::Ready(speed) = ramp.advance() {
                break speed;
            }
            assert!(periods < 100);
        };
        assert_eq!(ready_at, 600);
        // 13 per period, 47 periods to pass 600, then the ready check
        assert_eq!(periods, 48);
        assert_eq!(ramp.hover_speed(), 600);
    }
}
