//! Pin state transition emission
//!
//! The emitter owns the persisted [`PinState`] for one run over a document.
//! For every motion line it works out the state the line asks for, emits a
//! pin command for each pin that differs, and records the new state. Pins
//! that already hold the requested level are never written again.

use robopost_core::{Activity, Direction, PinState, SpeedMode};
use robopost_settings::PostProcessConfig;

use super::command::{DebugComment, DwellCommand, PinCommand};
use super::parser::{LineClass, LineClassifier, MotionLine, ParameterError};

/// Text added around one original line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Commands placed before the line, in output order
    pub prefix: Vec<String>,
    /// Comment placed after the line
    pub suffix: Option<String>,
}

impl Annotation {
    /// Whether nothing is added to the line
    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_none()
    }

    /// Join the annotation around `line`
    pub fn wrap(&self, line: &str) -> String {
        let mut out = String::with_capacity(
            line.len()
                + self.prefix.iter().map(String::len).sum::<usize>()
                + self.suffix.as_ref().map_or(0, String::len),
        );
        for command in &self.prefix {
            out.push_str(command);
        }
        out.push_str(line);
        if let Some(suffix) = &self.suffix {
            out.push_str(suffix);
        }
        out
    }
}

/// State requested by a single motion line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    /// Pin state the line requires
    pub desired: PinState,
    /// Time to run the extruder at set speed with the robot stopped, only
    /// computed for extrusion without spatial movement
    pub dwell_seconds: Option<f64>,
}

impl MotionPlan {
    /// Work out the requested state for `motion` given the current state
    ///
    /// With no extrusion only the activity pin is switched off; direction and
    /// speed keep their current levels.
    pub fn for_motion(current: PinState, motion: &MotionLine, set_speed: f64) -> Self {
        let mut desired = current;
        let mut dwell_seconds = None;
        let extrusion = motion.extrusion.unwrap_or(0.0);

        if extrusion == 0.0 {
            desired.activity = Activity::Off;
        } else {
            desired.activity = Activity::On;
            desired.direction = Direction::from_extrusion(extrusion);

            if motion.has_spatial_axis {
                desired.speed = SpeedMode::Proportional;
            } else {
                desired.speed = SpeedMode::SetSpeed;
                dwell_seconds = Some(extrusion.abs() / set_speed);
            }
        }

        Self {
            desired,
            dwell_seconds,
        }
    }
}

/// Counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Lines seen
    pub lines: usize,
    /// Lines classified as motion commands
    pub motion_lines: usize,
    /// Pin commands emitted
    pub pin_commands: usize,
    /// Dwell commands emitted
    pub dwells: usize,
}

/// Emits pin and dwell commands for state transitions
#[derive(Debug, Clone)]
pub struct StateTransitionEmitter {
    config: PostProcessConfig,
    classifier: LineClassifier,
    state: PinState,
    stats: TransformStats,
}

impl StateTransitionEmitter {
    /// Create an emitter with every pin low
    pub fn new(config: PostProcessConfig) -> Self {
        Self {
            config,
            classifier: LineClassifier::new(),
            state: PinState::new(),
            stats: TransformStats::default(),
        }
    }

    /// Current persisted pin state
    pub fn state(&self) -> PinState {
        self.state
    }

    /// Configuration in use
    pub fn config(&self) -> &PostProcessConfig {
        &self.config
    }

    /// Counters collected so far
    pub fn stats(&self) -> &TransformStats {
        &self.stats
    }

    /// Compute the text to add around `line`, updating the pin state
    pub fn annotate(&mut self, line: &str) -> Result<Annotation, ParameterError> {
        self.stats.lines += 1;

        let motion = match self.classifier.classify(line)? {
            LineClass::Passthrough => return Ok(Annotation::default()),
            LineClass::Motion(motion) => motion,
        };
        self.stats.motion_lines += 1;

        let plan = MotionPlan::for_motion(self.state, &motion, self.config.set_speed());
        let mut annotation = Annotation::default();

        if let Some(seconds) = plan.dwell_seconds.filter(|&s| s > 0.0) {
            if self.config.dwell_enabled() {
                annotation
                    .prefix
                    .push(DwellCommand::new(seconds).to_string());
                self.stats.dwells += 1;
            }
        }

        for transition in self.state.apply(plan.desired) {
            tracing::trace!(
                "{} -> {} ({})",
                transition.pin,
                transition.text,
                line.trim_end()
            );
            annotation
                .prefix
                .push(PinCommand::new(self.config.pin(transition.pin), transition).to_string());
            self.stats.pin_commands += 1;
        }

        if self.config.debug_enabled() {
            annotation.suffix = Some(
                DebugComment {
                    state: self.state,
                    extrusion: motion.extrusion,
                    dwell_seconds: plan.dwell_seconds,
                }
                .to_string(),
            );
        }

        Ok(annotation)
    }

    /// Process one line, returning it with any inserted commands
    pub fn process_line(&mut self, line: &str) -> Result<String, ParameterError> {
        let annotation = self.annotate(line)?;
        if annotation.is_empty() {
            Ok(line.to_string())
        } else {
            Ok(annotation.wrap(line))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter() -> StateTransitionEmitter {
        StateTransitionEmitter::new(PostProcessConfig::default())
    }

    #[test]
    fn test_first_extruding_move_sets_all_pins() {
        let mut emitter = emitter();
        let out = emitter.process_line("G1 X10 E1\n").unwrap();
        assert_eq!(
            out,
            "M62 P0 ;Robot Extruder active: On\n\
             M62 P1 ;Robot Extruder direction: Forward\n\
             M62 P2 ;Robot Extruder speed: Proportional to robot speed\n\
             G1 X10 E1\n"
        );
        assert_eq!(emitter.stats().pin_commands, 3);
    }

    #[test]
    fn test_repeated_state_is_not_reasserted() {
        let mut emitter = emitter();
        emitter.process_line("G1 X10 E1\n").unwrap();
        assert_eq!(emitter.process_line("G1 X20 E2\n").unwrap(), "G1 X20 E2\n");
    }

    #[test]
    fn test_travel_move_switches_off_only() {
        let mut emitter = emitter();
        emitter.process_line("G1 X10 E1\n").unwrap();
        assert_eq!(
            emitter.process_line("G0 X50 Y50\n").unwrap(),
            "M63 P0 ;Robot Extruder active: Off\nG0 X50 Y50\n"
        );

        let state = emitter.state();
        assert_eq!(state.activity, Activity::Off);
        assert_eq!(state.direction, Direction::Forward);
        assert_eq!(state.speed, SpeedMode::Proportional);
    }

    #[test]
    fn test_travel_from_initial_state_emits_nothing() {
        let mut emitter = emitter();
        assert_eq!(emitter.process_line("G0 X5\n").unwrap(), "G0 X5\n");
    }

    #[test]
    fn test_retraction_with_dwell() {
        let mut emitter =
            StateTransitionEmitter::new(PostProcessConfig::default().with_dwell(true));
        emitter.process_line("G1 X10 E1\n").unwrap();

        let out = emitter.process_line("G1 E-1.2\n").unwrap();
        assert_eq!(
            out,
            "G4 P0.08000 ;Robot Dwell\n\
             M63 P1 ;Robot Extruder direction: Backward\n\
             M63 P2 ;Robot Extruder speed: Use set speed\n\
             G1 E-1.2\n"
        );
        assert_eq!(emitter.stats().dwells, 1);
    }

    #[test]
    fn test_dwell_disabled_emits_no_dwell() {
        let mut emitter = emitter();
        let out = emitter.process_line("G1 E-1.2\n").unwrap();
        assert!(!out.contains("G4"));
        assert!(out.starts_with("M62 P0 ;Robot Extruder active: On\n"));
    }

    #[test]
    fn test_dwell_uses_set_speed() {
        let plan = MotionPlan::for_motion(
            PinState::new(),
            &MotionLine {
                extrusion: Some(3.0),
                has_spatial_axis: false,
            },
            1.5,
        );
        assert_eq!(plan.dwell_seconds, Some(2.0));
        assert_eq!(plan.desired.speed, SpeedMode::SetSpeed);
    }

    #[test]
    fn test_plan_without_extrusion_keeps_direction_and_speed() {
        let current = PinState {
            activity: Activity::On,
            direction: Direction::Backward,
            speed: SpeedMode::Proportional,
        };
        let plan = MotionPlan::for_motion(
            current,
            &MotionLine {
                extrusion: None,
                has_spatial_axis: true,
            },
            15.0,
        );
        assert_eq!(
            plan.desired,
            PinState {
                activity: Activity::Off,
                ..current
            }
        );
        assert_eq!(plan.dwell_seconds, None);
    }

    #[test]
    fn test_debug_comment_appended() {
        let mut emitter = StateTransitionEmitter::new(PostProcessConfig::default().with_debug(true));
        let out = emitter.process_line("G1 E-1.2\n").unwrap();
        assert!(out.ends_with(
            "G1 E-1.2\n;ACV_state: 1, DIR_state: 0, SPD_state: 0, E_value: -1.2, Dwell_time: 0.08\n"
        ));
        assert_eq!(out.lines().next(), Some("M62 P0 ;Robot Extruder active: On"));
    }

    #[test]
    fn test_debug_comment_uncomputed_values_are_zero() {
        let mut emitter = StateTransitionEmitter::new(PostProcessConfig::default().with_debug(true));
        assert_eq!(
            emitter.process_line("G0 X5\n").unwrap(),
            "G0 X5\n;ACV_state: 0, DIR_state: 0, SPD_state: 0, E_value: 0, Dwell_time: 0\n"
        );
        assert!(emitter
            .process_line("G1 X1 E1\n")
            .unwrap()
            .ends_with("E_value: 1.0, Dwell_time: 0\n"));
        assert!(emitter
            .process_line("G1 X2 E0\n")
            .unwrap()
            .ends_with("E_value: 0.0, Dwell_time: 0\n"));
        assert!(emitter
            .process_line("G1 E0.0001\n")
            .unwrap()
            .ends_with("E_value: 0.0001, Dwell_time: 6.666666666666667e-06\n"));
    }

    #[test]
    fn test_non_motion_line_untouched_with_debug() {
        let mut emitter = StateTransitionEmitter::new(PostProcessConfig::default().with_debug(true));
        assert_eq!(emitter.process_line("M104 S210\n").unwrap(), "M104 S210\n");
        assert_eq!(emitter.stats().motion_lines, 0);
        assert_eq!(emitter.stats().lines, 1);
    }

    #[test]
    fn test_custom_pin_numbers() {
        let mut emitter =
            StateTransitionEmitter::new(PostProcessConfig::default().with_pins(10, 11, 12));
        let out = emitter.process_line("G1 X1 E1\n").unwrap();
        assert!(out.contains("M62 P10 ;Robot Extruder active: On\n"));
        assert!(out.contains("M62 P11 ;Robot Extruder direction: Forward\n"));
        assert!(out.contains("M62 P12 ;Robot Extruder speed: Proportional to robot speed\n"));
    }

    #[test]
    fn test_parse_error_leaves_state_unchanged() {
        let mut emitter = emitter();
        assert!(emitter.process_line("G1 X1 Ebad\n").is_err());
        assert_eq!(emitter.state(), PinState::new());
    }
}
