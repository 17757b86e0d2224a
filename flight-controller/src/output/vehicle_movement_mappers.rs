use shared_definitions::motors::{MotorLocation, MotorRotation};

use crate::util::error::{FlightError, FlightResult};

/// What the rate loops ask of the airframe, in microseconds of pulse width
/// above the ESC minimum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MixerCommand {
    pub thrust: i64,
    pub pitch_rate: i64,
    pub roll_rate: i64,
    pub yaw_rate: i64,
}

pub trait FlyingVehicleMovementMapper<TActuator> {
    fn map_controller_output_to_actuators_input(&self, command: &MixerCommand) -> TActuator;
}

/// Position and spin of each of the four motors, in output order.
pub type QuadcopterLayout = [(MotorLocation, MotorRotation); 4];

pub const STANDARD_LAYOUT: QuadcopterLayout = [
    (MotorLocation::FRONT_LEFT, MotorRotation::Anticlockwise),
    (MotorLocation::FRONT_RIGHT, MotorRotation::Clockwise),
    (MotorLocation::BACK_LEFT, MotorRotation::Clockwise),
    (MotorLocation::BACK_RIGHT, MotorRotation::Anticlockwise),
];

/// X-frame quadcopter mixer. Diagonally opposite motors share a spin
/// direction so yaw can be commanded by speeding up one diagonal.
pub struct Quadcopter {
    layout: QuadcopterLayout,
}

impl Quadcopter {
    pub fn new(layout: QuadcopterLayout) -> FlightResult<Self> {
        Self::validate_layout(&layout)?;
        Ok(Quadcopter { layout })
    }

    pub fn standard() -> Self {
        Quadcopter {
            layout: STANDARD_LAYOUT,
        }
    }

    pub fn layout(&self) -> &QuadcopterLayout {
        &self.layout
    }

    fn rotation_at(layout: &QuadcopterLayout, location: MotorLocation) -> Option<MotorRotation> {
        layout
            .iter()
            .find(|(motor_location, _)| *motor_location == location)
            .map(|(_, rotation)| *rotation)
    }

    fn validate_layout(layout: &QuadcopterLayout) -> FlightResult<()> {
        for (index, (location, _)) in layout.iter().enumerate() {
            if !location.is_corner() {
                return Err(FlightError::MotorLayout(format!(
                    "motor {} is not on a corner: {:?}",
                    index, location
                )));
            }
            if layout[..index].iter().any(|(other, _)| other == location) {
                return Err(FlightError::MotorLayout(format!(
                    "two motors at {:?}",
                    location
                )));
            }
        }

        let front_left = Self::rotation_at(layout, MotorLocation::FRONT_LEFT);
        let front_right = Self::rotation_at(layout, MotorLocation::FRONT_RIGHT);
        if front_left != Self::rotation_at(layout, MotorLocation::BACK_RIGHT)
            || front_right != Self::rotation_at(layout, MotorLocation::BACK_LEFT)
            || front_left == front_right
        {
            return Err(FlightError::MotorLayout(
                "diagonal motors must share spin and adjacent motors must oppose it".to_string(),
            ));
        }
        Ok(())
    }

    fn map_motor_input(
        location: MotorLocation,
        rotation: MotorRotation,
        command: &MixerCommand,
    ) -> i64 {
        let mut delta = command.thrust;

        if location.contains(MotorLocation::RIGHT) {
            delta = delta.saturating_sub(command.roll_rate);
        } else {
            delta = delta.saturating_add(command.roll_rate);
        }

        if location.contains(MotorLocation::BACK) {
            delta = delta.saturating_add(command.pitch_rate);
        } else {
            delta = delta.saturating_sub(command.pitch_rate);
        }

        match rotation {
            MotorRotation::Clockwise => delta = delta.saturating_add(command.yaw_rate),
            MotorRotation::Anticlockwise => delta = delta.saturating_sub(command.yaw_rate),
        }
        delta
    }
}

impl FlyingVehicleMovementMapper<[i64; 4]> for Quadcopter {
    fn map_controller_output_to_actuators_input(&self, command: &MixerCommand) -> [i64; 4] {
        self.layout
            .map(|(location, rotation)| Self::map_motor_input(location, rotation, command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_thrust_is_shared_equally() {
        let deltas = Quadcopter::standard().map_controller_output_to_actuators_input(&MixerCommand {
            thrust: 500,
            ..Default::default()
        });
        assert_eq!(deltas, [500; 4]);
    }

    #[test]
    fn rotations_split_the_airframe() {
        let mixer = Quadcopter::standard();
        let pitch = mixer.map_controller_output_to_actuators_input(&MixerCommand {
            thrust: 500,
            pitch_rate: 20,
            ..Default::default()
        });
        // FL, FR, BL, BR
        assert_eq!(pitch, [480, 480, 520, 520]);

        let roll = mixer.map_controller_output_to_actuators_input(&MixerCommand {
            thrust: 500,
            roll_rate: 20,
            ..Default::default()
        });
        assert_eq!(roll, [520, 480, 520, 480]);

        let yaw = mixer.map_controller_output_to_actuators_input(&MixerCommand {
            thrust: 500,
            yaw_rate: 20,
            ..Default::default()
        });
        assert_eq!(yaw, [480, 520, 520, 480]);
    }

    #[test]
    fn rotation_commands_keep_total_thrust() {
        let deltas = Quadcopter::standard().map_controller_output_to_actuators_input(&MixerCommand {
            thrust: 400,
            pitch_rate: 13,
            roll_rate: -7,
            yaw_rate: 21,
        });
        assert_eq!(deltas.iter().sum::<i64>(), 1600);
    }

    #[test]
    fn runaway_commands_saturate() {
        let deltas = Quadcopter::standard().map_controller_output_to_actuators_input(&MixerCommand {
            thrust: i64::MAX,
            pitch_rate: i64::MIN,
            roll_rate: i64::MAX,
            yaw_rate: 0,
        });
        // FL, FR, BL, BR
        assert_eq!(deltas, [i64::MAX, i64::MAX, -1, i64::MIN]);
    }

    #[test]
    fn bad_layouts_are_rejected() {
        assert!(Quadcopter::new(STANDARD_LAYOUT).is_ok());

        let mut same_spin = STANDARD_LAYOUT;
        same_spin[1].1 = MotorRotation::Anticlockwise;
        assert!(Quadcopter::new(same_spin).is_err());

        let mut duplicate = STANDARD_LAYOUT;
        duplicate[3].0 = MotorLocation::FRONT_LEFT;
        assert!(Quadcopter::new(duplicate).is_err());

        let mut off_corner = STANDARD_LAYOUT;
        off_corner[2].0 = MotorLocation::BACK;
        assert!(Quadcopter::new(off_corner).is_err());
    }
}
