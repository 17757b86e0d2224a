use embedded_hal::pwm::SetDutyCycle;
use shared_definitions::motors::{MotorLocation, MotorRotation};

use crate::util::error::FlightResult;

use super::{
    motor_controller::PulseWidthChannel,
    vehicle_movement_mappers::{FlyingVehicleMovementMapper, MixerCommand, Quadcopter},
};

/// One ESC output and where its motor sits.
pub struct MotorChannel<P>
where
    P: SetDutyCycle,
{
    pub location: MotorLocation,
    pub rotation: MotorRotation,
    pub controller: PulseWidthChannel<P>,
}

pub struct QuadcopterMotorsStateManager<P>
where
    P: SetDutyCycle,
{
    controllers: [PulseWidthChannel<P>; 4],
    mapper: Quadcopter,
}

impl<P> QuadcopterMotorsStateManager<P>
where
    P: SetDutyCycle,
{
    /// Fails if the four motors do not form a valid X layout.
    pub fn new(motors: [MotorChannel<P>; 4]) -> FlightResult<Self> {
        let layout = [0, 1, 2, 3].map(|index| (motors[index].location, motors[index].rotation));
        let mapper = Quadcopter::new(layout)?;
        Ok(QuadcopterMotorsStateManager {
            controllers: motors.map(|motor| motor.controller),
            mapper,
        })
    }

    /// Per-motor pulse offsets above the ESC minimum, clamped per channel.
    pub fn set_motor_power(&mut self, values: [i64; 4]) -> FlightResult<[u16; 4]> {
        let mut pulse_widths = [0_u16; 4];
        for (index, value) in values.into_iter().enumerate() {
            pulse_widths[index] = self.controllers[index].update(value)?;
        }
        Ok(pulse_widths)
    }

    pub fn apply(&mut self, command: &MixerCommand) -> FlightResult<[u16; 4]> {
        let values = self.mapper.map_controller_output_to_actuators_input(command);
        self.set_motor_power(values)
    }

    pub fn set_single_motor_power(&mut self, index: usize, value: i64) -> FlightResult<u16> {
        self.controllers[index].update(value)
    }

    pub fn pulse_widths(&self) -> [u16; 4] {
        [0, 1, 2, 3].map(|index| self.controllers[index].pulse_width())
    }

    pub fn motor_location(&self, index: usize) -> MotorLocation {
        self.mapper.layout()[index].0
    }

    pub fn kill_motors(&mut self) -> FlightResult<()> {
        self.set_motor_power([0; 4])?;
        log::info!("Killed motors");
        Ok(())
    }
}
