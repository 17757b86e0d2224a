use embedded_hal::{
    delay::DelayNs,
    digital::InputPin,
    i2c::{Error as _, I2c},
};

use crate::{
    drivers::imu_sensors::{InertialSensor, RawAxes, RawReading, SensorMisses},
    util::error::{FlightError, FlightResult},
};

use super::registers::{
    AccelFullScale, AccelGyroConfigRegister, ConfigRegister, GyroFullScale,
    InterruptEnableRegister, InterruptPinConfigRegister, LowPassFrequencyValues, MPURegisters,
    MpuPowerManagementRegister, DEFAULT_SLAVE_ADDR, SENSOR_BLOCK_LENGTH,
};

/// MPU-6050 on an I2C bus with its INT line wired to `data_ready_pin`.
///
/// Bus transactions are retried until they succeed; every failed attempt is
/// counted as a miss.
pub struct MPU6050Sensor<I, P>
where
    I: I2c,
    P: InputPin,
{
    i2c_driver: I,
    data_ready_pin: P,
    mpu_addr: u8,
    misses: SensorMisses,
}

impl<I, P> MPU6050Sensor<I, P>
where
    I: I2c,
    P: InputPin,
{
    pub fn new(i2c_driver: I, data_ready_pin: P) -> Self {
        MPU6050Sensor {
            i2c_driver,
            data_ready_pin,
            mpu_addr: DEFAULT_SLAVE_ADDR,
            misses: SensorMisses::default(),
        }
    }

    /// Resets the device and configures 1kHz sampling, gyro PLL clock, the
    /// given low pass filter, ±250°/s, ±2g and a latched data-ready
    /// interrupt cleared by any read.
    pub fn init<D: DelayNs>(
        &mut self,
        delay: &mut D,
        low_pass_freq: LowPassFrequencyValues,
    ) -> FlightResult<()> {
        log::info!("Resetting MPU-6050");
        delay.delay_ms(500);
        self.write_register(
            MPURegisters::POWER_MANAGEMENT,
            MpuPowerManagementRegister::new()
                .with_device_reset(true)
                .into_bits(),
        );
        delay.delay_ms(5000);

        log::debug!("Sample rate 1kHz");
        self.write_register(MPURegisters::SAMPLE_RATE_DIVIDER, 0);
        delay.delay_ms(100);

        log::debug!("Clock gyro PLL");
        self.write_register(
            MPURegisters::POWER_MANAGEMENT,
            MpuPowerManagementRegister::new().with_clock_sel(2).into_bits(),
        );
        delay.delay_ms(100);

        let config = ConfigRegister::new()
            .with_dlpf_cfg(low_pass_freq as u8)
            .into_bits();
        log::debug!("Low pass filter {:?}", low_pass_freq);
        self.write_register(MPURegisters::CONFIG, config);
        delay.delay_ms(100);

        self.write_register(
            MPURegisters::GYRO_CONFIG,
            AccelGyroConfigRegister::new()
                .with_fs_sel(GyroFullScale::Dps250 as u8)
                .into_bits(),
        );
        delay.delay_ms(100);

        self.write_register(
            MPURegisters::ACCEL_CONFIG,
            AccelGyroConfigRegister::new()
                .with_fs_sel(AccelFullScale::G2 as u8)
                .into_bits(),
        );
        delay.delay_ms(100);

        // Latched so a polled pin cannot miss the 50us pulse.
        self.write_register(
            MPURegisters::INT_PIN_CONFIG,
            InterruptPinConfigRegister::new()
                .with_latch_interrupt(true)
                .with_clear_on_any_read(true)
                .into_bits(),
        );
        delay.delay_ms(100);

        log::debug!("Interrupt on data ready");
        self.write_register(
            MPURegisters::INT_ENABLE,
            InterruptEnableRegister::new().with_data_ready(true).into_bits(),
        );
        delay.delay_ms(100);

        let actual = self.read_register(MPURegisters::CONFIG);
        if actual != config {
            log::error!("dlpf check = {}, dlpf config = {}", actual, config);
            return Err(FlightError::SensorConfiguration {
                expected: config,
                actual,
            });
        }
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) {
        while let Err(error) = self.i2c_driver.write(self.mpu_addr, &[register, value]) {
            self.misses.bus += 1;
            log::debug!("I2C write {:#04x} failed: {:?}", register, error.kind());
        }
    }

    fn read_register(&mut self, register: u8) -> u8 {
        let mut buf = [0_u8; 1];
        while let Err(error) = self.i2c_driver.write_read(self.mpu_addr, &[register], &mut buf) {
            self.misses.bus += 1;
            log::debug!("I2C read {:#04x} failed: {:?}", register, error.kind());
        }
        buf[0]
    }
}

fn read_i16(buf: &[u8; SENSOR_BLOCK_LENGTH], index: usize) -> i16 {
    i16::from_be_bytes([buf[index], buf[index + 1]])
}

impl<I, P> InertialSensor for MPU6050Sensor<I, P>
where
    I: I2c,
    P: InputPin,
{
    fn wait_for_sample(&mut self) {
        loop {
            match self.data_ready_pin.is_high() {
                Ok(true) => return,
                Ok(false) => std::hint::spin_loop(),
                Err(_) => self.misses.data_ready += 1,
            }
        }
    }

    fn read_raw(&mut self) -> RawReading {
        let mut buf = [0_u8; SENSOR_BLOCK_LENGTH];
        while let Err(error) = self.i2c_driver.write_read(
            self.mpu_addr,
            &[MPURegisters::ACCEL_MEASURE_START],
            &mut buf,
        ) {
            self.misses.bus += 1;
            log::debug!("I2C sensor read failed: {:?}", error.kind());
        }

        RawReading {
            accel: RawAxes::new(read_i16(&buf, 0), read_i16(&buf, 2), read_i16(&buf, 4)),
            temperature: read_i16(&buf, 6),
            gyro: RawAxes::new(read_i16(&buf, 8), read_i16(&buf, 10), read_i16(&buf, 12)),
        }
    }

    fn misses(&self) -> SensorMisses {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use embedded_hal::{
        digital::ErrorType as PinErrorType,
        i2c::{ErrorKind, ErrorType, Operation},
    };

    use super::*;

    #[derive(Default)]
    struct MockBus {
        registers: Vec<u8>,
        pointer: usize,
        writes: Vec<(u8, u8)>,
        failures_left: usize,
        stuck_config: Option<u8>,
    }

    impl MockBus {
        fn new() -> Self {
            MockBus {
                registers: vec![0; 0x80],
                ..Default::default()
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = ErrorKind;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            assert_eq!(address, DEFAULT_SLAVE_ADDR);
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(ErrorKind::Bus);
            }
            for operation in operations {
                match operation {
                    Operation::Write(bytes) => {
                        self.pointer = bytes[0] as usize;
                        if let Some(value) = bytes.get(1) {
                            self.registers[self.pointer] = *value;
                            self.writes.push((bytes[0], *value));
                        }
                    }
                    Operation::Read(buffer) => {
                        for byte in buffer.iter_mut() {
                            *byte = match self.stuck_config {
                                Some(value) if self.pointer == MPURegisters::CONFIG as usize => {
                                    value
                                }
                                _ => self.registers[self.pointer],
                            };
                            self.pointer += 1;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    struct MockPin {
        levels: Vec<bool>,
    }

    impl PinErrorType for MockPin {
        type Error = Infallible;
    }

    impl InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(if self.levels.is_empty() {
                true
            } else {
                self.levels.remove(0)
            })
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    fn sensor(bus: MockBus) -> MPU6050Sensor<MockBus, MockPin> {
        MPU6050Sensor::new(bus, MockPin { levels: vec![] })
    }

    #[test]
    fn init_writes_the_configuration_sequence() {
        let mut mpu = sensor(MockBus::new());
        let mut delay = MockDelay::default();

        mpu.init(&mut delay, LowPassFrequencyValues::Freq21Hz).unwrap();

        assert_eq!(
            mpu.i2c_driver.writes,
            vec![
                (0x6B, 0x80),
                (0x19, 0x00),
                (0x6B, 0x02),
                (0x1A, 0x04),
                (0x1B, 0x00),
                (0x1C, 0x00),
                (0x37, 0x30),
                (0x38, 0x01),
            ]
        );
        assert!(delay.total_ns >= 5_500_000_000);
    }

    #[test]
    fn init_fails_when_config_does_not_read_back() {
        let mut bus = MockBus::new();
        bus.stuck_config = Some(0x00);
        let mut mpu = sensor(bus);

        let result = mpu.init(&mut MockDelay::default(), LowPassFrequencyValues::Freq5Hz);

        assert!(matches!(
            result,
            Err(FlightError::SensorConfiguration {
                expected: 0x06,
                actual: 0x00
            })
        ));
    }

    #[test]
    fn read_decodes_big_endian_block_and_counts_retries() {
        let mut bus = MockBus::new();
        let block: [u8; 14] = [
            0x40, 0x00, // ax 16384
            0xFF, 0xFE, // ay -2
            0x00, 0x10, // az 16
            0x04, 0x9C, // temp 1180
            0x00, 0x01, // gx 1
            0x80, 0x00, // gy -32768
            0x7F, 0xFF, // gz 32767
        ];
        bus.registers[0x3B..0x3B + 14].copy_from_slice(&block);
        bus.failures_left = 3;
        let mut mpu = sensor(bus);

        let reading = mpu.read_raw();

        assert_eq!(reading.accel, RawAxes::new(16384, -2, 16));
        assert_eq!(reading.temperature, 1180);
        assert_eq!(reading.gyro, RawAxes::new(1, i16::MIN, i16::MAX));
        assert_eq!(mpu.misses().bus, 3);
    }

    #[test]
    fn waits_until_data_ready_goes_high() {
        let mut mpu = MPU6050Sensor::new(
            MockBus::new(),
            MockPin {
                levels: vec![false, false, true],
            },
        );
        mpu.wait_for_sample();
        assert!(mpu.data_ready_pin.levels.is_empty());
    }
}
