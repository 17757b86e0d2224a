use bitfield_struct::bitfield;

pub const DEFAULT_SLAVE_ADDR: u8 = 0x68;

/// accel xyz, temperature, gyro xyz; big-endian i16 each
pub const SENSOR_BLOCK_LENGTH: usize = 14;

pub struct MPURegisters;
impl MPURegisters {
    pub const SAMPLE_RATE_DIVIDER: u8 = 0x19;
    pub const CONFIG: u8 = 0x1A;
    pub const GYRO_CONFIG: u8 = 0x1B;
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const INT_PIN_CONFIG: u8 = 0x37;
    pub const INT_ENABLE: u8 = 0x38;
    pub const ACCEL_MEASURE_START: u8 = 0x3B;
    pub const POWER_MANAGEMENT: u8 = 0x6B;
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GyroFullScale {
    Dps250 = 0x0,
    Dps500 = 0x1,
    Dps1000 = 0x2,
    Dps2000 = 0x3,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelFullScale {
    G2 = 0x0,
    G4 = 0x1,
    G8 = 0x2,
    G16 = 0x3,
}

/// DLPF_CFG values, named by accelerometer bandwidth.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowPassFrequencyValues {
    Freq260Hz = 0x0,
    Freq184Hz = 0x1,
    Freq94Hz = 0x2,
    Freq44Hz = 0x3,
    Freq21Hz = 0x4,
    Freq10Hz = 0x5,
    Freq5Hz = 0x6,
}

impl TryFrom<u8> for LowPassFrequencyValues {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Freq260Hz),
            0x1 => Ok(Self::Freq184Hz),
            0x2 => Ok(Self::Freq94Hz),
            0x3 => Ok(Self::Freq44Hz),
            0x4 => Ok(Self::Freq21Hz),
            0x5 => Ok(Self::Freq10Hz),
            0x6 => Ok(Self::Freq5Hz),
            other => Err(other),
        }
    }
}

///See docs for register 26
#[bitfield(u8)]
pub struct ConfigRegister {
    #[bits(3)]
    pub dlpf_cfg: u8,
    #[bits(3)]
    pub ext_sync_set: u8,
    #[bits(2)]
    pub pad: u8,
}

#[bitfield(u8)]
pub struct AccelGyroConfigRegister {
    #[bits(3)]
    pub pad: u8,
    #[bits(2)]
    pub fs_sel: u8,
    pub z_self_test: bool,
    pub y_self_test: bool,
    pub x_self_test: bool,
}

///See docs for register 55
#[bitfield(u8)]
pub struct InterruptPinConfigRegister {
    pub pad: bool,
    pub i2c_bypass_enable: bool,
    pub fsync_interrupt_enable: bool,
    pub fsync_interrupt_level: bool,
    pub clear_on_any_read: bool,
    pub latch_interrupt: bool,
    pub open_drain: bool,
    pub active_low: bool,
}

///See docs for register 56
#[bitfield(u8)]
pub struct InterruptEnableRegister {
    pub data_ready: bool,
    #[bits(2)]
    pub pad_low: u8,
    pub i2c_master: bool,
    pub fifo_overflow: bool,
    #[bits(3)]
    pub pad_high: u8,
}

///See docs for register 107
#[bitfield(u8)]
pub struct MpuPowerManagementRegister {
    #[bits(3)]
    pub clock_sel: u8, // 0 internal oscillator, 1..=3 gyro PLL x/y/z
    pub temp_sensor_disable: bool,
    pub padding_bit: bool, // Set to zero
    pub cycle: bool,
    pub sleep: bool,
    pub device_reset: bool,
}
