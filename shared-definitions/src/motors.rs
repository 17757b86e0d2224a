use bitflags::bitflags;

bitflags! {
    /// Where a motor sits on the frame, combined as front/back | left/right.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MotorLocation: u8 {
        const FRONT = 0b0001;
        const BACK = 0b0010;
        const LEFT = 0b0100;
        const RIGHT = 0b1000;

        const FRONT_LEFT = Self::FRONT.bits() | Self::LEFT.bits();
        const FRONT_RIGHT = Self::FRONT.bits() | Self::RIGHT.bits();
        const BACK_LEFT = Self::BACK.bits() | Self::LEFT.bits();
        const BACK_RIGHT = Self::BACK.bits() | Self::RIGHT.bits();
    }
}

impl MotorLocation {
    /// A corner is exactly one of front/back and one of left/right.
    pub fn is_corner(&self) -> bool {
        (self.contains(Self::FRONT) ^ self.contains(Self::BACK))
            && (self.contains(Self::LEFT) ^ self.contains(Self::RIGHT))
    }
}

/// Propeller spin direction seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorRotation {
    Clockwise,
    Anticlockwise,
}
