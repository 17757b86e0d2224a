pub mod imu_sensors;
pub mod mpu_6050;
