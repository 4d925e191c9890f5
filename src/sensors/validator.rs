//! 读数校验
//!
//! 按通道组检查物理合理范围。校验只是建议性的：超出范围只清除对应位，
//! 不会拒绝快照，下游也不依据标志位分支，标志位随上行帧透传用于离线诊断。

use libm::fabsf;

use super::{QualityFlags, SensorSnapshot};

/// 倾角上限（无量纲）
const TILT_LIMIT: f32 = 1.0;
/// 水平加速度上限 (m/s²)
const ACCEL_XY_LIMIT: f32 = 20.0;
/// Z轴加速度下限/上限 (m/s²)，静止时约 9.81
const ACCEL_Z_RANGE: (f32, f32) = (5.0, 15.0);
/// 角速度上限 (°/s)
const GYRO_LIMIT: f32 = 10.0;
/// 孔隙水压范围 (kPa)
const PORE_PRESSURE_RANGE: (f32, f32) = (0.0, 1000.0);
/// 温度范围 (°C)
const TEMPERATURE_RANGE: (f32, f32) = (-40.0, 70.0);
/// 湿度范围 (%RH)
const HUMIDITY_RANGE: (f32, f32) = (0.0, 100.0);
/// 应变上限 (µε)
const STRAIN_LIMIT: f32 = 1000.0;

/// 校验快照，返回每个通道组的有效位
///
/// 纯函数，不会失败。NaN 不满足任何比较，对应位保持清除。
pub fn validate(snapshot: &SensorSnapshot) -> QualityFlags {
  let mut flags = QualityFlags::empty();

  if within_abs(snapshot.tilt_x, TILT_LIMIT) && within_abs(snapshot.tilt_y, TILT_LIMIT) {
    flags.insert(QualityFlags::TILT);
  }

  if within_abs(snapshot.accel_x, ACCEL_XY_LIMIT)
    && within_abs(snapshot.accel_y, ACCEL_XY_LIMIT)
    && within(snapshot.accel_z, ACCEL_Z_RANGE)
  {
    flags.insert(QualityFlags::ACCEL);
  }

  if within_abs(snapshot.gyro_x, GYRO_LIMIT)
    && within_abs(snapshot.gyro_y, GYRO_LIMIT)
    && within_abs(snapshot.gyro_z, GYRO_LIMIT)
  {
    flags.insert(QualityFlags::GYRO);
  }

  if within(snapshot.pore_pressure, PORE_PRESSURE_RANGE) {
    flags.insert(QualityFlags::PORE_PRESSURE);
  }

  if within(snapshot.temperature, TEMPERATURE_RANGE) && within(snapshot.humidity, HUMIDITY_RANGE) {
    flags.insert(QualityFlags::ENVIRONMENT);
  }

  if within_abs(snapshot.strain_gauge, STRAIN_LIMIT) {
    flags.insert(QualityFlags::STRAIN);
  }

  flags
}

#[inline]
fn within_abs(value: f32, limit: f32) -> bool {
  fabsf(value) <= limit
}

#[inline]
fn within(value: f32, (low, high): (f32, f32)) -> bool {
  value >= low && value <= high
}
