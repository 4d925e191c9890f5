//! 传感器数据模块
//!
//! 一次采集周期产生的快照、质量标志位以及电池电量估算。
//! 快照由外部采集代码（I2C/ADC驱动）填充，本模块只定义数据形状。

pub mod validator;

pub use validator::validate;

/// 质量标志位：每个通道组一位，数值在物理范围内时置位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QualityFlags(u8);

impl QualityFlags {
  /// 倾角 X/Y
  pub const TILT: Self = Self(0x01);
  /// 加速度计
  pub const ACCEL: Self = Self(0x02);
  /// 陀螺仪
  pub const GYRO: Self = Self(0x04);
  /// 孔隙水压
  pub const PORE_PRESSURE: Self = Self(0x08);
  /// 温湿度
  pub const ENVIRONMENT: Self = Self(0x10);
  /// 应变计
  pub const STRAIN: Self = Self(0x20);
  /// 全部通道有效
  pub const ALL: Self = Self(0x3F);

  /// 空标志
  pub const fn empty() -> Self {
    Self(0)
  }

  /// 从原始字节构造（保留高位，原样透传）
  pub const fn from_bits(bits: u8) -> Self {
    Self(bits)
  }

  /// 原始字节
  pub const fn bits(self) -> u8 {
    self.0
  }

  /// 是否包含全部给定位
  pub const fn contains(self, other: Self) -> bool {
    self.0 & other.0 == other.0
  }

  /// 置位
  pub fn insert(&mut self, other: Self) {
    self.0 |= other.0;
  }
}

impl core::ops::BitOr for QualityFlags {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self {
    Self(self.0 | rhs.0)
  }
}

/// 一次采集周期的传感器快照
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
  /// 时间戳（秒，设备时钟，会回绕）
  pub timestamp: u32,
  /// 纬度
  pub latitude: f32,
  /// 经度
  pub longitude: f32,
  /// 海拔 (m)
  pub elevation: f32,
  /// 倾角 X，[-1, 1]
  pub tilt_x: f32,
  /// 倾角 Y，[-1, 1]
  pub tilt_y: f32,
  /// 倾角 Z，[-1, 1]
  pub tilt_z: f32,
  /// 加速度 X (m/s²)
  pub accel_x: f32,
  /// 加速度 Y (m/s²)
  pub accel_y: f32,
  /// 加速度 Z (m/s²)，静止时约 1g
  pub accel_z: f32,
  /// 角速度 X (°/s)
  pub gyro_x: f32,
  /// 角速度 Y (°/s)
  pub gyro_y: f32,
  /// 角速度 Z (°/s)
  pub gyro_z: f32,
  /// 孔隙水压 (kPa)
  pub pore_pressure: f32,
  /// 温度 (°C)
  pub temperature: f32,
  /// 相对湿度 (%RH)
  pub humidity: f32,
  /// 应变 (µε)
  pub strain_gauge: f32,
  /// 电池电压 (V)
  pub battery_voltage: f32,
  /// 电池电量 (0-100)
  pub battery_level: u8,
  /// 信号强度 (dBm)
  pub signal_strength: i8,
  /// 质量标志位
  pub quality: QualityFlags,
}

impl SensorSnapshot {
  /// 返回带有新质量标志的副本
  pub fn with_quality(self, quality: QualityFlags) -> Self {
    Self { quality, ..self }
  }

  /// 返回带有新信号强度的副本
  pub fn with_signal_strength(self, signal_strength: i8) -> Self {
    Self {
      signal_strength,
      ..self
    }
  }
}

/// 根据 LiFePO4 放电曲线估算电量百分比
pub fn battery_level_from_voltage(voltage: f32) -> u8 {
  if voltage >= 3.7 {
    100
  } else if voltage >= 3.5 {
    80
  } else if voltage >= 3.3 {
    60
  } else if voltage >= 3.2 {
    40
  } else if voltage >= 3.1 {
    20
  } else if voltage >= 3.0 {
    10
  } else {
    0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_quality_flags_ops() {
    let mut flags = QualityFlags::empty();
    assert!(!flags.contains(QualityFlags::TILT));

    flags.insert(QualityFlags::TILT);
    flags.insert(QualityFlags::STRAIN);
    assert!(flags.contains(QualityFlags::TILT | QualityFlags::STRAIN));
    assert!(!flags.contains(QualityFlags::GYRO));
    assert_eq!(flags.bits(), 0x21);
  }

  #[test]
  fn test_all_covers_six_bits() {
    assert_eq!(QualityFlags::ALL.bits(), 0b0011_1111);
    let combined = QualityFlags::TILT
      | QualityFlags::ACCEL
      | QualityFlags::GYRO
      | QualityFlags::PORE_PRESSURE
      | QualityFlags::ENVIRONMENT
      | QualityFlags::STRAIN;
    assert_eq!(combined, QualityFlags::ALL);
  }

  #[test]
  fn test_battery_curve() {
    assert_eq!(battery_level_from_voltage(4.1), 100);
    assert_eq!(battery_level_from_voltage(3.7), 100);
    assert_eq!(battery_level_from_voltage(3.6), 80);
    assert_eq!(battery_level_from_voltage(3.3), 60);
    assert_eq!(battery_level_from_voltage(3.25), 40);
    assert_eq!(battery_level_from_voltage(3.15), 20);
    assert_eq!(battery_level_from_voltage(3.05), 10);
    assert_eq!(battery_level_from_voltage(2.9), 0);
    assert_eq!(battery_level_from_voltage(f32::NAN), 0);
  }

  #[test]
  fn test_with_quality_keeps_readings() {
    let snapshot = SensorSnapshot {
      timestamp: 42,
      pore_pressure: 130.0,
      ..Default::default()
    };
    let stamped = snapshot.with_quality(QualityFlags::ALL);
    assert_eq!(stamped.timestamp, 42);
    assert_eq!(stamped.pore_pressure, 130.0);
    assert_eq!(stamped.quality, QualityFlags::ALL);
  }
}
