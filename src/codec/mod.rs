//! # 帧编解码模块
//!
//! 上行：固定 51 字节的二进制帧（整数大端，位置坐标为小端 f32）。
//! 下行：2 字节命令 `[命令, 参数]`。

pub mod downlink;
pub mod uplink;

pub use downlink::{decode_downlink, enqueue_downlink, DownlinkCommand, DownlinkQueue};
pub use uplink::{decode_uplink, encode_uplink, DecodedUplink, UplinkFrame};

/// 上行帧长度
pub const UPLINK_FRAME_LEN: usize = 51;

/// 测量值缩放系数
pub mod scale {
  /// 倾角
  pub const TILT: f32 = 1000.0;
  /// 加速度
  pub const ACCEL: f32 = 100.0;
  /// 角速度
  pub const GYRO: f32 = 1000.0;
  /// 孔隙水压
  pub const PORE_PRESSURE: f32 = 1.0;
  /// 温度
  pub const TEMPERATURE: f32 = 10.0;
  /// 湿度
  pub const HUMIDITY: f32 = 1.0;
  /// 应变
  pub const STRAIN: f32 = 1.0;
  /// 异常分数与置信度
  pub const SCORE: f32 = 1000.0;
  /// 信号强度偏移
  pub const SIGNAL_OFFSET: u8 = 128;
}

/// 13路测量值的缩放表，与帧中出现的顺序一致
pub const MEASUREMENT_SCALES: [f32; 13] = [
  scale::TILT,
  scale::TILT,
  scale::TILT,
  scale::ACCEL,
  scale::ACCEL,
  scale::ACCEL,
  scale::GYRO,
  scale::GYRO,
  scale::GYRO,
  scale::PORE_PRESSURE,
  scale::TEMPERATURE,
  scale::HUMIDITY,
  scale::STRAIN,
];

/// 字段偏移
pub mod offset {
  pub const TIMESTAMP: usize = 0;
  pub const LOCATION: usize = 4;
  pub const MEASUREMENTS: usize = 16;
  pub const QUALITY: usize = 42;
  pub const BATTERY: usize = 43;
  pub const SIGNAL: usize = 44;
  pub const ANOMALY: usize = 45;
  pub const RISK: usize = 47;
  pub const CONFIDENCE: usize = 48;
  pub const EMERGENCY: usize = 50;
}
