//! 上行帧编码
//!
//! | 偏移 | 长度 | 字段 |
//! |---|---|---|
//! | 0 | 4 | 时间戳 u32 |
//! | 4 | 12 | 纬度/经度/海拔，f32 小端原始位 |
//! | 16 | 26 | 13 × i16 缩放测量值 |
//! | 42 | 1 | 质量标志 |
//! | 43 | 1 | 电量 |
//! | 44 | 1 | 信号强度 + 128 |
//! | 45 | 2 | 异常分数 ×1000 |
//! | 47 | 1 | 风险等级 |
//! | 48 | 2 | 置信度 ×1000 |
//! | 50 | 1 | 紧急标志 |

use crate::config::{CodecConfig, OverflowPolicy};
use crate::error::{NodeError, Result};
use crate::inference::{features, InferenceResult, RiskLevel};
use crate::sensors::{QualityFlags, SensorSnapshot};

use super::{offset, scale, MEASUREMENT_SCALES, UPLINK_FRAME_LEN};

/// 上行帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UplinkFrame([u8; UPLINK_FRAME_LEN]);

impl UplinkFrame {
  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn into_bytes(self) -> [u8; UPLINK_FRAME_LEN] {
    self.0
  }

  pub const fn len(&self) -> usize {
    UPLINK_FRAME_LEN
  }

  pub const fn is_empty(&self) -> bool {
    false
  }
}

impl AsRef<[u8]> for UplinkFrame {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

/// 顺序写入器
struct FrameWriter {
  buf: [u8; UPLINK_FRAME_LEN],
  pos: usize,
}

impl FrameWriter {
  fn new() -> Self {
    Self {
      buf: [0; UPLINK_FRAME_LEN],
      pos: 0,
    }
  }

  fn put(&mut self, bytes: &[u8]) {
    self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
    self.pos += bytes.len();
  }

  fn put_u8(&mut self, value: u8) {
    self.put(&[value]);
  }

  fn put_u16(&mut self, value: u16) {
    self.put(&value.to_be_bytes());
  }

  fn put_i16(&mut self, value: i16) {
    self.put(&value.to_be_bytes());
  }

  fn put_u32(&mut self, value: u32) {
    self.put(&value.to_be_bytes());
  }

  fn put_f32_le(&mut self, value: f32) {
    self.put(&value.to_le_bytes());
  }

  fn finish(self) -> UplinkFrame {
    debug_assert_eq!(self.pos, UPLINK_FRAME_LEN);
    UplinkFrame(self.buf)
  }
}

/// 缩放并截断到 i16
///
/// `as` 转换向零截断，NaN 得 0，超出 i32 范围时饱和。
fn quantize(value: f32, factor: f32, overflow: OverflowPolicy) -> i16 {
  let scaled = value * factor;
  match overflow {
    OverflowPolicy::Wrap => scaled as i32 as i16,
    OverflowPolicy::Saturate => scaled as i16,
  }
}

/// [0,1] 分数 ×1000
fn quantize_score(value: f32) -> u16 {
  (value * scale::SCORE) as u16
}

/// 编码上行帧
///
/// 全函数：任何输入都产生 51 字节。
pub fn encode_uplink(
  snapshot: &SensorSnapshot,
  result: &InferenceResult,
  emergency: bool,
  config: &CodecConfig,
) -> UplinkFrame {
  let mut w = FrameWriter::new();

  w.put_u32(snapshot.timestamp);

  w.put_f32_le(snapshot.latitude);
  w.put_f32_le(snapshot.longitude);
  w.put_f32_le(snapshot.elevation);

  let measurements = features(snapshot);
  for (value, factor) in measurements.iter().zip(MEASUREMENT_SCALES.iter()) {
    w.put_i16(quantize(*value, *factor, config.overflow));
  }

  w.put_u8(snapshot.quality.bits());
  w.put_u8(snapshot.battery_level);
  w.put_u8((snapshot.signal_strength as u8).wrapping_add(scale::SIGNAL_OFFSET));

  w.put_u16(quantize_score(result.anomaly_score));
  w.put_u8(result.risk_level.as_u8());
  w.put_u16(quantize_score(result.confidence));
  w.put_u8(emergency as u8);

  let frame = w.finish();
  log::debug!("uplink frame prepared: {} bytes", frame.len());
  frame
}

/// 解码后的上行帧（地面侧工具/测试使用）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedUplink {
  pub timestamp: u32,
  pub latitude: f32,
  pub longitude: f32,
  pub elevation: f32,
  /// 缩放后的原始整数
  pub measurements: [i16; 13],
  pub quality: QualityFlags,
  pub battery_level: u8,
  pub signal_strength: i8,
  pub anomaly_milli: u16,
  pub risk_level: RiskLevel,
  pub confidence_milli: u16,
  pub emergency: bool,
}

impl DecodedUplink {
  /// 第 `index` 路测量值还原为物理量
  pub fn value(&self, index: usize) -> Option<f32> {
    let raw = *self.measurements.get(index)?;
    Some(raw as f32 / MEASUREMENT_SCALES[index])
  }

  pub fn anomaly_score(&self) -> f32 {
    self.anomaly_milli as f32 / scale::SCORE
  }

  pub fn confidence(&self) -> f32 {
    self.confidence_milli as f32 / scale::SCORE
  }
}

struct FrameReader<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> FrameReader<'a> {
  fn take<const N: usize>(&mut self) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
    self.pos += N;
    out
  }

  fn u8(&mut self) -> u8 {
    self.take::<1>()[0]
  }

  fn u16(&mut self) -> u16 {
    u16::from_be_bytes(self.take())
  }

  fn i16(&mut self) -> i16 {
    i16::from_be_bytes(self.take())
  }

  fn u32(&mut self) -> u32 {
    u32::from_be_bytes(self.take())
  }

  fn f32_le(&mut self) -> f32 {
    f32::from_le_bytes(self.take())
  }
}

/// 解码上行帧
pub fn decode_uplink(bytes: &[u8]) -> Result<DecodedUplink> {
  if bytes.len() != UPLINK_FRAME_LEN {
    return Err(NodeError::FrameLength {
      expected: UPLINK_FRAME_LEN,
      actual: bytes.len(),
    });
  }

  let mut r = FrameReader { buf: bytes, pos: 0 };

  let timestamp = r.u32();
  let latitude = r.f32_le();
  let longitude = r.f32_le();
  let elevation = r.f32_le();

  let mut measurements = [0i16; 13];
  for m in measurements.iter_mut() {
    *m = r.i16();
  }

  debug_assert_eq!(r.pos, offset::QUALITY);
  let quality = QualityFlags::from_bits(r.u8());
  let battery_level = r.u8();
  let signal_strength = r.u8().wrapping_sub(scale::SIGNAL_OFFSET) as i8;
  let anomaly_milli = r.u16();
  let risk_level = RiskLevel::try_from(r.u8())?;
  let confidence_milli = r.u16();
  let emergency = r.u8() != 0;

  Ok(DecodedUplink {
    timestamp,
    latitude,
    longitude,
    elevation,
    measurements,
    quality,
    battery_level,
    signal_strength,
    anomaly_milli,
    risk_level,
    confidence_milli,
    emergency,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot() -> SensorSnapshot {
    SensorSnapshot {
      timestamp: 0x0102_0304,
      latitude: 46.5,
      longitude: 7.25,
      elevation: 1820.0,
      tilt_x: 0.0123,
      tilt_y: -0.5,
      tilt_z: 0.9,
      accel_x: 0.15,
      accel_y: -0.2,
      accel_z: 9.81,
      gyro_x: 0.002,
      gyro_y: -0.001,
      gyro_z: 0.0,
      pore_pressure: 130.7,
      temperature: 12.34,
      humidity: 77.9,
      strain_gauge: -55.5,
      battery_voltage: 3.6,
      battery_level: 85,
      signal_strength: -90,
      quality: QualityFlags::ALL,
    }
  }

  fn result() -> InferenceResult {
    InferenceResult {
      anomaly_score: 0.25,
      risk_level: RiskLevel::Medium,
      confidence: 0.8,
      timestamp: 0x0102_0304,
    }
  }

  #[test]
  fn test_frame_layout() {
    let frame = encode_uplink(&snapshot(), &result(), true, &CodecConfig::default());
    let bytes = frame.as_bytes();
    assert_eq!(bytes.len(), UPLINK_FRAME_LEN);

    assert_eq!(&bytes[0..4], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(&bytes[4..8], &46.5f32.to_le_bytes());
    assert_eq!(&bytes[8..12], &7.25f32.to_le_bytes());
    assert_eq!(&bytes[12..16], &1820.0f32.to_le_bytes());

    // tilt_x 0.0123 × 1000 → 12
    assert_eq!(&bytes[16..18], &12i16.to_be_bytes());
    // tilt_y -0.5 × 1000 → -500
    assert_eq!(&bytes[18..20], &(-500i16).to_be_bytes());
    // accel_z 9.81 × 100 → 981
    assert_eq!(&bytes[26..28], &981i16.to_be_bytes());
    // temperature 12.34 × 10 → 123
    assert_eq!(&bytes[36..38], &123i16.to_be_bytes());
    // strain -55.5 → -55（向零截断）
    assert_eq!(&bytes[40..42], &(-55i16).to_be_bytes());

    assert_eq!(bytes[offset::QUALITY], 0x3F);
    assert_eq!(bytes[offset::BATTERY], 85);
    assert_eq!(bytes[offset::SIGNAL], 38);
    assert_eq!(&bytes[45..47], &250u16.to_be_bytes());
    assert_eq!(bytes[offset::RISK], 1);
    assert_eq!(&bytes[48..50], &800u16.to_be_bytes());
    assert_eq!(bytes[offset::EMERGENCY], 1);
  }

  #[test]
  fn test_signal_strength_offset_wraps() {
    let config = CodecConfig::default();
    let s = snapshot().with_signal_strength(0);
    assert_eq!(encode_uplink(&s, &result(), false, &config).as_bytes()[44], 128);
    let s = snapshot().with_signal_strength(-128);
    assert_eq!(encode_uplink(&s, &result(), false, &config).as_bytes()[44], 0);
    let s = snapshot().with_signal_strength(127);
    assert_eq!(encode_uplink(&s, &result(), false, &config).as_bytes()[44], 255);
  }

  #[test]
  fn test_overflow_wrap_vs_saturate() {
    let s = SensorSnapshot {
      pore_pressure: 40000.0,
      humidity: -40000.0,
      ..snapshot()
    };
    let wrap = encode_uplink(&s, &result(), false, &CodecConfig::default());
    let saturate = encode_uplink(
      &s,
      &result(),
      false,
      &CodecConfig {
        overflow: OverflowPolicy::Saturate,
      },
    );

    // 40000 - 65536 = -25536
    assert_eq!(&wrap.as_bytes()[34..36], &(-25536i16).to_be_bytes());
    assert_eq!(&wrap.as_bytes()[38..40], &25536i16.to_be_bytes());
    assert_eq!(&saturate.as_bytes()[34..36], &i16::MAX.to_be_bytes());
    assert_eq!(&saturate.as_bytes()[38..40], &i16::MIN.to_be_bytes());

    // 范围内两种策略一致
    let s = SensorSnapshot {
      pore_pressure: 32767.0,
      ..snapshot()
    };
    let a = encode_uplink(&s, &result(), false, &CodecConfig::default());
    let b = encode_uplink(
      &s,
      &result(),
      false,
      &CodecConfig {
        overflow: OverflowPolicy::Saturate,
      },
    );
    assert_eq!(a, b);
  }

  #[test]
  fn test_round_trip_within_quantization() {
    let s = snapshot();
    let frame = encode_uplink(&s, &result(), false, &CodecConfig::default());
    let decoded = decode_uplink(frame.as_bytes()).unwrap();

    assert_eq!(decoded.timestamp, s.timestamp);
    assert_eq!(decoded.latitude, s.latitude);
    assert_eq!(decoded.elevation, s.elevation);
    assert_eq!(decoded.quality, QualityFlags::ALL);
    assert_eq!(decoded.battery_level, 85);
    assert_eq!(decoded.signal_strength, -90);
    assert_eq!(decoded.risk_level, RiskLevel::Medium);
    assert!(!decoded.emergency);

    let raw = features(&s);
    for (i, value) in raw.iter().enumerate() {
      let restored = decoded.value(i).unwrap();
      let step = 1.0 / MEASUREMENT_SCALES[i];
      assert!((restored - value).abs() <= step, "channel {}", i);
    }
    assert!((decoded.anomaly_score() - 0.25).abs() <= 0.001);
    assert!((decoded.confidence() - 0.8).abs() <= 0.001);
    assert_eq!(decoded.value(13), None);
  }

  #[test]
  fn test_decode_rejects_bad_frames() {
    assert_eq!(
      decode_uplink(&[0u8; 50]),
      Err(NodeError::FrameLength {
        expected: 51,
        actual: 50
      })
    );

    let mut bytes = encode_uplink(&snapshot(), &result(), false, &CodecConfig::default()).into_bytes();
    bytes[offset::RISK] = 9;
    assert_eq!(decode_uplink(&bytes), Err(NodeError::InvalidRiskLevel(9)));
  }

  #[test]
  fn test_nan_measurement_encodes_zero() {
    let s = SensorSnapshot {
      gyro_x: f32::NAN,
      ..snapshot()
    };
    let frame = encode_uplink(&s, &result(), false, &CodecConfig::default());
    assert_eq!(&frame.as_bytes()[28..30], &[0, 0]);
  }
}
