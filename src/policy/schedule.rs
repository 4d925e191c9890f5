//! 发送间隔与休眠时长计算

use crate::config::{PolicyConfig, HOUR_MS};
use crate::inference::RiskLevel;

/// 由设备运行时间推算的"小时"
///
/// 注意：这是上电以来的毫秒数折算，不是墙上时间。设备没有 RTC 同步，
/// 白天窗口判断只是近似。
pub fn device_hour(now_ms: u32) -> u8 {
  ((now_ms / HOUR_MS) % 24) as u8
}

/// 风险等级对应的基础发送间隔
pub fn tier_interval(config: &PolicyConfig, risk: RiskLevel) -> u32 {
  match risk {
    RiskLevel::Critical | RiskLevel::High => config.high_risk_interval_ms,
    RiskLevel::Medium => config.medium_risk_interval_ms,
    RiskLevel::Low => config.low_risk_interval_ms,
  }
}

/// 非紧急状态下的发送间隔：低电量时加倍
pub fn transmission_interval(config: &PolicyConfig, risk: RiskLevel, battery_level: u8) -> u32 {
  let interval = tier_interval(config, risk);
  if battery_level < config.low_battery_level {
    interval.saturating_mul(2)
  } else {
    interval
  }
}

/// 计算休眠时长 (ms)
///
/// 电量分档互斥：极低电量 ×4 优先于低电量 ×2；白天且电量充足时再缩短到 70%。
pub fn sleep_duration(config: &PolicyConfig, risk: RiskLevel, battery_level: u8, now_ms: u32) -> u32 {
  let mut sleep_ms = match risk {
    RiskLevel::Critical => config.critical_sleep_ms,
    RiskLevel::High => config.high_sleep_ms,
    RiskLevel::Medium => config.medium_sleep_ms,
    RiskLevel::Low => config.low_sleep_ms,
  };

  if battery_level < config.very_low_battery_level {
    sleep_ms = sleep_ms.saturating_mul(4);
  } else if battery_level < config.low_battery_level {
    sleep_ms = sleep_ms.saturating_mul(2);
  }

  let hour = device_hour(now_ms);
  let daylight = hour >= config.daylight_start_hour && hour <= config.daylight_end_hour;
  if daylight && battery_level > config.solar_battery_level {
    sleep_ms = (sleep_ms as u64 * config.solar_sleep_percent as u64 / 100) as u32;
  }

  sleep_ms
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::MINUTE_MS;

  fn config() -> PolicyConfig {
    PolicyConfig::default()
  }

  #[test]
  fn test_device_hour_wraps_daily() {
    assert_eq!(device_hour(0), 0);
    assert_eq!(device_hour(HOUR_MS - 1), 0);
    assert_eq!(device_hour(12 * HOUR_MS), 12);
    assert_eq!(device_hour(25 * HOUR_MS), 1);
    assert!(device_hour(u32::MAX) < 24);
  }

  #[test]
  fn test_tier_intervals() {
    let c = config();
    assert_eq!(tier_interval(&c, RiskLevel::Critical), 5 * MINUTE_MS);
    assert_eq!(tier_interval(&c, RiskLevel::High), 5 * MINUTE_MS);
    assert_eq!(tier_interval(&c, RiskLevel::Medium), 15 * MINUTE_MS);
    assert_eq!(tier_interval(&c, RiskLevel::Low), 30 * MINUTE_MS);
  }

  #[test]
  fn test_low_battery_doubles_interval() {
    let c = config();
    assert_eq!(transmission_interval(&c, RiskLevel::Low, 15), 60 * MINUTE_MS);
    assert_eq!(transmission_interval(&c, RiskLevel::Low, 20), 30 * MINUTE_MS);
    assert_eq!(transmission_interval(&c, RiskLevel::High, 5), 10 * MINUTE_MS);
  }

  #[test]
  fn test_sleep_base_values() {
    let c = config();
    // 0 点，电量 50：无缩放
    assert_eq!(sleep_duration(&c, RiskLevel::Critical, 50, 0), 30 * 1000);
    assert_eq!(sleep_duration(&c, RiskLevel::High, 50, 0), 2 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::Medium, 50, 0), 5 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::Low, 50, 0), 15 * MINUTE_MS);
  }

  #[test]
  fn test_sleep_battery_bands_exclusive() {
    let c = config();
    // 极低电量 ×4，白天窗口不生效（电量不足 80）
    assert_eq!(sleep_duration(&c, RiskLevel::Critical, 5, 12 * HOUR_MS), 120 * 1000);
    assert_eq!(sleep_duration(&c, RiskLevel::High, 5, 12 * HOUR_MS), 8 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::High, 15, 0), 4 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::High, 10, 0), 4 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::High, 9, 0), 8 * MINUTE_MS);
  }

  #[test]
  fn test_solar_shortening() {
    let c = config();
    assert_eq!(sleep_duration(&c, RiskLevel::High, 90, 12 * HOUR_MS), 84 * 1000);
    assert_eq!(sleep_duration(&c, RiskLevel::Low, 81, 6 * HOUR_MS), 630 * 1000);
    assert_eq!(sleep_duration(&c, RiskLevel::Low, 81, 18 * HOUR_MS), 630 * 1000);
    // 窗口外或电量正好 80 不缩短
    assert_eq!(sleep_duration(&c, RiskLevel::Low, 81, 19 * HOUR_MS), 15 * MINUTE_MS);
    assert_eq!(sleep_duration(&c, RiskLevel::Low, 80, 12 * HOUR_MS), 15 * MINUTE_MS);
  }
}
