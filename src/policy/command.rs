//! 下行命令对策略状态的修改

use crate::codec::DownlinkCommand;
use crate::config::MINUTE_MS;

use super::PolicyState;

/// 命令执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PolicyMutation {
  /// 发送间隔已更新
  IntervalSet { interval_ms: u32 },
  /// 已清零上次发送时间，下个周期强制发送
  TransmitForced,
  /// 已进入维护模式
  MaintenanceEntered,
  /// 已记录阈值提示，不影响阈值
  ThresholdHintStored(u8),
  /// 未知命令，已忽略
  Ignored { command: u8 },
  /// 帧无效（不足 2 字节），状态未改变
  Malformed,
}

/// 把命令应用到策略状态
pub fn apply_command(state: &mut PolicyState, command: DownlinkCommand) -> PolicyMutation {
  let mutation = match command {
    DownlinkCommand::SetInterval { minutes } => {
      let interval_ms = minutes as u32 * MINUTE_MS;
      state.transmission_interval_ms = interval_ms;
      PolicyMutation::IntervalSet { interval_ms }
    }
    DownlinkCommand::ForceTransmit => {
      state.last_transmission_ms = 0;
      PolicyMutation::TransmitForced
    }
    DownlinkCommand::EnterMaintenance => {
      state.maintenance_mode = true;
      PolicyMutation::MaintenanceEntered
    }
    DownlinkCommand::ThresholdHint(value) => {
      state.threshold_hint = Some(value);
      PolicyMutation::ThresholdHintStored(value)
    }
    DownlinkCommand::Unknown { command, value } => {
      log::warn!("unknown downlink command {:#04x} (value {})", command, value);
      return PolicyMutation::Ignored { command };
    }
  };

  log::info!("downlink applied: {:?}", mutation);
  mutation
}

/// 本地操作员退出维护模式
pub fn leave_maintenance(state: &mut PolicyState) {
  if state.maintenance_mode {
    log::info!("leaving maintenance mode");
  }
  state.maintenance_mode = false;
}
