//! 下行命令解码
//!
//! 帧格式 `[命令, 参数, ...]`，多余字节忽略，不足 2 字节视为无效（不执行任何操作）。
//! 射频回调与主循环不在同一上下文时，命令经 SPSC 队列交给主循环处理。

use heapless::spsc::{Producer, Queue};

/// 命令字
pub mod opcode {
  /// 设置发送间隔（分钟）
  pub const SET_INTERVAL: u8 = 0x01;
  /// 下次周期强制发送
  pub const FORCE_TRANSMIT: u8 = 0x02;
  /// 进入维护模式
  pub const ENTER_MAINTENANCE: u8 = 0x03;
  /// 阈值提示（保留，仅记录）
  pub const THRESHOLD_HINT: u8 = 0x04;
}

/// 队列长度参数（heapless 的 spsc 队列可容纳 N-1 条）
pub const DOWNLINK_QUEUE_LEN: usize = 8;

/// 下行命令队列
pub type DownlinkQueue = Queue<DownlinkCommand, DOWNLINK_QUEUE_LEN>;

/// 下行命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DownlinkCommand {
  SetInterval { minutes: u8 },
  ForceTransmit,
  EnterMaintenance,
  ThresholdHint(u8),
  Unknown { command: u8, value: u8 },
}

impl DownlinkCommand {
  /// 命令字节
  pub fn opcode(&self) -> u8 {
    match self {
      DownlinkCommand::SetInterval { .. } => opcode::SET_INTERVAL,
      DownlinkCommand::ForceTransmit => opcode::FORCE_TRANSMIT,
      DownlinkCommand::EnterMaintenance => opcode::ENTER_MAINTENANCE,
      DownlinkCommand::ThresholdHint(_) => opcode::THRESHOLD_HINT,
      DownlinkCommand::Unknown { command, .. } => *command,
    }
  }
}

/// 解码下行帧
pub fn decode_downlink(bytes: &[u8]) -> Option<DownlinkCommand> {
  let (command, value) = match bytes {
    [command, value, ..] => (*command, *value),
    _ => return None,
  };

  let decoded = match command {
    opcode::SET_INTERVAL => DownlinkCommand::SetInterval { minutes: value },
    opcode::FORCE_TRANSMIT => DownlinkCommand::ForceTransmit,
    opcode::ENTER_MAINTENANCE => DownlinkCommand::EnterMaintenance,
    opcode::THRESHOLD_HINT => DownlinkCommand::ThresholdHint(value),
    _ => DownlinkCommand::Unknown { command, value },
  };
  Some(decoded)
}

/// 在射频回调中解码并入队
///
/// 解码失败或队列已满返回 false。
pub fn enqueue_downlink(producer: &mut Producer<'_, DownlinkCommand, DOWNLINK_QUEUE_LEN>, bytes: &[u8]) -> bool {
  let Some(command) = decode_downlink(bytes) else {
    return false;
  };

  match producer.enqueue(command) {
    Ok(()) => true,
    Err(dropped) => {
      log::warn!("downlink queue full, dropping command {:#04x}", dropped.opcode());
      false
    }
  }
}
