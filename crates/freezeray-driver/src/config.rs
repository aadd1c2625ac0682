//! 链路配置
//!
//! 重试次数与各类延时不再是进程级全局量，而是在构造会话时显式传入。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 单个设备链路的重试/延时配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// 最大写-读循环次数
    pub retries: u32,
    /// 每次读取前等待设备响应的时间（毫秒）
    pub reply_delay_ms: u64,
    /// 写入后的硬件稳定延时（毫秒），0 表示不需要
    pub settle_delay_ms: u64,
    /// 执行机构类命令（如电机爬升）使用的更长响应时间（毫秒）
    pub actuation_delay_ms: u64,
}

impl LinkConfig {
    /// 注射泵参考配置
    pub const fn pump() -> Self {
        Self {
            retries: 10,
            reply_delay_ms: 200,
            settle_delay_ms: 0,
            actuation_delay_ms: 200,
        }
    }

    /// 温控器参考配置
    pub const fn controller() -> Self {
        Self {
            retries: 10,
            reply_delay_ms: 200,
            settle_delay_ms: 0,
            actuation_delay_ms: 200,
        }
    }

    /// 微控制器参考配置
    ///
    /// 通道可靠性较差，重试上限更高；写入后必须等待 200ms 才会可靠应答；
    /// 电机从 0 爬升到满速约需 2.8s。
    pub const fn micro() -> Self {
        Self {
            retries: 20,
            reply_delay_ms: 400,
            settle_delay_ms: 200,
            actuation_delay_ms: 2800,
        }
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn actuation_delay(&self) -> Duration {
        Duration::from_millis(self.actuation_delay_ms)
    }

    /// 所有延时为 0（测试用）
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            reply_delay_ms: 0,
            settle_delay_ms: 0,
            actuation_delay_ms: 0,
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::pump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_presets() {
        assert_eq!(LinkConfig::pump().retries, 10);
        assert_eq!(LinkConfig::controller().retries, 10);
        assert_eq!(LinkConfig::micro().retries, 20);
        assert_eq!(LinkConfig::micro().settle_delay(), Duration::from_millis(200));
        assert!(LinkConfig::pump().settle_delay().is_zero());
    }
}
