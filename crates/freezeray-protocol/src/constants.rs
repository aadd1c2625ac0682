//! 协议常量定义

/// 微控制器帧起始
pub const STX: u8 = 0x02;
/// 注射泵应答结束 / 微控制器命令结束
pub const ETX: u8 = 0x03;
/// 微控制器应答结束
pub const ACK: u8 = 0x06;
/// 微控制器命令数据结束
pub const NUL: u8 = 0x00;
/// 回车：注射泵命令结束、温控器命令结束
pub const CR: u8 = 0x0D;

/// 温控器帧起始 `*`
pub const TC_STX: u8 = 0x2A;
/// 温控器应答结束 `^`
pub const TC_ACK: u8 = 0x5E;
/// 温控器回显此字符表示拒绝我方校验和
pub const TC_REJECT: u8 = b'X';
/// 温控器地址（固定）
pub const TC_ADDRESS: &str = "00";

/// 温控器数值超过此值时按补码负数重新解释
///
/// 经验阈值：正常工艺温度不会到达 1000 °C。
pub const TC_NEGATIVE_THRESHOLD: f64 = 1000.0;

/// 温控器输出功率满量程（对应 100%）
pub const TC_POWER_FULL_SCALE: f64 = 511.0;

/// 微控制器 PWM 满量程
pub const MICRO_PWM_MAX: u8 = 255;
