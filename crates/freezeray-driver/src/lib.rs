//! 驱动层
//!
//! 本 crate 提供三台串口设备的链路会话与类型化驱动，包括：
//! - 通用的写-等待-读-校验-重试循环（[`LinkSession`]）
//! - 注射泵 / 温控器 / 微控制器驱动
//! - [`Rig`] 聚合与尽力关机
//! - 可替换的时钟（真实等待或虚拟时间）
//!
//! 所有操作都在调用线程上同步阻塞执行，任一时刻最多只有一次设备交换。

mod builder;
pub mod clock;
mod config;
mod controller;
mod error;
pub mod link;
mod micro;
mod pump;
mod rig;
#[cfg(any(test, feature = "mock"))]
pub mod sim;

pub use builder::RigBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LinkConfig;
pub use controller::TempController;
pub use error::LinkError;
pub use link::{LinkSession, LinkStats};
pub use micro::{MicroStatus, Microcontroller};
pub use pump::SyringePump;
pub use rig::{Rig, ShutdownReport};

pub use freezeray_protocol as protocol;
pub use freezeray_serial::{Transport, TransportError};
