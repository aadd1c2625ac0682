//! 控制层错误类型

use freezeray_driver::LinkError;
use std::path::PathBuf;
use thiserror::Error;

/// 配方解析错误
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Failed to read recipe: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recipe CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Recipe has no header row")]
    MissingHeader,

    #[error("Line {line}: expected 8 fields, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("Line {line}: invalid {field} {value:?}: {reason}")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid duration {0:?}")]
    InvalidDuration(String),
}

/// 配置文件错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// 日志输出错误
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// 运行错误
#[derive(Error, Debug)]
pub enum ControlError {
    /// 执行命令失败（重试耗尽等），运行已中止
    #[error("Step {step} actuation failed: {source}")]
    Actuation {
        step: usize,
        #[source]
        source: LinkError,
    },

    /// 启动阶段（如注射泵初始化）失败
    #[error("Rig initialisation failed: {0}")]
    Init(#[source] LinkError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// 恢复信号源已断开
    #[error("Resume gate closed before step {0} was acknowledged")]
    GateClosed(usize),
}
