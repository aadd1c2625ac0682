//! 交互式恢复闸门

use freezeray_control::{ControlError, Resume, ResumeGate};
use tracing::warn;

/// 在终端询问操作员是否继续
pub struct PromptGate;

impl ResumeGate for PromptGate {
    fn wait(&mut self, step: usize) -> Result<Resume, ControlError> {
        // ✅ 使用 inquire 提供更好的交互体验
        let answer = inquire::Confirm::new(&format!("Step {} complete. Continue?", step))
            .with_default(true)
            .with_help_message("No aborts the run and idles all devices")
            .prompt();

        match answer {
            Ok(true) => Ok(Resume::Continue),
            Ok(false) => Ok(Resume::Abort),
            Err(e) => {
                warn!("Resume prompt failed ({}), aborting run", e);
                Ok(Resume::Abort)
            },
        }
    }
}
