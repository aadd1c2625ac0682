//! 命令定义和实现

pub mod check_recipe;
pub mod config;
pub mod flush;
pub mod run;
pub mod status;

pub use check_recipe::CheckRecipeCommand;
pub use config::ConfigCommand;
pub use flush::FlushCommand;
pub use run::RunCommand;
pub use status::StatusCommand;
