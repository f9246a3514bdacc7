//! 核心层：执行上下文、错误类型、Kernel

pub mod context;
pub mod error;
pub mod kernel;

pub use context::{Context, INPUT_KEY};
pub use error::{PlanError, SkillError, StepFailure};
pub use kernel::Kernel;
