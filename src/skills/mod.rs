//! 技能系统
//!
//! 技能（Skill）是一组具名函数的集合，函数签名统一为 `(Context) -> Result<Context, SkillError>`。
//! 来源：
//! - **native**: 内置原生函数（TextSkill）
//! - **semantic / loader**: 目录中的 Prompt 模板（LLM 驱动）
//! - 显式注册的闭包（FnFunction）

mod loader;
mod native;
mod registry;
mod semantic;

pub use loader::{FunctionConfig, SkillLoader};
pub use native::{text_skill, TEXT_SKILL};
pub use registry::{FnFunction, SkillFunction, SkillFunctions, SkillRegistry};
pub use semantic::{PromptTemplate, SemanticFunction};
