//! plankernel - 技能编排内核
//!
//! 模块划分：
//! - **config**: 应用配置加载（.env + TOML + 环境变量）
//! - **core**: 执行上下文、错误类型、Kernel（函数调用与审计日志）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **plan**: 计划状态契约与执行循环
//! - **planner**: CreatePlan / ExecutePlan 的顺序 planner 实现
//! - **skills**: 技能注册表、原生技能、Prompt 模板技能与目录加载

pub mod config;
pub mod core;
pub mod llm;
pub mod plan;
pub mod planner;
pub mod skills;

pub use crate::core::{Context, Kernel, PlanError, SkillError, StepFailure};
pub use plan::{create_plan, execute_plan, run_plan, PlanOutcome, PlanRun, PlanState};
