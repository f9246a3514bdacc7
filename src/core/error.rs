//! 错误类型：技能调用错误与计划执行错误
//!
//! 步骤失败是预期内的常见结果，以 `PlanError::StepFailed` 返回给调用方，由上层决定记录、重试或终止。

use thiserror::Error;

use crate::core::Context;

/// 单个技能函数调用可能出现的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("LLM timeout after {0}s")]
    LlmTimeout(u64),

    #[error("Function execution failed: {0}")]
    ExecutionFailed(String),
}

/// 步骤执行失败的现场：失败步序号（从 1 开始）、失败时的计划状态、此前成功步骤的结果
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub failed_step: usize,
    pub plan: Context,
    pub partial_results: Vec<String>,
    /// ExecutePlan 调用本身报错时的原因；步骤自报失败时为 None
    pub reason: Option<String>,
}

/// 计划创建 / 执行错误
#[derive(Error, Debug)]
pub enum PlanError {
    /// 前置条件：planner 缺少所需函数（CreatePlan / ExecutePlan）
    #[error("Planner function not found: {0}")]
    MissingPlannerFunction(String),

    #[error("Step {} execution failed", .0.failed_step)]
    StepFailed(Box<StepFailure>),

    #[error(transparent)]
    Skill(#[from] SkillError),
}

impl PlanError {
    /// 若为步骤失败，返回失败现场
    pub fn step_failure(&self) -> Option<&StepFailure> {
        match self {
            PlanError::StepFailed(failure) => Some(failure),
            _ => None,
        }
    }
}
