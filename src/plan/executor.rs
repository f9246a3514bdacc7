//! 计划执行循环
//!
//! 反复调用 planner 的 ExecutePlan，每次推进一步：成功则记录结果，失败立即终止并返回失败现场，
//! 计划完成或步数预算耗尽时返回最后一次成功结果。步骤严格串行，前一步完全结束后才开始下一步。

use crate::core::{Context, Kernel, PlanError, StepFailure};
use crate::plan::state::{self, PlanState};
use crate::skills::SkillFunctions;

pub const CREATE_PLAN: &str = "CreatePlan";
pub const EXECUTE_PLAN: &str = "ExecutePlan";
/// 默认步数上限（循环条件为 step < max_steps，故最多调用 max_steps - 1 次）
pub const DEFAULT_MAX_STEPS: usize = 10;

/// 循环结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// 计划已完成（含输入时即已完成）
    Completed,
    /// 步数预算耗尽，计划仍未完成
    BudgetExhausted,
}

/// 一次执行循环的结果
#[derive(Debug, Clone)]
pub struct PlanRun {
    /// 最后一次成功步骤的结果；未执行任何步骤时为 None
    pub result: Option<String>,
    pub steps_executed: usize,
    pub outcome: PlanOutcome,
    /// 循环结束时的计划上下文
    pub plan: Context,
}

impl PlanRun {
    pub fn is_complete(&self) -> bool {
        self.outcome == PlanOutcome::Completed
    }
}

/// 以 ask 为唯一输入调用 CreatePlan，返回初始计划上下文
pub async fn create_plan(
    kernel: &Kernel,
    planner: &SkillFunctions,
    ask: &str,
) -> Result<Context, PlanError> {
    let create = planner
        .get(CREATE_PLAN)
        .ok_or_else(|| PlanError::MissingPlannerFunction(CREATE_PLAN.to_string()))?;
    let plan = kernel.run(&create, Context::new(ask)).await?;
    tracing::info!(complete = state::is_complete(&plan), "Plan created");
    Ok(plan)
}

/// 执行计划直到完成、失败或预算耗尽，返回最后一次成功结果
///
/// 预算耗尽不视为错误；需要区分「完成」与「耗尽」时使用 [`run_plan`]。
pub async fn execute_plan(
    kernel: &Kernel,
    planner: &SkillFunctions,
    plan: Context,
    max_steps: usize,
) -> Result<Option<String>, PlanError> {
    Ok(run_plan(kernel, planner, plan, max_steps).await?.result)
}

/// 执行循环本体，额外返回已执行步数与结束方式
pub async fn run_plan(
    kernel: &Kernel,
    planner: &SkillFunctions,
    plan: Context,
    max_steps: usize,
) -> Result<PlanRun, PlanError> {
    let execute = planner
        .get(EXECUTE_PLAN)
        .ok_or_else(|| PlanError::MissingPlannerFunction(EXECUTE_PLAN.to_string()))?;

    let mut result: Option<String> = None;
    let mut partial_results: Vec<String> = Vec::new();
    let mut step = 1;
    let mut current = plan;

    while !state::is_complete(&current) && step < max_steps {
        let advanced = match kernel.run(&execute, current.clone()).await {
            Ok(advanced) => advanced,
            Err(e) => {
                return Err(PlanError::StepFailed(Box::new(StepFailure {
                    failed_step: step,
                    plan: current,
                    partial_results,
                    reason: Some(e.to_string()),
                })));
            }
        };

        let advanced_state = PlanState::from_context(&advanced);
        if !advanced_state.is_successful {
            tracing::debug!(step, "Plan step reported failure");
            return Err(PlanError::StepFailed(Box::new(StepFailure {
                failed_step: step,
                plan: advanced,
                partial_results,
                reason: None,
            })));
        }

        tracing::debug!(step, complete = advanced_state.is_complete, "Plan step succeeded");
        partial_results.push(advanced_state.result.clone());
        result = Some(advanced_state.result);

        current = advanced;
        step += 1;
    }

    let steps_executed = step - 1;
    let outcome = if state::is_complete(&current) {
        PlanOutcome::Completed
    } else {
        tracing::warn!(max_steps, steps_executed, "Step budget exhausted before plan completed");
        PlanOutcome::BudgetExhausted
    };

    Ok(PlanRun {
        result,
        steps_executed,
        outcome,
        plan: current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::FnFunction;

    fn complete_plan() -> Context {
        PlanState {
            description: "done".to_string(),
            is_complete: true,
            is_successful: true,
            result: String::new(),
        }
        .into_context(Context::new("ask"))
    }

    #[tokio::test]
    async fn test_missing_execute_plan_fails_before_any_step() {
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill");
        let err = execute_plan(&kernel, &planner, complete_plan(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::MissingPlannerFunction(ref n) if n == "ExecutePlan"));
    }

    #[tokio::test]
    async fn test_missing_create_plan() {
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill");
        let err = create_plan(&kernel, &planner, "ask").await.unwrap_err();
        assert!(matches!(err, PlanError::MissingPlannerFunction(ref n) if n == "CreatePlan"));
    }

    #[tokio::test]
    async fn test_complete_plan_runs_zero_steps() {
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            EXECUTE_PLAN,
            "",
            |_ctx: Context| panic!("ExecutePlan must not be invoked"),
        ));
        let run = run_plan(&kernel, &planner, complete_plan(), 10).await.unwrap();
        assert_eq!(run.result, None);
        assert_eq!(run.steps_executed, 0);
        assert!(run.is_complete());
    }

    #[tokio::test]
    async fn test_context_without_plan_fields_is_permissive() {
        // 无计划字段：视为未完成，首步即被调用；此处 ExecutePlan 直接标记完成
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            EXECUTE_PLAN,
            "",
            |ctx: Context| {
                Ok(PlanState {
                    description: String::new(),
                    is_complete: true,
                    is_successful: true,
                    result: "only".to_string(),
                }
                .into_context(ctx))
            },
        ));
        let result = execute_plan(&kernel, &planner, Context::new("raw"), DEFAULT_MAX_STEPS)
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("only"));
    }

    #[tokio::test]
    async fn test_invocation_error_is_step_failure() {
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            EXECUTE_PLAN,
            "",
            |_ctx: Context| Err(crate::core::SkillError::ExecutionFailed("boom".to_string())),
        ));
        let initial = Context::new("ask").with("marker", "initial");
        let err = execute_plan(&kernel, &planner, initial, 10).await.unwrap_err();
        let failure = err.step_failure().unwrap();
        assert_eq!(failure.failed_step, 1);
        assert!(failure.partial_results.is_empty());
        assert_eq!(failure.plan.get("marker"), Some("initial"));
        assert!(failure.reason.as_deref().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_budget_of_one_runs_nothing() {
        let kernel = Kernel::default();
        let planner = SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            EXECUTE_PLAN,
            "",
            |_ctx: Context| panic!("ExecutePlan must not be invoked"),
        ));
        let run = run_plan(&kernel, &planner, Context::new("ask"), 1).await.unwrap();
        assert_eq!(run.steps_executed, 0);
        assert_eq!(run.outcome, PlanOutcome::BudgetExhausted);
    }
}
