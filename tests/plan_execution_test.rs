//! 计划执行循环集成测试

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use plankernel::core::{Context, Kernel, PlanError};
    use plankernel::plan::{
        create_plan, execute_plan, run_plan, PlanOutcome, PlanState, DEFAULT_MAX_STEPS,
        EXECUTE_PLAN,
    };
    use plankernel::skills::{FnFunction, SkillFunctions};

    const CURSOR: &str = "test.cursor";

    /// 脚本化 ExecutePlan：共 total 步，第 fail_at 步报告失败；每次调用计数
    fn scripted_planner(
        total: usize,
        fail_at: Option<usize>,
        calls: Arc<AtomicUsize>,
    ) -> SkillFunctions {
        SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            EXECUTE_PLAN,
            "scripted",
            move |ctx: Context| {
                calls.fetch_add(1, Ordering::SeqCst);
                let done: usize = ctx.get(CURSOR).and_then(|v| v.parse().ok()).unwrap_or(0);
                let step = done + 1;

                let mut state = PlanState::from_context(&ctx);
                state.is_successful = Some(step) != fail_at;
                state.result = if state.is_successful {
                    format!("result-{step}")
                } else {
                    String::new()
                };
                state.is_complete = step >= total;
                Ok(state.into_context(ctx.with(CURSOR, step.to_string())))
            },
        ))
    }

    fn pending_plan() -> Context {
        PlanState::new("scripted plan").into_context(Context::new("ask"))
    }

    #[tokio::test]
    async fn test_three_steps_all_succeed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(3, None, calls.clone());

        let result = execute_plan(&Kernel::default(), &planner, pending_plan(), DEFAULT_MAX_STEPS)
            .await
            .unwrap();

        assert_eq!(result.as_deref(), Some("result-3"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_already_complete_plan_returns_none_without_invocation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(3, None, calls.clone());
        let mut done = PlanState::new("nothing left");
        done.is_complete = true;

        let plan = done.into_context(Context::new("ask"));
        let result = execute_plan(&Kernel::default(), &planner, plan, 10).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_step_two_of_three_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(3, Some(2), calls.clone());

        let err = execute_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap_err();

        let failure = err.step_failure().expect("step failure");
        assert_eq!(failure.failed_step, 2);
        assert_eq!(failure.partial_results, vec!["result-1".to_string()]);
        assert!(failure.reason.is_none());
        // 失败时的计划状态即失败步骤返回的状态
        assert_eq!(failure.plan.get(CURSOR), Some("2"));
        assert!(!PlanState::from_context(&failure.plan).is_successful);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.to_string(), "Step 2 execution failed");
    }

    #[tokio::test]
    async fn test_first_step_failure_has_no_partial_results() {
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(3, Some(1), calls.clone());

        let err = execute_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap_err();

        let failure = err.step_failure().unwrap();
        assert_eq!(failure.failed_step, 1);
        assert!(failure.partial_results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_not_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(15, None, calls.clone());

        let run = run_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert_eq!(run.steps_executed, 9);
        assert_eq!(run.result.as_deref(), Some("result-9"));
        assert_eq!(run.outcome, PlanOutcome::BudgetExhausted);
        assert!(!PlanState::from_context(&run.plan).is_complete);

        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(15, None, calls.clone());
        let result = execute_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap();
        assert_eq!(result.as_deref(), Some("result-9"));
    }

    #[tokio::test]
    async fn test_budget_bounds_invocations() {
        for max_steps in [0, 1, 2, 5] {
            let calls = Arc::new(AtomicUsize::new(0));
            let planner = scripted_planner(100, None, calls.clone());
            run_plan(&Kernel::default(), &planner, pending_plan(), max_steps)
                .await
                .unwrap();
            assert_eq!(
                calls.load(Ordering::SeqCst),
                max_steps.saturating_sub(1),
                "max_steps={max_steps}"
            );
        }
    }

    #[tokio::test]
    async fn test_completion_exactly_at_budget_edge() {
        // 9 步计划、上限 10：第 9 步恰好完成
        let calls = Arc::new(AtomicUsize::new(0));
        let planner = scripted_planner(9, None, calls.clone());
        let run = run_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap();
        assert_eq!(run.outcome, PlanOutcome::Completed);
        assert_eq!(run.result.as_deref(), Some("result-9"));
    }

    #[tokio::test]
    async fn test_missing_execute_plan_is_precondition_violation() {
        let planner = SkillFunctions::new("PlannerSkill");
        let err = execute_plan(&Kernel::default(), &planner, pending_plan(), 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::MissingPlannerFunction(ref name) if name == "ExecutePlan"
        ));
        assert!(err.step_failure().is_none());
    }

    #[tokio::test]
    async fn test_create_plan_passes_ask_as_input() {
        let seen = Arc::new(std::sync::Mutex::new(String::new()));
        let seen_in_fn = seen.clone();
        let planner = SkillFunctions::new("PlannerSkill").with(FnFunction::new(
            "CreatePlan",
            "records the ask",
            move |ctx: Context| {
                *seen_in_fn.lock().unwrap() = ctx.input().to_string();
                Ok(PlanState::new(format!("plan for {}", ctx.input())).into_context(ctx))
            },
        ));

        let plan = create_plan(&Kernel::default(), &planner, "shout it").await.unwrap();
        assert_eq!(seen.lock().unwrap().as_str(), "shout it");
        assert_eq!(PlanState::from_context(&plan).description, "plan for shout it");
    }
}
