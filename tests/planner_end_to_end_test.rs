//! Kernel + SequentialPlanner 端到端测试（Mock LLM，无需 API）

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plankernel::core::Kernel;
    use plankernel::llm::MockLlmClient;
    use plankernel::plan::{create_plan, execute_plan, run_plan, PlanOutcome, PlanState};
    use plankernel::planner::{ERROR_KEY, PAYLOAD_KEY};

    #[tokio::test]
    async fn test_reverse_translate_uppercase() {
        let dir = tempfile::tempdir().unwrap();
        let fn_dir = dir.path().join("CockneySkill").join("Translate");
        std::fs::create_dir_all(&fn_dir).unwrap();
        std::fs::write(
            fn_dir.join("skprompt.txt"),
            "Rewrite as cockney rhyming slang: {{$input}}",
        )
        .unwrap();
        std::fs::write(
            fn_dir.join("config.toml"),
            "description = \"Cockney rhyming slang\"\n",
        )
        .unwrap();

        let llm = Arc::new(MockLlmClient::with_responses([
            "PAYLOAD: Mind the gap\n1. TextSkill.Reverse\n2. CockneySkill.Translate\n3. TextSkill.Uppercase",
            "apples and pears",
        ]));
        let kernel = Kernel::new(llm.clone());
        kernel.import_native_skills().await;
        let imported = kernel.import_semantic_skills(dir.path()).await.unwrap();
        assert_eq!(imported, vec!["CockneySkill".to_string()]);
        let planner = kernel.import_planner_skill("PlannerSkill").await;

        let plan = create_plan(&kernel, &planner, "Reverse it, translate it, shout it")
            .await
            .unwrap();
        assert_eq!(plan.get(PAYLOAD_KEY), Some("Mind the gap"));

        let run = run_plan(&kernel, &planner, plan, 10).await.unwrap();
        assert_eq!(run.outcome, PlanOutcome::Completed);
        assert_eq!(run.steps_executed, 3);
        assert_eq!(run.result.as_deref(), Some("APPLES AND PEARS"));

        let requests = llm.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[0][0].content.contains("CockneySkill.Translate: Cockney rhyming slang"));
        assert_eq!(requests[1][0].content, "Rewrite as cockney rhyming slang: pag eht dniM");
    }

    #[tokio::test]
    async fn test_unknown_function_stops_plan_with_partial_results() {
        let llm = Arc::new(MockLlmClient::with_responses([
            "PAYLOAD: abc\n1. TextSkill.Reverse\n2. Ghost.Skill\n3. TextSkill.Uppercase",
        ]));
        let kernel = Kernel::new(llm);
        kernel.import_native_skills().await;
        let planner = kernel.import_planner_skill("PlannerSkill").await;

        let plan = create_plan(&kernel, &planner, "do things").await.unwrap();
        let err = execute_plan(&kernel, &planner, plan, 10).await.unwrap_err();

        let failure = err.step_failure().unwrap();
        assert_eq!(failure.failed_step, 2);
        assert_eq!(failure.partial_results, vec!["cba".to_string()]);
        assert_eq!(failure.plan.get(ERROR_KEY), Some("Unknown function: Ghost.Skill"));
        assert!(!PlanState::from_context(&failure.plan).is_successful);
    }

    #[tokio::test]
    async fn test_plan_without_steps_returns_none() {
        let llm = Arc::new(MockLlmClient::with_responses(["No functions are needed."]));
        let kernel = Kernel::new(llm);
        let planner = kernel.import_planner_skill("PlannerSkill").await;

        let plan = create_plan(&kernel, &planner, "hello").await.unwrap();
        assert!(PlanState::from_context(&plan).is_complete);
        assert_eq!(execute_plan(&kernel, &planner, plan, 10).await.unwrap(), None);
    }
}
