//! SequentialPlanner：CreatePlan / ExecutePlan 的具体实现
//!
//! CreatePlan 请 LLM 把 ask 拆成按序执行的 `Skill.Function` 列表，连同要处理的文本（PAYLOAD）写入上下文；
//! ExecutePlan 每次弹出一步，在注册表中查找并调用，用其输出更新 PAYLOAD 与计划状态。
//! 剩余步骤（游标）保存在 `plan.steps`，仅由本模块读写。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::timeout;

use crate::core::{Context, SkillError};
use crate::llm::{LlmClient, Message};
use crate::plan::{PlanState, CREATE_PLAN, EXECUTE_PLAN};
use crate::skills::{SkillFunction, SkillRegistry};

/// 剩余步骤（JSON 数组）
pub const STEPS_KEY: &str = "plan.steps";
/// 当前工作文本
pub const PAYLOAD_KEY: &str = "plan.payload";
/// 最近一步失败原因
pub const ERROR_KEY: &str = "plan.error";

const PAYLOAD_PREFIX: &str = "PAYLOAD:";

/// 解析后的计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlan {
    pub payload: Option<String>,
    pub steps: Vec<String>,
}

/// 列表项：`1.` / `1)` / `- ` 开头，名称形如 `Skill.Function`（允许被 ` * 包裹，其后可跟说明）
const STEP_PATTERN: &str =
    r"^(?:\d+[.)]|-)\s+[`*]*([A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*)\b";

static STEP_RE: OnceLock<Regex> = OnceLock::new();

/// 从 LLM 回复中提取 PAYLOAD 行与编号步骤
///
/// 列表从第一个步骤行开始，遇到非空且非步骤的行即结束；列表外以数字开头的普通文字不会被当作步骤。
pub fn parse_plan(response: &str) -> ParsedPlan {
    let step_re = STEP_RE.get_or_init(|| Regex::new(STEP_PATTERN).expect("step pattern is valid"));
    let mut payload = None;
    let mut steps = Vec::new();
    let mut in_list = false;
    let mut list_done = false;

    for line in response.lines() {
        let trimmed = line.trim();
        let is_payload = trimmed
            .get(..PAYLOAD_PREFIX.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(PAYLOAD_PREFIX));
        if is_payload {
            let text = trimmed[PAYLOAD_PREFIX.len()..].trim();
            if !text.is_empty() {
                payload = Some(text.to_string());
            }
            continue;
        }

        if list_done {
            continue;
        }
        match step_re.captures(trimmed) {
            Some(caps) => {
                in_list = true;
                steps.push(caps[1].to_string());
            }
            None if in_list && !trimmed.is_empty() => list_done = true,
            None => {}
        }
    }

    ParsedPlan { payload, steps }
}

/// 顺序 planner：持有注册表句柄与 LLM
#[derive(Clone)]
pub struct SequentialPlanner {
    registry: SkillRegistry,
    llm: Arc<dyn LlmClient>,
    skill_name: String,
    timeout: Duration,
}

impl SequentialPlanner {
    pub fn new(
        registry: SkillRegistry,
        llm: Arc<dyn LlmClient>,
        skill_name: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            registry,
            llm,
            skill_name: skill_name.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// CreatePlan 与 ExecutePlan 两个函数
    pub fn functions(&self) -> Vec<Arc<dyn SkillFunction>> {
        vec![
            Arc::new(CreatePlanFunction(self.clone())),
            Arc::new(ExecutePlanFunction(self.clone())),
        ]
    }

    async fn system_prompt(&self) -> String {
        let available = self
            .registry
            .describe(Some(&self.skill_name))
            .await
            .into_iter()
            .map(|(name, description)| format!("- {name}: {description}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a planner. Break the user's goal into an ordered list of function calls.\n\
             Each function receives the output of the previous one as its input.\n\
             Reply in exactly this format, with no other text:\n\
             PAYLOAD: <the text the first function should receive>\n\
             1. Skill.Function\n\
             2. Skill.Function\n\n\
             Available functions:\n{available}"
        )
    }
}

struct CreatePlanFunction(SequentialPlanner);

#[async_trait]
impl SkillFunction for CreatePlanFunction {
    fn name(&self) -> &str {
        CREATE_PLAN
    }

    fn description(&self) -> &str {
        "Create an ordered plan of skill functions that satisfies the goal in input"
    }

    async fn invoke(&self, mut context: Context) -> Result<Context, SkillError> {
        let planner = &self.0;
        let ask = context.input().to_string();
        let messages = [
            Message::system(planner.system_prompt().await),
            Message::user(ask.clone()),
        ];

        let response = timeout(planner.timeout, planner.llm.complete(&messages))
            .await
            .map_err(|_| SkillError::LlmTimeout(planner.timeout.as_secs()))?
            .map_err(SkillError::LlmError)?;

        let parsed = parse_plan(&response);
        tracing::info!(steps = ?parsed.steps, "Plan parsed");

        let steps = serde_json::to_string(&parsed.steps)
            .map_err(|e| SkillError::ExecutionFailed(e.to_string()))?;
        context.set(STEPS_KEY, steps);
        context.set(PAYLOAD_KEY, parsed.payload.unwrap_or(ask));

        let state = PlanState {
            description: response.trim().to_string(),
            is_complete: parsed.steps.is_empty(),
            is_successful: true,
            result: String::new(),
        };
        Ok(state.into_context(context))
    }
}

struct ExecutePlanFunction(SequentialPlanner);

impl ExecutePlanFunction {
    fn fail(
        mut context: Context,
        mut state: PlanState,
        remaining: &[String],
        reason: String,
    ) -> Result<Context, SkillError> {
        tracing::warn!(%reason, "Plan step failed");
        context.set(STEPS_KEY, encode_steps(remaining)?);
        context.set(ERROR_KEY, reason);
        state.is_successful = false;
        state.is_complete = remaining.is_empty();
        state.result = String::new();
        Ok(state.into_context(context))
    }
}

fn encode_steps(steps: &[String]) -> Result<String, SkillError> {
    serde_json::to_string(steps).map_err(|e| SkillError::ExecutionFailed(e.to_string()))
}

#[async_trait]
impl SkillFunction for ExecutePlanFunction {
    fn name(&self) -> &str {
        EXECUTE_PLAN
    }

    fn description(&self) -> &str {
        "Execute the next step of the plan carried in the context"
    }

    async fn invoke(&self, mut context: Context) -> Result<Context, SkillError> {
        let mut state = PlanState::from_context(&context);
        let mut steps: Vec<String> = serde_json::from_str(context.get(STEPS_KEY).unwrap_or("[]"))
            .map_err(|e| SkillError::InvalidInput(format!("{STEPS_KEY}: {e}")))?;
        let payload = context
            .get(PAYLOAD_KEY)
            .map(String::from)
            .unwrap_or_else(|| context.input().to_string());

        if steps.is_empty() {
            state.is_complete = true;
            state.is_successful = true;
            state.result = payload;
            return Ok(state.into_context(context));
        }

        let step = steps.remove(0);
        context.remove(ERROR_KEY);

        let Some(function) = self.0.registry.function(&step).await else {
            return Self::fail(context, state, &steps, format!("Unknown function: {step}"));
        };

        let mut step_input = context.clone();
        step_input.update(payload);
        match function.invoke(step_input).await {
            Ok(output) => {
                let result = output.input().to_string();
                tracing::debug!(%step, remaining = steps.len(), "Plan step executed");
                context.set(STEPS_KEY, encode_steps(&steps)?);
                context.set(PAYLOAD_KEY, result.as_str());
                state.is_successful = true;
                state.is_complete = steps.is_empty();
                state.result = result;
                Ok(state.into_context(context))
            }
            Err(e) => Self::fail(context, state, &steps, format!("{step}: {e}")),
        }
    }
}
