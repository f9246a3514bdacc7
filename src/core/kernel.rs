//! Kernel：持有技能注册表与 LLM 客户端，统一调用技能函数
//!
//! 每次 run 输出一条结构化审计日志（JSON）；导入原生技能、目录技能与 planner 技能的入口也在这里。

use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::core::{Context, SkillError};
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::planner::SequentialPlanner;
use crate::skills::{
    text_skill, SkillFunction, SkillFunctions, SkillLoader, SkillRegistry, TEXT_SKILL,
};

/// 技能编排内核
#[derive(Clone)]
pub struct Kernel {
    registry: SkillRegistry,
    llm: Arc<dyn LlmClient>,
    llm_timeout_secs: u64,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(Arc::new(MockLlmClient::new()))
    }
}

impl Kernel {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            registry: SkillRegistry::new(),
            llm,
            llm_timeout_secs: 60,
        }
    }

    /// 按配置创建：provider = "openai" 走 OpenAI 兼容客户端，"mock" 使用 MockLlmClient；其他值报错
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let llm: Arc<dyn LlmClient> = match config.llm.provider.as_str() {
            "mock" => Arc::new(MockLlmClient::new()),
            "openai" => Arc::new(OpenAiClient::new(
                config.llm.base_url.as_deref(),
                &config.llm.model,
                config.llm.api_key.as_deref(),
            )),
            other => {
                anyhow::bail!("Unknown LLM provider: {other} (expected \"openai\" or \"mock\")")
            }
        };
        tracing::info!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            "Kernel created"
        );
        Ok(Self::new(llm).with_llm_timeout(config.llm.timeouts.request))
    }

    pub fn with_llm_timeout(mut self, secs: u64) -> Self {
        self.llm_timeout_secs = secs;
        self
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn llm(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.llm)
    }

    /// 调用一个函数；上下文按值传入，返回的新上下文替换旧值
    pub async fn run(
        &self,
        function: &Arc<dyn SkillFunction>,
        context: Context,
    ) -> Result<Context, SkillError> {
        let start = Instant::now();
        let input_preview = preview(context.input());
        let result = function.invoke(context).await;

        let audit = serde_json::json!({
            "event": "function_audit",
            "function": function.name(),
            "ok": result.is_ok(),
            "duration_ms": start.elapsed().as_millis() as u64,
            "input_preview": input_preview,
        });
        tracing::info!(audit = %audit, "function");

        result
    }

    /// 导入内置 TextSkill
    pub async fn import_native_skills(&self) -> SkillFunctions {
        self.registry.import(TEXT_SKILL, text_skill()).await
    }

    /// 导入目录中的全部语义技能
    pub async fn import_semantic_skills(
        &self,
        skills_dir: impl AsRef<std::path::Path>,
    ) -> anyhow::Result<Vec<String>> {
        SkillLoader::new(skills_dir, self.llm(), self.llm_timeout_secs)
            .load_all(&self.registry)
            .await
    }

    /// 导入 planner 技能（CreatePlan / ExecutePlan），返回其函数集合
    pub async fn import_planner_skill(&self, skill_name: &str) -> SkillFunctions {
        let planner = SequentialPlanner::new(
            self.registry.clone(),
            self.llm(),
            skill_name,
            self.llm_timeout_secs,
        );
        self.registry.import(skill_name, planner.functions()).await
    }
}

fn preview(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}
