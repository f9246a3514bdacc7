//! 语义技能：Prompt 模板 + LLM
//!
//! 模板中的 `{{$name}}` 以上下文变量替换（缺失为空串），渲染结果作为 User 消息发给 LLM，
//! 回复写回 input。LLM 调用施加超时，超时转为 SkillError::LlmTimeout。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::time::timeout;

use crate::core::{Context, SkillError};
use crate::llm::{LlmClient, Message};
use crate::skills::SkillFunction;

const VARIABLE_PATTERN: &str = r"\{\{\s*\$([A-Za-z0-9_.]+)\s*\}\}";

/// 已解析的 Prompt 模板
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
    variable: Regex,
}

impl PromptTemplate {
    pub fn parse(text: impl Into<String>) -> Result<Self, SkillError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SkillError::Template("empty prompt template".to_string()));
        }
        let variable =
            Regex::new(VARIABLE_PATTERN).map_err(|e| SkillError::Template(e.to_string()))?;
        Ok(Self { text, variable })
    }

    /// 模板引用的变量名（按出现顺序，去重）
    pub fn variables(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for cap in self.variable.captures_iter(&self.text) {
            let name = cap[1].to_string();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }

    pub fn render(&self, context: &Context) -> String {
        self.variable
            .replace_all(&self.text, |caps: &regex::Captures<'_>| {
                context.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

/// 由模板驱动的技能函数
pub struct SemanticFunction {
    name: String,
    description: String,
    template: PromptTemplate,
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl SemanticFunction {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        template: PromptTemplate,
        llm: Arc<dyn LlmClient>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            template,
            llm,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl SkillFunction for SemanticFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, mut context: Context) -> Result<Context, SkillError> {
        let prompt = self.template.render(&context);
        tracing::debug!(
            function = %self.name,
            prompt_len = prompt.len(),
            "Rendering semantic function"
        );

        let output = timeout(self.timeout, self.llm.complete(&[Message::user(prompt)]))
            .await
            .map_err(|_| SkillError::LlmTimeout(self.timeout.as_secs()))?
            .map_err(SkillError::LlmError)?;

        context.update(output.trim());
        Ok(context)
    }
}
