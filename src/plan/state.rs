//! 计划状态：执行上下文中的四个保留键
//!
//! `PlanState::from_context` 将任意上下文解释为计划状态；缺失或无法解析的标志一律视为 false，
//! 因此不含计划字段的上下文读作「未完成、未成功」。步骤游标由 ExecutePlan 自行维护，不在此处。

use serde::{Deserialize, Serialize};

use crate::core::Context;

pub const DESCRIPTION_KEY: &str = "description";
pub const IS_COMPLETE_KEY: &str = "isComplete";
pub const IS_SUCCESSFUL_KEY: &str = "isSuccessful";
pub const RESULT_KEY: &str = "result";

/// 计划状态
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanState {
    pub description: String,
    pub is_complete: bool,
    pub is_successful: bool,
    /// 最近一步的输出；仅在 is_successful 为 true 时有效
    pub result: String,
}

impl PlanState {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn from_context(context: &Context) -> Self {
        Self {
            description: context.get(DESCRIPTION_KEY).unwrap_or_default().to_string(),
            is_complete: parse_flag(context.get(IS_COMPLETE_KEY)),
            is_successful: parse_flag(context.get(IS_SUCCESSFUL_KEY)),
            result: context.get(RESULT_KEY).unwrap_or_default().to_string(),
        }
    }

    /// 写回上下文（覆盖四个保留键，其余变量不变）
    pub fn apply(&self, context: &mut Context) {
        context.set(DESCRIPTION_KEY, self.description.as_str());
        context.set(IS_COMPLETE_KEY, self.is_complete.to_string());
        context.set(IS_SUCCESSFUL_KEY, self.is_successful.to_string());
        context.set(RESULT_KEY, self.result.as_str());
    }

    pub fn into_context(self, mut context: Context) -> Context {
        self.apply(&mut context);
        context
    }
}

/// 只读取完成标志，供执行循环判断
pub fn is_complete(context: &Context) -> bool {
    parse_flag(context.get(IS_COMPLETE_KEY))
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}
