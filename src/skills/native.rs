//! 内置原生技能（TextSkill）：大小写、反转、去空白
//!
//! 每个函数读取 input，结果写回 input。

use std::sync::Arc;

use crate::core::{Context, SkillError};
use crate::skills::{FnFunction, SkillFunction};

/// 技能名
pub const TEXT_SKILL: &str = "TextSkill";

fn text_fn(
    name: &'static str,
    description: &'static str,
    f: fn(&str) -> String,
) -> Arc<dyn SkillFunction> {
    Arc::new(FnFunction::new(name, description, move |mut ctx: Context| {
        let out = f(ctx.input());
        ctx.update(out);
        Ok::<_, SkillError>(ctx)
    }))
}

/// TextSkill 的全部函数
pub fn text_skill() -> Vec<Arc<dyn SkillFunction>> {
    vec![
        text_fn(
            "Uppercase",
            "Return the text in all uppercase (aka capitals)",
            str::to_uppercase,
        ),
        text_fn("Lowercase", "Return the text in all lowercase", str::to_lowercase),
        text_fn("Reverse", "Reverse the order of the characters in the text", |s| {
            s.chars().rev().collect()
        }),
        text_fn(
            "Trim",
            "Remove leading and trailing whitespace from the text",
            |s| s.trim().to_string(),
        ),
    ]
}
