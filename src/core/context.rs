//! 执行上下文：命名字符串变量的容器
//!
//! 每次函数调用按值传入 Context，返回新的 Context 替换调用方持有的旧值；
//! `input` 为主变量，计划状态占用四个保留键（见 plan::state）。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 主输入变量名
pub const INPUT_KEY: &str = "input";

/// 执行上下文（变量名 -> 字符串值）
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    variables: BTreeMap<String, String>,
}

impl Context {
    /// 以 input 创建上下文
    pub fn new(input: impl Into<String>) -> Self {
        let mut ctx = Self::default();
        ctx.set(INPUT_KEY, input);
        ctx
    }

    pub fn input(&self) -> &str {
        self.get(INPUT_KEY).unwrap_or_default()
    }

    pub fn update(&mut self, input: impl Into<String>) {
        self.set(INPUT_KEY, input);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.variables.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    /// builder 风格设置变量
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
