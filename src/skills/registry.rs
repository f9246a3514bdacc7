//! 技能注册表
//!
//! 所有可调用单元实现 SkillFunction trait（name / description / invoke），
//! 按「技能名 -> 函数名」两级注册；SkillRegistry 为可克隆的共享句柄，planner 借此在运行时查找步骤函数。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{Context, SkillError};

/// 技能函数 trait：接收上下文，返回更新后的上下文或失败
#[async_trait]
pub trait SkillFunction: Send + Sync {
    /// 函数名（如 Uppercase、CreatePlan）
    fn name(&self) -> &str;

    /// 函数描述（供 planner 的 LLM 理解功能）
    fn description(&self) -> &str;

    async fn invoke(&self, context: Context) -> Result<Context, SkillError>;
}

type BoxedFn = Box<dyn Fn(Context) -> Result<Context, SkillError> + Send + Sync>;

/// 闭包函数：显式注册一个 `(Context) -> Result<Context, SkillError>`
pub struct FnFunction {
    name: String,
    description: String,
    f: BoxedFn,
}

impl FnFunction {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(Context) -> Result<Context, SkillError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl SkillFunction for FnFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, context: Context) -> Result<Context, SkillError> {
        (self.f)(context)
    }
}

/// 单个技能的函数集合（函数名 -> 函数）
#[derive(Clone, Default)]
pub struct SkillFunctions {
    skill: String,
    functions: HashMap<String, Arc<dyn SkillFunction>>,
}

impl SkillFunctions {
    pub fn new(skill: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            functions: HashMap::new(),
        }
    }

    pub fn skill_name(&self) -> &str {
        &self.skill
    }

    pub fn insert(&mut self, function: Arc<dyn SkillFunction>) {
        self.functions.insert(function.name().to_string(), function);
    }

    /// builder 风格追加函数
    pub fn with(mut self, function: impl SkillFunction + 'static) -> Self {
        self.insert(Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SkillFunction>> {
        self.functions.get(name).cloned()
    }

    /// 查找必需函数，缺失时返回 FunctionNotFound（含技能前缀）
    pub fn require(&self, name: &str) -> Result<Arc<dyn SkillFunction>, SkillError> {
        self.get(name)
            .ok_or_else(|| SkillError::FunctionNotFound(format!("{}.{}", self.skill, name)))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// 技能注册表：技能名 -> SkillFunctions；克隆共享同一份数据
#[derive(Clone, Default)]
pub struct SkillRegistry {
    skills: Arc<RwLock<HashMap<String, SkillFunctions>>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个技能的全部函数，返回该技能的函数集合；同名技能会被替换
    pub async fn import(
        &self,
        skill: &str,
        functions: Vec<Arc<dyn SkillFunction>>,
    ) -> SkillFunctions {
        let mut set = SkillFunctions::new(skill);
        for function in functions {
            set.insert(function);
        }
        tracing::info!(skill, functions = ?set.names(), "Importing skill");
        self.skills
            .write()
            .await
            .insert(skill.to_string(), set.clone());
        set
    }

    pub async fn skill(&self, name: &str) -> Option<SkillFunctions> {
        self.skills.read().await.get(name).cloned()
    }

    /// 按全名 `Skill.Function` 查找函数
    pub async fn function(&self, full_name: &str) -> Option<Arc<dyn SkillFunction>> {
        let (skill, function) = full_name.trim().split_once('.')?;
        self.skills.read().await.get(skill)?.get(function)
    }

    pub async fn skill_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.skills.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// 返回 (Skill.Function, description) 列表（排序），用于生成 planner prompt；可排除某个技能（planner 自身）
    pub async fn describe(&self, exclude_skill: Option<&str>) -> Vec<(String, String)> {
        let skills = self.skills.read().await;
        let mut out: Vec<(String, String)> = skills
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != exclude_skill)
            .flat_map(|(name, set)| {
                set.functions.values().map(move |f| {
                    (format!("{}.{}", name, f.name()), f.description().to_string())
                })
            })
            .collect();
        out.sort();
        out
    }
}
