//! 技能目录加载器
//!
//! 目录结构：
//! ```text
//! config/skills/
//! ├── CockneySkill/
//! │   └── Translate/
//! │       ├── skprompt.txt   # Prompt 模板（必需）
//! │       └── config.toml    # 函数元数据（可选，description）
//! └── ...
//! ```
//! 每个一级子目录导入为一个技能，二级子目录为其函数；缺少 skprompt.txt 的函数目录被跳过。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;

use crate::llm::LlmClient;
use crate::skills::{PromptTemplate, SemanticFunction, SkillFunction, SkillRegistry};

const PROMPT_FILE: &str = "skprompt.txt";
const CONFIG_FILE: &str = "config.toml";

/// 函数元数据（config.toml）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionConfig {
    #[serde(default)]
    pub description: String,
}

/// 语义技能目录加载器
pub struct SkillLoader {
    skills_dir: PathBuf,
    llm: Arc<dyn LlmClient>,
    timeout_secs: u64,
}

impl SkillLoader {
    pub fn new(skills_dir: impl AsRef<Path>, llm: Arc<dyn LlmClient>, timeout_secs: u64) -> Self {
        Self {
            skills_dir: skills_dir.as_ref().to_path_buf(),
            llm,
            timeout_secs,
        }
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// 扫描目录并将全部技能导入 registry，返回导入的技能名（排序）
    pub async fn load_all(&self, registry: &SkillRegistry) -> anyhow::Result<Vec<String>> {
        let mut imported = Vec::new();

        if !self.skills_dir.exists() {
            tracing::warn!(dir = %self.skills_dir.display(), "Skills directory not found");
            return Ok(imported);
        }

        let entries = std::fs::read_dir(&self.skills_dir)
            .with_context(|| format!("Failed to read skills dir {}", self.skills_dir.display()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(skill_name) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };
            let functions = self.load_skill(&path)?;
            if functions.is_empty() {
                continue;
            }
            registry.import(&skill_name, functions).await;
            imported.push(skill_name);
        }

        imported.sort();
        tracing::info!("Loaded {} semantic skills", imported.len());
        Ok(imported)
    }

    fn load_skill(&self, dir: &Path) -> anyhow::Result<Vec<Arc<dyn SkillFunction>>> {
        let mut functions: Vec<Arc<dyn SkillFunction>> = Vec::new();
        for entry in std::fs::read_dir(dir)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Some(function) = self.load_function(&path)? {
                    functions.push(Arc::new(function));
                }
            }
        }
        Ok(functions)
    }

    fn load_function(&self, dir: &Path) -> anyhow::Result<Option<SemanticFunction>> {
        let prompt_path = dir.join(PROMPT_FILE);
        if !prompt_path.exists() {
            return Ok(None);
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            return Ok(None);
        };

        let prompt = std::fs::read_to_string(&prompt_path)
            .with_context(|| format!("Failed to read {}", prompt_path.display()))?;
        let template = PromptTemplate::parse(prompt)
            .with_context(|| format!("Invalid prompt template {}", prompt_path.display()))?;

        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<FunctionConfig>(&raw)
                .with_context(|| format!("Invalid function config {}", config_path.display()))?
        } else {
            FunctionConfig::default()
        };

        Ok(Some(SemanticFunction::new(
            name,
            config.description,
            template,
            Arc::clone(&self.llm),
            self.timeout_secs,
        )))
    }
}
