//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先把 `.env`、`.secret.env` 读入进程环境，再读 TOML 文件，最后用环境变量 `PLANKERNEL__*` 覆盖
//! （双下划线表示嵌套，如 `PLANKERNEL__PLANNER__MAX_STEPS=5`）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::plan::DEFAULT_MAX_STEPS;

/// 依次加载的 dotenv 文件（不存在则跳过）
pub const DOTENV_FILES: [&str; 2] = [".env", ".secret.env"];

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub planner: PlannerSection,
    pub skills: SkillsSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、模型、密钥与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai（任意 OpenAI 兼容端点）/ mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 未设置时回退到 OPENAI_API_KEY
    pub api_key: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次 LLM 请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [planner] 段：步数上限与 planner 技能名
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSection {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_planner_skill")]
    pub skill_name: String,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            skill_name: default_planner_skill(),
        }
    }
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

fn default_planner_skill() -> String {
    "PlannerSkill".to_string()
}

/// [skills] 段：语义技能目录
#[derive(Debug, Clone, Deserialize)]
pub struct SkillsSection {
    #[serde(default = "default_skills_dir")]
    pub directory: PathBuf,
}

impl Default for SkillsSection {
    fn default() -> Self {
        Self {
            directory: default_skills_dir(),
        }
    }
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from("config/skills")
}

/// dotenv 加载结果：成功的文件与解析失败的文件（附错误）
#[derive(Debug, Default)]
pub struct EnvFiles {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// 把 dir 下的 `.env`、`.secret.env` 读入进程环境；已存在的环境变量不被覆盖
///
/// 在日志初始化之前调用，因此不在这里打日志，失败项由调用方记录。
pub fn load_dotenv(dir: &Path) -> EnvFiles {
    let mut files = EnvFiles::default();
    for name in DOTENV_FILES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => files.loaded.push(path),
            Err(e) => files.failed.push((path, e.to_string())),
        }
    }
    files
}

/// 从 config 目录加载配置，环境变量 PLANKERNEL__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 则追加该文件（可覆盖前面的键）；文件不存在时报错
/// 3. 最后叠加环境变量 PLANKERNEL__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(config::ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PLANKERNEL")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
