//! plankernel - 技能编排内核
//!
//! 入口：加载 .env 与配置、初始化日志、导入技能与 planner，为 ask 创建计划并逐步执行。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use plankernel::config::{load_config, load_dotenv};
use plankernel::core::{Kernel, PlanError};
use plankernel::plan::{create_plan, run_plan, PlanOutcome, PlanState};
use plankernel::planner::ERROR_KEY;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "plankernel", about = "Turn an ask into a skill plan and execute it step by step")]
struct Cli {
    /// 额外的 TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的步数上限
    #[arg(long)]
    max_steps: Option<usize>,

    /// 追加到 ask 之后的待处理文本
    #[arg(long)]
    input: Option<String>,

    /// 自然语言目标
    #[arg(required = true)]
    ask: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to resolve working dir")?;
    let env_files = load_dotenv(&cwd);

    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
    tracing::debug!(loaded = ?env_files.loaded, "Environment files loaded");
    for (path, error) in &env_files.failed {
        tracing::warn!(path = %path.display(), %error, "Failed to load env file");
    }

    let config = load_config(cli.config.clone()).context("Failed to load config")?;
    let max_steps = cli.max_steps.unwrap_or(config.planner.max_steps);

    let kernel = Kernel::from_config(&config)?;
    kernel.import_native_skills().await;
    kernel
        .import_semantic_skills(&config.skills.directory)
        .await
        .context("Failed to import semantic skills")?;
    let planner = kernel.import_planner_skill(&config.planner.skill_name).await;

    let mut ask = cli.ask.join(" ");
    if let Some(input) = &cli.input {
        ask = format!("{ask}: {input}");
    }

    let plan = create_plan(&kernel, &planner, &ask)
        .await
        .context("Failed to create plan")?;
    println!("Plan:\n\n{}\n", PlanState::from_context(&plan).description);

    match run_plan(&kernel, &planner, plan, max_steps).await {
        Ok(run) => {
            println!("Result:\n\n{}", run.result.as_deref().unwrap_or("(no result)"));
            if run.outcome == PlanOutcome::BudgetExhausted {
                println!(
                    "\nPlan incomplete: step budget of {} exhausted after {} steps",
                    max_steps, run.steps_executed
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(PlanError::StepFailed(failure)) => {
            eprintln!("Step {} execution failed.", failure.failed_step);
            if let Some(reason) = failure.reason.as_deref().or(failure.plan.get(ERROR_KEY)) {
                eprintln!("Reason: {reason}");
            }
            for (i, partial) in failure.partial_results.iter().enumerate() {
                eprintln!("  [{}] {}", i + 1, partial);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Plan execution failed"),
    }
}
