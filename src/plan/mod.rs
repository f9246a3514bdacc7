//! 计划层：计划状态契约与执行循环

pub mod executor;
pub mod state;

pub use executor::{
    create_plan, execute_plan, run_plan, PlanOutcome, PlanRun, CREATE_PLAN, DEFAULT_MAX_STEPS,
    EXECUTE_PLAN,
};
pub use state::PlanState;
