// ==========================================
// 车间工单重排系统 - 日志系统初始化
// ==========================================
// 工具: tracing + tracing-subscriber
// 口径: 每次重排挂在 reflow span 下并携带 reflow_id 字段,
//       逐阶段决策日志 (阶段0..3) 均输出在该 span 内
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤指令: 核心库 info, 其余依赖 warn
const DEFAULT_DIRECTIVES: &str = "warn,workshop_reflow=info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 过滤指令, 优先于默认值
///   追踪单次重排的逐阶段决策:
///   RUST_LOG=workshop_reflow::engine::reflow=debug
///
/// # 示例
/// ```no_run
/// use workshop_reflow::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_directives(DEFAULT_DIRECTIVES);
}

/// 按给定过滤指令初始化 (RUST_LOG 仍然优先)
///
/// # 参数
/// - `directives`: EnvFilter 指令串, 如 "warn,workshop_reflow=debug"
pub fn init_with_directives(directives: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 核心库 debug 全开, 输出交给测试捕获; 可在多个测试中重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("workshop_reflow=debug"))
        .with_test_writer()
        .with_target(false)
        .try_init();
}
