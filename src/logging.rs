// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别与输出格式
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 输出格式环境变量（取值 "json" 时输出结构化 JSON 行）
pub const LOG_FORMAT_ENV: &str = "ENTITY_IMPORT_LOG_FORMAT";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=entity_import=trace
/// - ENTITY_IMPORT_LOG_FORMAT: "json" 输出 JSON 行，其他值为文本
///
/// # 示例
/// ```no_run
/// use entity_import::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 测试用日志初始化（可重复调用）
///
/// 仅放开本 crate 的 debug 级别，依赖库保持 warn
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("warn,entity_import=debug"))
        .with_test_writer()
        .try_init();
}
