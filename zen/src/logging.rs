use tracing::Level;

pub fn init_logging() {
    init_logging_with("info");
}

/// 按名称设置最大日志级别，无法识别时退回 INFO；重复调用不会覆盖已安装的 subscriber。
pub fn init_logging_with(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .try_init();
}

fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}
