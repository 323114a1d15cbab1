//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::env;

use openpanel_provider::{ApiClient, ServerConnection};

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 从环境变量构造连接
///
/// Optional: `OPENPANEL_PORT` (default 2087), `OPENPANEL_USE_TLS` and
/// `OPENPANEL_VERIFY_TLS` (`0`/`false` to disable).
pub fn connection_from_env() -> Option<ServerConnection> {
    let host = env::var("OPENPANEL_HOST").ok()?;
    let username = env::var("OPENPANEL_ADMIN_USERNAME").ok()?;
    let password = env::var("OPENPANEL_ADMIN_PASSWORD").ok()?;

    let mut connection = ServerConnection::new(host, username, password);
    if let Some(port) = env::var("OPENPANEL_PORT").ok().and_then(|p| p.parse().ok()) {
        connection = connection.with_port(port);
    }
    if let Ok(flag) = env::var("OPENPANEL_USE_TLS") {
        connection = connection.with_tls(!matches!(flag.as_str(), "0" | "false"));
    }
    if let Ok(flag) = env::var("OPENPANEL_VERIFY_TLS") {
        connection = connection.with_tls_verification(!matches!(flag.as_str(), "0" | "false"));
    }
    Some(connection)
}

/// 创建测试客户端
pub fn client_from_env() -> Option<ApiClient> {
    ApiClient::new(connection_from_env()?).ok()
}
