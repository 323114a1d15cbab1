//! OpenPanel API 集成测试
//!
//! 运行方式:
//! ```bash
//! OPENPANEL_HOST=panel.example.com OPENPANEL_ADMIN_USERNAME=admin OPENPANEL_ADMIN_PASSWORD=xxx \
//!     cargo test -p openpanel-provider --test openpanel_test -- --ignored --nocapture --test-threads=1
//! ```

mod common;

use common::{client_from_env, connection_from_env};
use openpanel_provider::{ApiClient, HttpMethod, ProviderError, ResponseBody, ServerConnection};

#[tokio::test]
#[ignore]
async fn test_openpanel_token() {
    skip_if_no_credentials!(
        "OPENPANEL_HOST",
        "OPENPANEL_ADMIN_USERNAME",
        "OPENPANEL_ADMIN_PASSWORD"
    );

    let client = client_from_env().expect("创建测试客户端失败");
    let first = require_ok!(client.token().await, "token 调用失败");
    let second = require_ok!(client.token().await, "token 调用失败");
    assert_eq!(first, second, "缓存的 token 应该一致");

    println!("✓ token 测试通过");
}

#[tokio::test]
#[ignore]
async fn test_openpanel_list_plans() {
    skip_if_no_credentials!(
        "OPENPANEL_HOST",
        "OPENPANEL_ADMIN_USERNAME",
        "OPENPANEL_ADMIN_PASSWORD"
    );

    let client = client_from_env().expect("创建测试客户端失败");
    let response = require_ok!(
        client.call(HttpMethod::Get, "plans", None).await,
        "GET plans 调用失败"
    );

    assert!(response.is_http_success(), "HTTP {}", response.status);
    assert!(
        matches!(&response.body, ResponseBody::Json(v) if v.get("plans").is_some_and(|p| p.is_array())),
        "响应中缺少 plans 数组: {}",
        response.raw
    );

    println!("✓ list_plans 测试通过");
}

#[tokio::test]
#[ignore]
async fn test_openpanel_missing_user() {
    skip_if_no_credentials!(
        "OPENPANEL_HOST",
        "OPENPANEL_ADMIN_USERNAME",
        "OPENPANEL_ADMIN_PASSWORD"
    );

    let client = client_from_env().expect("创建测试客户端失败");
    let response = require_ok!(
        client
            .call(HttpMethod::Get, "users/zz-test-does-not-exist", None)
            .await
    );

    assert!(
        !response.is_http_success() || response.body.field("error").is_some(),
        "不存在的用户不应返回成功: {}",
        response.raw
    );

    println!("✓ missing_user 测试通过");
}

#[tokio::test]
#[ignore]
async fn test_openpanel_bad_credentials() {
    skip_if_no_credentials!(
        "OPENPANEL_HOST",
        "OPENPANEL_ADMIN_USERNAME",
        "OPENPANEL_ADMIN_PASSWORD"
    );

    let valid = connection_from_env().expect("读取连接配置失败");
    let connection = ServerConnection::new(valid.host(), "zz-invalid-admin", "zz-invalid-password")
        .with_port(valid.port())
        .with_tls(valid.use_tls())
        .with_tls_verification(valid.verify_tls());
    let client = ApiClient::new(connection).expect("创建测试客户端失败");

    let result = client.token().await;
    assert!(
        matches!(result, Err(ProviderError::Authentication { .. })),
        "错误凭证应该认证失败: {result:?}"
    );

    println!("✓ bad_credentials 测试通过");
}
