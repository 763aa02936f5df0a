use serde::{Deserialize, Serialize};
use tracing::warn;

/// 未指定 onStatusCodes 时触发重试的状态码
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// 单个请求允许的最大重试次数
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

/// 重试设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySettings {
    /// 最大重试次数
    pub attempts: u32,
    /// 触发重试的 HTTP 状态码
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_status_codes: Option<Vec<u16>>,
    /// 是否遵循 provider 返回的 Retry-After 头
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_retry_after_header: Option<bool>,
}

impl RetrySettings {
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts,
            on_status_codes: None,
            use_retry_after_header: None,
        }
    }

    /// 实际生效的重试次数，超过上限时截断
    pub fn effective_attempts(&self) -> u32 {
        if self.attempts > MAX_RETRY_ATTEMPTS {
            warn!(
                "重试次数 {} 超过上限，按 {} 处理",
                self.attempts, MAX_RETRY_ATTEMPTS
            );
            return MAX_RETRY_ATTEMPTS;
        }
        self.attempts
    }

    pub fn status_codes(&self) -> &[u16] {
        self.on_status_codes
            .as_deref()
            .unwrap_or(&DEFAULT_RETRY_STATUS_CODES)
    }

    /// 该状态码是否触发重试
    pub fn retries_on(&self, status: u16) -> bool {
        self.effective_attempts() > 0 && self.status_codes().contains(&status)
    }

    pub fn honors_retry_after(&self) -> bool {
        self.use_retry_after_header.unwrap_or(false)
    }
}
