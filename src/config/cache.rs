use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 缓存设置（规范形式）
///
/// 线上格式既可以是 `"simple"` 也可以是 `{"mode": "simple", "maxAge": 300}`，
/// 解析时统一转换为结构化形式，序列化始终输出结构化形式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CacheSpec", rename_all = "camelCase")]
pub struct CacheSettings {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
}

/// 线上允许的两种缓存写法
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CacheSpec {
    Shorthand(String),
    #[serde(rename_all = "camelCase")]
    Structured {
        mode: String,
        #[serde(default)]
        max_age: Option<u64>,
    },
}

impl From<CacheSpec> for CacheSettings {
    fn from(spec: CacheSpec) -> Self {
        match spec {
            CacheSpec::Shorthand(mode) => CacheSettings { mode, max_age: None },
            CacheSpec::Structured { mode, max_age } => CacheSettings { mode, max_age },
        }
    }
}

impl CacheSettings {
    pub const SIMPLE: &'static str = "simple";
    pub const SEMANTIC: &'static str = "semantic";

    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn is_simple(&self) -> bool {
        self.mode == Self::SIMPLE
    }

    pub fn is_semantic(&self) -> bool {
        self.mode == Self::SEMANTIC
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shorthand_and_structured_normalize() {
        let short: CacheSettings = serde_json::from_value(json!("simple")).unwrap();
        let full: CacheSettings =
            serde_json::from_value(json!({"mode": "simple", "maxAge": 300})).unwrap();
        let bare: CacheSettings = serde_json::from_value(json!({"mode": "simple"})).unwrap();

        assert!(short.is_simple());
        assert!(full.is_simple());
        assert_eq!(short.mode, full.mode);
        assert_eq!(short, bare);
        assert_eq!(full.max_age(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_always_serialized_structured() {
        let short: CacheSettings = serde_json::from_value(json!("semantic")).unwrap();
        assert!(short.is_semantic());
        assert_eq!(serde_json::to_value(&short).unwrap(), json!({"mode": "semantic"}));

        let with_age = CacheSettings::new("simple").with_max_age(60);
        assert_eq!(
            serde_json::to_value(&with_age).unwrap(),
            json!({"mode": "simple", "maxAge": 60})
        );
    }

    #[test]
    fn test_unconstrained_mode() {
        let custom: CacheSettings = serde_json::from_value(json!("vector-v2")).unwrap();
        assert_eq!(custom.mode, "vector-v2");
        assert!(!custom.is_simple() && !custom.is_semantic());
    }

    #[test]
    fn test_invalid_cache_shape() {
        assert!(serde_json::from_value::<CacheSettings>(json!(42)).is_err());
        assert!(serde_json::from_value::<CacheSettings>(json!({"maxAge": 10})).is_err());
    }
}
