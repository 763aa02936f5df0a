//! 配置键名规范化
//!
//! 通过请求头传入的配置常用 snake_case（`virtual_key`、`on_status_codes`），
//! 内部结构使用 camelCase。这里在反序列化前统一键名。

use serde_json::{Map, Value};

/// 这些键的值由调用方定义，内部键名保持原样
const OPAQUE_KEYS: &[&str] = &[
    "overrideParams",
    "query",
    "metadata",
    "vertexServiceAccountJson",
    "beforeRequestHooks",
    "afterRequestHooks",
    "defaultInputGuardrails",
    "defaultOutputGuardrails",
];

/// snake_case 转 camelCase，已是 camelCase 的键不变
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for (i, ch) in key.chars().enumerate() {
        if ch == '_' && i > 0 {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// 递归规范化配置对象的键名
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = to_camel_case(&key);
                let inner = if OPAQUE_KEYS.contains(&key.as_str()) {
                    inner
                } else {
                    normalize_keys(inner)
                };
                out.insert(key, inner);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("virtual_key"), "virtualKey");
        assert_eq!(to_camel_case("on_status_codes"), "onStatusCodes");
        assert_eq!(to_camel_case("aws_s3_bucket"), "awsS3Bucket");
        assert_eq!(to_camel_case("apiKey"), "apiKey");
        assert_eq!(to_camel_case("_private"), "_private");
    }

    #[test]
    fn test_normalize_nested_targets() {
        let value = json!({
            "strategy": {"mode": "fallback", "on_status_codes": [429]},
            "targets": [
                {"virtual_key": "vk-1", "retry": {"attempts": 2, "use_retry_after_header": true}}
            ]
        });
        let normalized = normalize_keys(value);
        assert_eq!(
            normalized,
            json!({
                "strategy": {"mode": "fallback", "onStatusCodes": [429]},
                "targets": [
                    {"virtualKey": "vk-1", "retry": {"attempts": 2, "useRetryAfterHeader": true}}
                ]
            })
        );
    }

    #[test]
    fn test_opaque_subtrees_untouched() {
        let value = json!({
            "override_params": {"max_tokens": 10, "top_p": 0.5},
            "metadata": {"user_plan": "paid"},
            "strategy": {
                "mode": "conditional",
                "conditions": [{"query": {"metadata.user_plan": {"$eq": "paid"}}, "then": "a"}]
            }
        });
        let normalized = normalize_keys(value);
        assert_eq!(normalized["overrideParams"], json!({"max_tokens": 10, "top_p": 0.5}));
        assert_eq!(normalized["metadata"], json!({"user_plan": "paid"}));
        assert_eq!(
            normalized["strategy"]["conditions"][0]["query"],
            json!({"metadata.user_plan": {"$eq": "paid"}})
        );
    }
}
