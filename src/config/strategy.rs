use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// 多目标选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum StrategyMode {
    Loadbalance,
    Fallback,
    Single,
    Conditional,
}

impl StrategyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::Loadbalance => "loadbalance",
            StrategyMode::Fallback => "fallback",
            StrategyMode::Single => "single",
            StrategyMode::Conditional => "conditional",
        }
    }
}

impl FromStr for StrategyMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "loadbalance" => Ok(StrategyMode::Loadbalance),
            "fallback" => Ok(StrategyMode::Fallback),
            "single" => Ok(StrategyMode::Single),
            "conditional" => Ok(StrategyMode::Conditional),
            other => Err(ContractError::InvalidStrategyMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for StrategyMode {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 旧版 `Config.mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ConfigMode {
    Single,
    Fallback,
    Loadbalance,
    Scientist,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Single => "single",
            ConfigMode::Fallback => "fallback",
            ConfigMode::Loadbalance => "loadbalance",
            ConfigMode::Scientist => "scientist",
        }
    }

    /// 对应的路由策略；scientist 没有路由语义
    pub fn strategy_mode(&self) -> Option<StrategyMode> {
        match self {
            ConfigMode::Single => Some(StrategyMode::Single),
            ConfigMode::Fallback => Some(StrategyMode::Fallback),
            ConfigMode::Loadbalance => Some(StrategyMode::Loadbalance),
            ConfigMode::Scientist => None,
        }
    }
}

impl FromStr for ConfigMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(ConfigMode::Single),
            "fallback" => Ok(ConfigMode::Fallback),
            "loadbalance" => Ok(ConfigMode::Loadbalance),
            "scientist" => Ok(ConfigMode::Scientist),
            other => Err(ContractError::InvalidConfigMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for ConfigMode {
    type Error = ContractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// conditional 策略中的一条规则：query 命中时路由到名为 `then` 的目标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub query: Map<String, Value>,
    pub then: String,
}

/// 路由策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub mode: StrategyMode,
    /// fallback 触发状态码，未设置时任何非 2xx 都会触发
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_status_codes: Option<Vec<u16>>,
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Strategy {
    pub fn new(mode: StrategyMode) -> Self {
        Self {
            mode,
            on_status_codes: None,
            conditions: Vec::new(),
            default: None,
        }
    }

    /// 上游返回该状态码时是否切换到下一个目标
    pub fn should_fallback(&self, status: u16) -> bool {
        match &self.on_status_codes {
            Some(codes) => codes.contains(&status),
            None => !(200..300).contains(&status),
        }
    }

    /// conditions 与 default 引用的所有目标名
    pub fn referenced_targets(&self) -> impl Iterator<Item = &str> {
        self.conditions
            .iter()
            .map(|c| c.then.as_str())
            .chain(self.default.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strategy_mode_parse() {
        assert_eq!("fallback".parse::<StrategyMode>().unwrap(), StrategyMode::Fallback);
        let err = "roundrobin".parse::<StrategyMode>().unwrap_err();
        assert!(matches!(err, ContractError::InvalidStrategyMode(_)));
    }

    #[test]
    fn test_unknown_strategy_mode_rejected_on_deserialize() {
        let err = serde_json::from_value::<Strategy>(json!({"mode": "random"})).unwrap_err();
        assert!(err.to_string().contains("random"));
    }

    #[test]
    fn test_conditional_strategy_deserialization() {
        let strategy: Strategy = serde_json::from_value(json!({
            "mode": "conditional",
            "conditions": [
                {"query": {"metadata.user_plan": {"$eq": "paid"}}, "then": "finetuned"}
            ],
            "default": "base"
        }))
        .unwrap();
        assert_eq!(strategy.mode, StrategyMode::Conditional);
        assert_eq!(strategy.conditions[0].then, "finetuned");
        let refs: Vec<_> = strategy.referenced_targets().collect();
        assert_eq!(refs, vec!["finetuned", "base"]);
    }

    #[test]
    fn test_should_fallback() {
        let any_error = Strategy::new(StrategyMode::Fallback);
        assert!(any_error.should_fallback(500));
        assert!(any_error.should_fallback(401));
        assert!(!any_error.should_fallback(200));

        let mut only_429 = Strategy::new(StrategyMode::Fallback);
        only_429.on_status_codes = Some(vec![429]);
        assert!(only_429.should_fallback(429));
        assert!(!only_429.should_fallback(500));
    }

    #[test]
    fn test_config_mode() {
        assert_eq!(ConfigMode::Loadbalance.strategy_mode(), Some(StrategyMode::Loadbalance));
        assert_eq!(ConfigMode::Scientist.strategy_mode(), None);
        assert_eq!(serde_json::to_value(ConfigMode::Scientist).unwrap(), json!("scientist"));
        assert!(serde_json::from_value::<ConfigMode>(json!("conditional")).is_err());
    }
}
