//! 配置与请求的结构校验
//!
//! 数据结构本身只描述形状，这里负责拒绝违反路由约束的配置：
//! conditional 策略引用不存在的目标、options 与 targets 冲突、无效权重等。

use crate::config::{Config, ProviderOptions, RetrySettings, ShortConfig, Strategy, StrategyMode, Target};
use crate::error::ContractError;
use crate::types::{Message, Params};
use crate::Result;
use std::collections::HashSet;
use tracing::debug;

/// 校验完整配置
pub fn validate_config(config: &Config) -> Result<()> {
    match (config.options.is_empty(), config.targets.is_empty()) {
        (false, false) => return Err(ContractError::ConflictingConfigShape),
        (true, true) => return Err(ContractError::MissingProviders),
        (false, true) => {
            let mode = config.mode.ok_or(ContractError::MissingMode)?;
            if let Some(strategy) = &config.strategy {
                match mode.strategy_mode() {
                    Some(expected) if expected != strategy.mode => {
                        return Err(ContractError::StrategyModeMismatch {
                            mode: mode.to_string(),
                            strategy: strategy.mode.to_string(),
                        })
                    }
                    _ => validate_strategy(strategy, &[], "config")?,
                }
            }
            for (i, options) in config.options.iter().enumerate() {
                validate_options(options, &format!("config.options[{i}]"))?;
            }
        }
        (true, false) => {
            let strategy = config
                .strategy
                .as_ref()
                .ok_or_else(|| ContractError::MissingStrategy("config".to_string()))?;
            validate_strategy(strategy, &config.targets, "config")?;
            for (i, target) in config.targets.iter().enumerate() {
                validate_target(target, &format!("config.targets[{i}]"))?;
            }
        }
    }

    if let Some(retry) = &config.retry {
        validate_retry(retry, "config.retry")?;
    }
    if let Some(strategy) = &config.strategy {
        validate_status_codes(strategy.on_status_codes.as_deref(), "config.strategy")?;
    }

    debug!("配置校验通过");
    Ok(())
}

/// 递归校验目标及其子目标
pub fn validate_target(target: &Target, path: &str) -> Result<()> {
    validate_options(&target.options, path)?;

    match (&target.strategy, target.targets.is_empty()) {
        (None, false) => return Err(ContractError::MissingStrategy(path.to_string())),
        (Some(_), true) => return Err(ContractError::EmptyStrategyTargets(path.to_string())),
        (Some(strategy), false) => validate_strategy(strategy, &target.targets, path)?,
        (None, true) => {}
    }

    for (i, child) in target.targets.iter().enumerate() {
        validate_target(child, &format!("{path}.targets[{i}]"))?;
    }
    Ok(())
}

/// 校验策略：conditional 需要非空 conditions，且所有引用都指向同级目标
pub fn validate_strategy(strategy: &Strategy, siblings: &[Target], path: &str) -> Result<()> {
    validate_status_codes(strategy.on_status_codes.as_deref(), path)?;

    if strategy.mode != StrategyMode::Conditional {
        return Ok(());
    }
    if strategy.conditions.is_empty() {
        return Err(ContractError::EmptyConditions(path.to_string()));
    }

    let mut names = HashSet::new();
    for name in siblings.iter().filter_map(|t| t.name.as_deref()) {
        if !names.insert(name) {
            return Err(ContractError::DuplicateTargetName {
                path: path.to_string(),
                name: name.to_string(),
            });
        }
    }
    for name in strategy.referenced_targets() {
        if !names.contains(name) {
            return Err(ContractError::missing_target(path, name));
        }
    }
    Ok(())
}

/// 校验单个 provider 选项中可检查的字段
pub fn validate_options(options: &ProviderOptions, path: &str) -> Result<()> {
    if let Some(weight) = options.weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ContractError::InvalidWeight {
                path: path.to_string(),
                weight,
            });
        }
    }
    if let Some(retry) = &options.retry {
        validate_retry(retry, &format!("{path}.retry"))?;
    }
    if let Some(params) = &options.override_params {
        validate_params(params, &format!("{path}.overrideParams"))?;
    }
    Ok(())
}

pub fn validate_retry(retry: &RetrySettings, path: &str) -> Result<()> {
    validate_status_codes(retry.on_status_codes.as_deref(), path)
}

fn validate_status_codes(codes: Option<&[u16]>, path: &str) -> Result<()> {
    for &code in codes.unwrap_or_default() {
        if !(100..=599).contains(&code) {
            return Err(ContractError::InvalidStatusCode {
                path: path.to_string(),
                code,
            });
        }
    }
    Ok(())
}

/// 校验请求参数中的消息：content 与 content_blocks 不能互相矛盾
pub fn validate_params(params: &Params, path: &str) -> Result<()> {
    for (i, message) in params.messages.iter().flatten().enumerate() {
        validate_message(message, || format!("{path}.messages[{i}]"))?;
    }
    for (i, example) in params.examples.iter().flatten().enumerate() {
        if let Some(input) = &example.input {
            validate_message(input, || format!("{path}.examples[{i}].input"))?;
        }
        if let Some(output) = &example.output {
            validate_message(output, || format!("{path}.examples[{i}].output"))?;
        }
    }
    Ok(())
}

fn validate_message(message: &Message, path: impl FnOnce() -> String) -> Result<()> {
    if message.has_contradictory_content() {
        return Err(ContractError::ContradictoryMessageContent(path()));
    }
    Ok(())
}

pub fn validate_short_config(config: &ShortConfig) -> Result<()> {
    if config.provider.trim().is_empty() {
        return Err(ContractError::config("provider 不能为空"));
    }
    if let Some(retry) = &config.retry {
        validate_retry(retry, "config.retry")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigMode;
    use crate::types::{ContentPart, Example};
    use serde_json::json;

    fn conditional_config(then: &str, default: &str) -> Config {
        serde_json::from_value(json!({
            "strategy": {
                "mode": "conditional",
                "conditions": [{"query": {"metadata.plan": {"$eq": "paid"}}, "then": then}],
                "default": default
            },
            "targets": [
                {"name": "targetA", "provider": "openai"},
                {"name": "targetB", "provider": "anthropic"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_conditional_references_existing_targets() {
        assert!(validate_config(&conditional_config("targetA", "targetB")).is_ok());
    }

    #[test]
    fn test_conditional_missing_then_target() {
        let err = validate_config(&conditional_config("targetC", "targetB")).unwrap_err();
        assert!(matches!(
            err,
            ContractError::MissingTargetReference { ref name, .. } if name == "targetC"
        ));
    }

    #[test]
    fn test_conditional_missing_default_target() {
        let err = validate_config(&conditional_config("targetA", "nope")).unwrap_err();
        assert!(matches!(
            err,
            ContractError::MissingTargetReference { ref name, .. } if name == "nope"
        ));
    }

    #[test]
    fn test_conditional_requires_conditions() {
        let config: Config = serde_json::from_value(json!({
            "strategy": {"mode": "conditional", "default": "a"},
            "targets": [{"name": "a", "provider": "openai"}]
        }))
        .unwrap();
        assert!(matches!(
            validate_config(&config).unwrap_err(),
            ContractError::EmptyConditions(_)
        ));
    }

    #[test]
    fn test_nested_conditional_checks_own_siblings() {
        let config: Config = serde_json::from_value(json!({
            "strategy": {"mode": "fallback"},
            "targets": [
                {"name": "outer", "provider": "openai"},
                {
                    "strategy": {
                        "mode": "conditional",
                        "conditions": [{"query": {"params.model": "gpt-4"}, "then": "outer"}]
                    },
                    "targets": [{"name": "inner", "provider": "anthropic"}]
                }
            ]
        }))
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "config.targets[1]: 目标引用不存在: outer"
        );
    }

    #[test]
    fn test_conflicting_and_missing_shapes() {
        let both = Config {
            mode: Some(ConfigMode::Single),
            options: vec![ProviderOptions::new("openai")],
            targets: vec![Target::leaf(ProviderOptions::new("openai"))],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&both).unwrap_err(),
            ContractError::ConflictingConfigShape
        ));

        assert!(matches!(
            validate_config(&Config::default()).unwrap_err(),
            ContractError::MissingProviders
        ));

        let no_mode = Config {
            options: vec![ProviderOptions::new("openai")],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&no_mode).unwrap_err(),
            ContractError::MissingMode
        ));
    }

    #[test]
    fn test_loadbalance_weights_accepted() {
        let config: Config = serde_json::from_value(json!({
            "mode": "loadbalance",
            "options": [
                {"provider": "openai", "weight": 1},
                {"provider": "anthropic", "weight": 3}
            ]
        }))
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut options = ProviderOptions::new("openai");
        options.weight = Some(-1.0);
        let config = Config {
            mode: Some(ConfigMode::Loadbalance),
            options: vec![options],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config).unwrap_err(),
            ContractError::InvalidWeight { .. }
        ));
    }

    #[test]
    fn test_invalid_status_code_rejected() {
        let config: Config = serde_json::from_value(json!({
            "mode": "single",
            "options": [{"provider": "openai", "retry": {"attempts": 2, "onStatusCodes": [429, 42]}}]
        }))
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ContractError::InvalidStatusCode { code: 42, .. }));
    }

    #[test]
    fn test_contradictory_message_in_override_params() {
        let mut message = Message::user("hello");
        message.content_blocks = Some(vec![ContentPart::text("different")]);
        let mut options = ProviderOptions::new("openai");
        options.override_params = Some(Box::new(Params {
            messages: Some(vec![message]),
            ..Default::default()
        }));

        let err = validate_options(&options, "config.options[0]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "config.options[0].overrideParams.messages[0]: content 与 content_blocks 内容矛盾"
        );
    }

    #[test]
    fn test_conditional_duplicate_sibling_names_rejected() {
        let config: Config = serde_json::from_value(json!({
            "strategy": {
                "mode": "conditional",
                "conditions": [{"query": {"metadata.plan": "paid"}, "then": "t"}]
            },
            "targets": [
                {"name": "t", "provider": "openai"},
                {"name": "t", "provider": "anthropic"}
            ]
        }))
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ContractError::DuplicateTargetName { ref name, .. } if name == "t"
        ));
    }

    #[test]
    fn test_options_form_strategy_must_agree_with_mode() {
        let mismatched: Config = serde_json::from_value(json!({
            "mode": "fallback",
            "strategy": {"mode": "conditional", "conditions": []},
            "options": [{"provider": "openai"}]
        }))
        .unwrap();
        assert!(matches!(
            validate_config(&mismatched).unwrap_err(),
            ContractError::StrategyModeMismatch { .. }
        ));

        let agreeing: Config = serde_json::from_value(json!({
            "mode": "fallback",
            "strategy": {"mode": "fallback", "onStatusCodes": [429]},
            "options": [{"provider": "openai"}, {"provider": "anthropic"}]
        }))
        .unwrap();
        assert!(validate_config(&agreeing).is_ok());

        let bad_codes: Config = serde_json::from_value(json!({
            "mode": "fallback",
            "strategy": {"mode": "fallback", "onStatusCodes": [1000]},
            "options": [{"provider": "openai"}]
        }))
        .unwrap();
        assert!(matches!(
            validate_config(&bad_codes).unwrap_err(),
            ContractError::InvalidStatusCode { code: 1000, .. }
        ));
    }

    #[test]
    fn test_contradictory_example_reports_example_path() {
        let mut input = Message::user("question");
        input.content_blocks = Some(vec![ContentPart::text("other question")]);
        let params = Params {
            messages: Some(vec![Message::user("hi")]),
            examples: Some(vec![Example {
                input: Some(input),
                output: Some(Message::assistant("answer")),
            }]),
            ..Default::default()
        };
        let err = validate_params(&params, "params").unwrap_err();
        assert_eq!(
            err.to_string(),
            "params.examples[0].input: content 与 content_blocks 内容矛盾"
        );
    }

    #[test]
    fn test_short_config_requires_provider() {
        assert!(validate_short_config(&ShortConfig::new("openai")).is_ok());
        assert!(validate_short_config(&ShortConfig::new("  ")).is_err());
    }
}
