//! conditional 策略的条件求值
//!
//! 查询是 Mongo 风格的谓词：键为点分路径（`metadata.user_plan`），值为字面量
//! （等价于 `$eq`）或操作符对象；`$and` / `$or` 组合子查询。

use crate::config::Strategy;
use crate::error::ContractError;
use crate::Result;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::debug;

/// 按点分路径在上下文中取值
pub fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(context, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// 判断查询是否命中上下文
pub fn evaluate(query: &Map<String, Value>, context: &Value) -> Result<bool> {
    for (key, expected) in query {
        let matched = match key.as_str() {
            "$and" => all_match(expected, context)?,
            "$or" => any_match(expected, context)?,
            op if op.starts_with('$') => {
                return Err(ContractError::invalid_query(format!("未知的顶层操作符: {op}")))
            }
            path => matches_field(lookup(context, path), expected)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_queries(value: &Value) -> Result<impl Iterator<Item = &Map<String, Value>>> {
    let items = value
        .as_array()
        .ok_or_else(|| ContractError::invalid_query("$and/$or 需要数组"))?;
    if items.iter().any(|q| !q.is_object()) {
        return Err(ContractError::invalid_query("$and/$or 的元素必须是对象"));
    }
    Ok(items.iter().filter_map(Value::as_object))
}

fn all_match(value: &Value, context: &Value) -> Result<bool> {
    for query in sub_queries(value)? {
        if !evaluate(query, context)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_match(value: &Value, context: &Value) -> Result<bool> {
    for query in sub_queries(value)? {
        if evaluate(query, context)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_field(actual: Option<&Value>, expected: &Value) -> Result<bool> {
    let Some(operators) = expected.as_object().filter(|_| is_operator_object(expected)) else {
        return Ok(actual == Some(expected));
    };

    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => actual == Some(operand),
            "$ne" => actual != Some(operand),
            "$gt" => compare(actual, operand) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(actual, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(actual, operand) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(actual, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "$in" => in_list(actual, operand)?,
            "$nin" => !in_list(actual, operand)?,
            "$regex" => regex_match(actual, operand)?,
            "$exists" => {
                let wanted = operand
                    .as_bool()
                    .ok_or_else(|| ContractError::invalid_query("$exists 需要布尔值"))?;
                actual.is_some() == wanted
            }
            other => return Err(ContractError::invalid_query(format!("未知的操作符: {other}"))),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare(actual: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (actual?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn in_list(actual: Option<&Value>, operand: &Value) -> Result<bool> {
    let list = operand
        .as_array()
        .ok_or_else(|| ContractError::invalid_query("$in/$nin 需要数组"))?;
    Ok(actual.is_some_and(|value| list.contains(value)))
}

fn regex_match(actual: Option<&Value>, operand: &Value) -> Result<bool> {
    let pattern = operand
        .as_str()
        .ok_or_else(|| ContractError::invalid_query("$regex 需要字符串"))?;
    let re = Regex::new(pattern)
        .map_err(|e| ContractError::invalid_query(format!("无效的正则表达式 {pattern}: {e}")))?;
    Ok(actual
        .and_then(Value::as_str)
        .is_some_and(|value| re.is_match(value)))
}

/// 返回第一个命中条件的目标名，没有命中时返回 default
pub fn select_condition<'a>(strategy: &'a Strategy, context: &Value, path: &str) -> Result<&'a str> {
    for (i, condition) in strategy.conditions.iter().enumerate() {
        if evaluate(&condition.query, context)? {
            debug!("{}: 条件 {} 命中，路由到 {}", path, i, condition.then);
            return Ok(condition.then.as_str());
        }
    }
    match strategy.default.as_deref() {
        Some(name) => {
            debug!("{}: 没有条件命中，使用默认目标 {}", path, name);
            Ok(name)
        }
        None => Err(ContractError::NoConditionMatched(path.to_string())),
    }
}

/// 把 `overlay` 递归合并进 `base`，对象逐键合并，其余值直接覆盖
pub fn merge_context(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_context(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyMode;
    use serde_json::json;

    fn query(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn context() -> Value {
        json!({
            "metadata": {"user_plan": "paid", "tier": 3, "region": "eu-west"},
            "params": {"model": "gpt-4o", "max_tokens": 512}
        })
    }

    #[test]
    fn test_lookup() {
        let ctx = context();
        assert_eq!(lookup(&ctx, "metadata.user_plan"), Some(&json!("paid")));
        assert_eq!(lookup(&ctx, "params.max_tokens"), Some(&json!(512)));
        assert_eq!(lookup(&ctx, "metadata.missing"), None);
        assert_eq!(lookup(&json!({"a": [1, 2]}), "a.1"), Some(&json!(2)));
    }

    #[test]
    fn test_literal_and_eq() {
        let ctx = context();
        assert!(evaluate(&query(json!({"metadata.user_plan": "paid"})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.user_plan": {"$eq": "paid"}})), &ctx).unwrap());
        assert!(!evaluate(&query(json!({"metadata.user_plan": {"$ne": "paid"}})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.absent": {"$ne": "x"}})), &ctx).unwrap());
    }

    #[test]
    fn test_comparisons() {
        let ctx = context();
        assert!(evaluate(&query(json!({"metadata.tier": {"$gt": 2, "$lte": 3}})), &ctx).unwrap());
        assert!(!evaluate(&query(json!({"metadata.tier": {"$lt": 3}})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"params.max_tokens": {"$gte": 512}})), &ctx).unwrap());
        assert!(!evaluate(&query(json!({"metadata.user_plan": {"$gt": 1}})), &ctx).unwrap());
    }

    #[test]
    fn test_in_nin_regex_exists() {
        let ctx = context();
        assert!(evaluate(
            &query(json!({"params.model": {"$in": ["gpt-4o", "gpt-4"]}})),
            &ctx
        )
        .unwrap());
        assert!(evaluate(&query(json!({"metadata.user_plan": {"$nin": ["free"]}})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.region": {"$regex": "^eu-"}})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.tier": {"$exists": true}})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.nope": {"$exists": false}})), &ctx).unwrap());
    }

    #[test]
    fn test_and_or() {
        let ctx = context();
        let q = query(json!({
            "$or": [
                {"metadata.user_plan": "free"},
                {"$and": [{"metadata.tier": {"$gte": 3}}, {"params.model": "gpt-4o"}]}
            ]
        }));
        assert!(evaluate(&q, &ctx).unwrap());

        let q = query(json!({"$and": [{"metadata.user_plan": "paid"}, {"metadata.tier": 1}]}));
        assert!(!evaluate(&q, &ctx).unwrap());
    }

    #[test]
    fn test_invalid_queries() {
        let ctx = context();
        assert!(evaluate(&query(json!({"metadata.tier": {"$near": 1}})), &ctx).is_err());
        assert!(evaluate(&query(json!({"$xor": []})), &ctx).is_err());
        assert!(evaluate(&query(json!({"$or": {"a": 1}})), &ctx).is_err());
        assert!(evaluate(&query(json!({"metadata.region": {"$regex": "("}})), &ctx).is_err());
    }

    #[test]
    fn test_select_condition() {
        let strategy: Strategy = serde_json::from_value(json!({
            "mode": "conditional",
            "conditions": [
                {"query": {"metadata.user_plan": "free"}, "then": "cheap"},
                {"query": {"metadata.user_plan": "paid"}, "then": "premium"}
            ],
            "default": "cheap"
        }))
        .unwrap();
        assert_eq!(strategy.mode, StrategyMode::Conditional);
        assert_eq!(select_condition(&strategy, &context(), "config").unwrap(), "premium");

        let other = json!({"metadata": {"user_plan": "trial"}});
        assert_eq!(select_condition(&strategy, &other, "config").unwrap(), "cheap");

        let mut no_default = strategy.clone();
        no_default.default = None;
        assert!(matches!(
            select_condition(&no_default, &other, "config").unwrap_err(),
            ContractError::NoConditionMatched(_)
        ));
    }

    #[test]
    fn test_merge_context_keeps_typed_values() {
        let mut ctx = json!({"metadata": {"user_plan": "free"}, "params": {"model": "gpt-4o"}});
        merge_context(
            &mut ctx,
            json!({"metadata": {"beta": true, "tier": 5}, "params": {"model": "gpt-4o-mini"}}),
        );
        assert_eq!(
            ctx,
            json!({
                "metadata": {"user_plan": "free", "beta": true, "tier": 5},
                "params": {"model": "gpt-4o-mini"}
            })
        );

        assert!(evaluate(&query(json!({"metadata.beta": true})), &ctx).unwrap());
        assert!(evaluate(&query(json!({"metadata.tier": {"$gt": 3}})), &ctx).unwrap());
    }
}
