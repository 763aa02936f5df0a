//! 请求体：`{config, params}`，config 为完整形式或简化形式

use crate::config::{keys, Config, ProviderNode, ShortConfig};
use crate::error::ContractError;
use crate::types::Params;
use crate::validate;
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// 出现任一键即视为完整配置
const FULL_CONFIG_KEYS: [&str; 4] = ["options", "targets", "mode", "strategy"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullRequestBody {
    pub config: Config,
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortRequestBody {
    pub config: ShortConfig,
    pub params: Params,
}

/// 网关请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Full(FullRequestBody),
    Short(ShortRequestBody),
}

impl<'de> Deserialize<'de> for RequestBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RequestBody::decode(value).map_err(serde::de::Error::custom)
    }
}

impl RequestBody {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(content)?)
    }

    /// 解析并校验
    pub fn from_value(value: Value) -> Result<Self> {
        let body = Self::decode(value)?;
        body.validate()?;
        Ok(body)
    }

    /// 只做结构解析，不校验路由约束
    fn decode(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(ContractError::config("请求体必须是 JSON 对象"));
        };
        let config = object
            .remove("config")
            .ok_or_else(|| ContractError::config("请求体缺少 config"))?;
        let params: Params = match object.remove("params") {
            Some(params) => serde_json::from_value(params)?,
            None => return Err(ContractError::config("请求体缺少 params")),
        };

        let config = keys::normalize_keys(config);
        if is_full_config(&config) {
            debug!("请求使用完整配置");
            Ok(RequestBody::Full(FullRequestBody {
                config: serde_json::from_value(config)?,
                params,
            }))
        } else {
            debug!("请求使用简化配置");
            Ok(RequestBody::Short(ShortRequestBody {
                config: serde_json::from_value(config)?,
                params,
            }))
        }
    }

    pub fn params(&self) -> &Params {
        match self {
            RequestBody::Full(body) => &body.params,
            RequestBody::Short(body) => &body.params,
        }
    }

    pub fn is_short(&self) -> bool {
        matches!(self, RequestBody::Short(_))
    }

    /// 校验配置与参数
    pub fn validate(&self) -> Result<()> {
        match self {
            RequestBody::Full(body) => validate::validate_config(&body.config)?,
            RequestBody::Short(body) => validate::validate_short_config(&body.config)?,
        }
        validate::validate_params(self.params(), "params")
    }

    pub fn provider_tree(&self) -> Result<ProviderNode> {
        match self {
            RequestBody::Full(body) => body.config.provider_tree(),
            RequestBody::Short(body) => Ok(body.config.provider_tree()),
        }
    }

    /// conditional 策略求值使用的上下文：`{metadata, params}`
    pub fn route_context(&self, metadata: &BTreeMap<String, String>) -> Result<Value> {
        let metadata: Map<String, Value> = metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Ok(json!({
            "metadata": metadata,
            "params": serde_json::to_value(self.params())?,
        }))
    }
}

fn is_full_config(config: &Value) -> bool {
    config
        .as_object()
        .is_some_and(|map| FULL_CONFIG_KEYS.iter().any(|key| map.contains_key(*key)))
}
