pub mod cache;
pub mod keys;
pub mod options;
pub mod retry;
pub mod strategy;
pub mod target;

pub use cache::CacheSettings;
pub use options::{
    AnthropicOptions, AwsOptions, AzureInferenceOptions, AzureOptions, HookObject,
    OpenAiOptions, ProviderOptions, SagemakerOptions, StabilityOptions, VertexOptions,
};
pub use retry::{RetrySettings, DEFAULT_RETRY_STATUS_CODES, MAX_RETRY_ATTEMPTS};
pub use strategy::{Condition, ConfigMode, Strategy, StrategyMode};
pub use target::{InheritedSettings, LeafTarget, ProviderNode, StrategyNode, Target};

use crate::error::ContractError;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("环境变量正则表达式无效")
});

/// 请求配置（完整形式）
///
/// `options`（旧版扁平列表，配合 `mode`）与 `targets`（递归目标树，配合 `strategy`）
/// 同一请求中只能使用其一。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ConfigMode>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<ProviderOptions>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_host: Option<String>,
}

impl Config {
    /// 从 YAML 或 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_value(load_document(path)?)
    }

    /// 解析 YAML 文本（JSON 是其子集，同样适用）
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let content = replace_env_vars(content)?;
        let value: Value = serde_yaml::from_str(&content)?;
        Self::from_value(value)
    }

    /// 解析 JSON 文本，例如请求头中携带的配置
    pub fn from_json_str(content: &str) -> Result<Self> {
        let content = replace_env_vars(content)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value)
    }

    /// 规范化键名、反序列化并校验
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Config = serde_json::from_value(keys::normalize_keys(value))?;
        crate::validate::validate_config(&config)?;
        Ok(config)
    }

    /// 是否使用递归 targets 形式
    pub fn uses_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// 配置级默认值，作为目标树根节点的选项
    fn root_options(&self) -> ProviderOptions {
        ProviderOptions {
            retry: self.retry.clone(),
            cache: self.cache.clone(),
            custom_host: self.custom_host.clone(),
            ..Default::default()
        }
    }

    /// 把 options / targets 两种形式统一为一棵目标树
    pub fn provider_tree(&self) -> Result<ProviderNode> {
        let root = self.root_options();
        let (strategy, children) = match (self.options.is_empty(), self.targets.is_empty()) {
            (false, false) => return Err(ContractError::ConflictingConfigShape),
            (true, true) => return Err(ContractError::MissingProviders),
            (true, false) => {
                let strategy = self
                    .strategy
                    .clone()
                    .ok_or_else(|| ContractError::MissingStrategy("config".to_string()))?;
                let children = target::build_children(&self.targets, "targets", "config", &root)?;
                (strategy, children)
            }
            (false, true) => {
                let mode = self.mode.ok_or(ContractError::MissingMode)?;
                let strategy_mode = mode
                    .strategy_mode()
                    .ok_or_else(|| ContractError::UnsupportedConfigMode(mode.to_string()))?;
                let mut strategy = self
                    .strategy
                    .clone()
                    .unwrap_or_else(|| Strategy::new(strategy_mode));
                strategy.mode = strategy_mode;
                let targets: Vec<Target> = self.options.iter().cloned().map(Target::leaf).collect();
                let children = target::build_children(&targets, "options", "config", &root)?;
                (strategy, children)
            }
        };

        debug!("配置解析为 {} 策略，{} 个子目标", strategy.mode, children.len());
        Ok(ProviderNode::Strategy(StrategyNode {
            name: None,
            path: "config".to_string(),
            original_index: 0,
            strategy,
            options: root,
            children,
        }))
    }
}

/// 简化配置：单个 provider，没有多目标路由
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortConfig {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers_ai_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_auth_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_managed_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_entra_tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_project_id: Option<String>,
}

impl ShortConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// 转换为完整的 provider 选项
    pub fn to_options(&self) -> ProviderOptions {
        ProviderOptions {
            provider: Some(self.provider.clone()),
            virtual_key: self.virtual_key.clone(),
            api_key: self.api_key.clone(),
            cache: self.cache.clone(),
            retry: self.retry.clone(),
            custom_host: self.custom_host.clone(),
            workers_ai_account_id: self.workers_ai_account_id.clone(),
            azure: AzureOptions {
                resource_name: self.resource_name.clone(),
                deployment_id: self.deployment_id.clone(),
                api_version: self.api_version.clone(),
                azure_auth_mode: self.azure_auth_mode.clone(),
                azure_managed_client_id: self.azure_managed_client_id.clone(),
                azure_entra_client_id: self.azure_entra_client_id.clone(),
                azure_entra_client_secret: self.azure_entra_client_secret.clone(),
                azure_entra_tenant_id: self.azure_entra_tenant_id.clone(),
                azure_model_name: self.azure_model_name.clone(),
                ..Default::default()
            },
            vertex: VertexOptions {
                vertex_region: self.vertex_region.clone(),
                vertex_project_id: self.vertex_project_id.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// 单个叶子组成的目标树
    pub fn provider_tree(&self) -> ProviderNode {
        ProviderNode::Leaf(LeafTarget {
            name: None,
            path: "config".to_string(),
            original_index: 0,
            options: self.to_options(),
        })
    }
}

/// 显式的 `null` 与缺省同样视为空列表
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 读取 YAML / JSON 文件并替换环境变量，返回未解析的文档
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    info!("加载配置文件: {}", path.display());
    let content = replace_env_vars(&content)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// 替换配置中的环境变量 ${VAR}
fn replace_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(content) {
        let var_name = &cap[1];
        let var_value = std::env::var(var_name)
            .map_err(|_| ContractError::config(format!("环境变量未找到: {}", var_name)))?;
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}
