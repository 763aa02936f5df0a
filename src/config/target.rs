use super::cache::CacheSettings;
use super::options::{HookObject, ProviderOptions};
use super::retry::RetrySettings;
use super::strategy::Strategy;
use crate::error::ContractError;
use crate::types::Params;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 路由目标（线上格式）
///
/// 在 [`ProviderOptions`] 的基础上增加名称、可选的嵌套策略和子目标，可任意深度递归。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(flatten)]
    pub options: ProviderOptions,
    #[serde(
        default,
        deserialize_with = "super::null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub targets: Vec<Target>,
    /// 重新排序前的原始位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_index: Option<usize>,
}

impl Target {
    pub fn leaf(options: ProviderOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>, options: ProviderOptions) -> Self {
        Self {
            name: Some(name.into()),
            options,
            ..Default::default()
        }
    }

    pub fn group(strategy: Strategy, targets: Vec<Target>) -> Self {
        Self {
            strategy: Some(strategy),
            targets,
            ..Default::default()
        }
    }

    /// 是否是嵌套策略节点
    pub fn is_group(&self) -> bool {
        self.strategy.is_some() || !self.targets.is_empty()
    }
}

/// 从外层作用域向下继承的设置
///
/// 优先级：目标自身 > 外层目标 > 配置级默认值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InheritedSettings {
    pub retry: Option<RetrySettings>,
    pub cache: Option<CacheSettings>,
    pub override_params: Option<Box<Params>>,
    pub custom_host: Option<String>,
    pub request_timeout: Option<u64>,
    pub strict_open_ai_compliance: Option<bool>,
    pub default_input_guardrails: Vec<HookObject>,
    pub default_output_guardrails: Vec<HookObject>,
}

impl InheritedSettings {
    /// 取已解析选项中的可继承部分
    pub fn from_options(options: &ProviderOptions) -> Self {
        Self {
            retry: options.retry.clone(),
            cache: options.cache.clone(),
            override_params: options.override_params.clone(),
            custom_host: options.custom_host.clone(),
            request_timeout: options.request_timeout,
            strict_open_ai_compliance: options.strict_open_ai_compliance,
            default_input_guardrails: options.default_input_guardrails.clone(),
            default_output_guardrails: options.default_output_guardrails.clone(),
        }
    }

    /// 把继承的设置填入未设置的字段；overrideParams 合并，子目标字段优先
    pub fn apply_to(&self, options: &mut ProviderOptions) -> Result<()> {
        if options.retry.is_none() {
            options.retry = self.retry.clone();
        }
        if options.cache.is_none() {
            options.cache = self.cache.clone();
        }
        if options.custom_host.is_none() {
            options.custom_host = self.custom_host.clone();
        }
        if options.request_timeout.is_none() {
            options.request_timeout = self.request_timeout;
        }
        if options.strict_open_ai_compliance.is_none() {
            options.strict_open_ai_compliance = self.strict_open_ai_compliance;
        }
        if options.default_input_guardrails.is_empty() {
            options.default_input_guardrails = self.default_input_guardrails.clone();
        }
        if options.default_output_guardrails.is_empty() {
            options.default_output_guardrails = self.default_output_guardrails.clone();
        }
        options.override_params = match (&self.override_params, options.override_params.take()) {
            (Some(parent), Some(child)) => Some(Box::new(parent.merged_with(&child)?)),
            (Some(parent), None) => Some(parent.clone()),
            (None, child) => child,
        };
        Ok(())
    }
}

/// 已解析的叶子目标：一个具体的上游 provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 在配置中的位置，例如 `config.targets[1].targets[0]`
    pub path: String,
    pub original_index: usize,
    #[serde(flatten)]
    pub options: ProviderOptions,
}

/// 已解析的策略节点：对子节点应用同一策略
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
    pub original_index: usize,
    pub strategy: Strategy,
    /// 节点自身的选项（权重与可继承设置）
    #[serde(flatten)]
    pub options: ProviderOptions,
    pub children: Vec<ProviderNode>,
}

impl StrategyNode {
    /// 按名称查找直接子节点
    pub fn child_named(&self, name: &str) -> Option<&ProviderNode> {
        self.children.iter().find(|c| c.name() == Some(name))
    }
}

/// 统一的递归目标树：叶子或策略节点
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderNode {
    Leaf(LeafTarget),
    Strategy(StrategyNode),
}

impl ProviderNode {
    /// 从线上目标构建，继承 `inherited` 中的设置
    pub fn from_target(
        target: &Target,
        inherited: &InheritedSettings,
        path: &str,
        index: usize,
    ) -> Result<Self> {
        let mut options = target.options.clone();
        inherited.apply_to(&mut options)?;
        let original_index = target.original_index.unwrap_or(index);

        if !target.is_group() {
            debug!("解析叶子目标 {}: {}", path, options.describe());
            return Ok(ProviderNode::Leaf(LeafTarget {
                name: target.name.clone(),
                path: path.to_string(),
                original_index,
                options,
            }));
        }

        let strategy = target
            .strategy
            .clone()
            .ok_or_else(|| ContractError::MissingStrategy(path.to_string()))?;
        let children = build_children(&target.targets, "targets", path, &options)?;
        debug!(
            "解析策略节点 {}: mode={}, children={}",
            path,
            strategy.mode,
            children.len()
        );

        Ok(ProviderNode::Strategy(StrategyNode {
            name: target.name.clone(),
            path: path.to_string(),
            original_index,
            strategy,
            options,
            children,
        }))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ProviderNode::Leaf(leaf) => leaf.name.as_deref(),
            ProviderNode::Strategy(node) => node.name.as_deref(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ProviderNode::Leaf(leaf) => &leaf.path,
            ProviderNode::Strategy(node) => &node.path,
        }
    }

    pub fn options(&self) -> &ProviderOptions {
        match self {
            ProviderNode::Leaf(leaf) => &leaf.options,
            ProviderNode::Strategy(node) => &node.options,
        }
    }

    pub fn weight(&self) -> f64 {
        self.options().effective_weight()
    }

    /// 按深度优先顺序列出所有叶子
    pub fn leaves(&self) -> Vec<&LeafTarget> {
        match self {
            ProviderNode::Leaf(leaf) => vec![leaf],
            ProviderNode::Strategy(node) => {
                node.children.iter().flat_map(ProviderNode::leaves).collect()
            }
        }
    }

    /// 树的深度，单个叶子为 1
    pub fn depth(&self) -> usize {
        match self {
            ProviderNode::Leaf(_) => 1,
            ProviderNode::Strategy(node) => {
                1 + node.children.iter().map(ProviderNode::depth).max().unwrap_or(0)
            }
        }
    }
}

/// 构建子节点；`parent_options` 是父节点已解析的选项
pub(crate) fn build_children(
    targets: &[Target],
    key: &str,
    parent_path: &str,
    parent_options: &ProviderOptions,
) -> Result<Vec<ProviderNode>> {
    if targets.is_empty() {
        return Err(ContractError::EmptyStrategyTargets(parent_path.to_string()));
    }
    let inherited = InheritedSettings::from_options(parent_options);
    targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let path = format!("{parent_path}.{key}[{i}]");
            ProviderNode::from_target(target, &inherited, &path, i)
        })
        .collect()
}
