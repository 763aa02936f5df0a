pub mod conditional;

use crate::config::{LeafTarget, ProviderNode, StrategyMode, StrategyNode};
use crate::error::ContractError;
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use tracing::{debug, warn};

/// 按权重随机选择下标，选中概率为 weight / total
///
/// 权重为 0 的项永远不会被选中；全部为 0 时返回错误。
pub fn weighted_index<R: Rng>(weights: &[f64], rng: &mut R) -> Result<usize> {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if weights.is_empty() || total <= 0.0 || !total.is_finite() {
        return Err(ContractError::NoSelectableTarget(format!(
            "权重总和为 {total}"
        )));
    }

    let mut point = rng.gen::<f64>() * total;
    let mut last_positive = 0;
    for (i, weight) in weights.iter().enumerate() {
        let weight = weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        if point < weight {
            return Ok(i);
        }
        point -= weight;
        last_positive = i;
    }
    // 浮点误差落在末尾时取最后一个有效项
    Ok(last_positive)
}

/// 把目标树展开为有序的尝试列表
///
/// - single：第一个子节点
/// - loadbalance：按权重选一个子节点
/// - fallback：所有子节点按顺序
/// - conditional：条件命中的子节点
#[derive(Debug)]
pub struct RoutePlanner<R: Rng> {
    rng: R,
}

impl RoutePlanner<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// 固定种子，结果可复现
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RoutePlanner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// 生成尝试顺序；`context` 供 conditional 策略求值
    pub fn plan<'a>(&mut self, root: &'a ProviderNode, context: &Value) -> Result<Vec<&'a LeafTarget>> {
        let mut attempts = Vec::new();
        self.expand(root, context, &mut attempts)?;
        debug!(
            "路由计划: {}",
            attempts
                .iter()
                .map(|leaf| leaf.path.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(attempts)
    }

    /// 只取计划中的第一个目标
    pub fn pick<'a>(&mut self, root: &'a ProviderNode, context: &Value) -> Result<&'a LeafTarget> {
        self.plan(root, context)?
            .into_iter()
            .next()
            .ok_or_else(|| ContractError::NoSelectableTarget(root.path().to_string()))
    }

    fn expand<'a>(
        &mut self,
        node: &'a ProviderNode,
        context: &Value,
        out: &mut Vec<&'a LeafTarget>,
    ) -> Result<()> {
        let group = match node {
            ProviderNode::Leaf(leaf) => {
                out.push(leaf);
                return Ok(());
            }
            ProviderNode::Strategy(group) => group,
        };

        match group.strategy.mode {
            StrategyMode::Single => {
                let first = group
                    .children
                    .first()
                    .ok_or_else(|| ContractError::EmptyStrategyTargets(group.path.clone()))?;
                self.expand(first, context, out)
            }
            StrategyMode::Loadbalance => {
                let weights: Vec<f64> = group.children.iter().map(ProviderNode::weight).collect();
                let index = weighted_index(&weights, &mut self.rng)
                    .map_err(|_| ContractError::NoSelectableTarget(group.path.clone()))?;
                debug!("{}: 负载均衡选中子目标 {}", group.path, index);
                self.expand(&group.children[index], context, out)
            }
            StrategyMode::Fallback => self.expand_fallback(group, context, out),
            StrategyMode::Conditional => {
                let name = conditional::select_condition(&group.strategy, context, &group.path)?;
                let child = group
                    .child_named(name)
                    .ok_or_else(|| ContractError::missing_target(&group.path, name))?;
                self.expand(child, context, out)
            }
        }
    }

    /// 子节点展开失败时跳过，全部失败才返回最后一个错误
    fn expand_fallback<'a>(
        &mut self,
        group: &'a StrategyNode,
        context: &Value,
        out: &mut Vec<&'a LeafTarget>,
    ) -> Result<()> {
        let mut last_error = None;
        let before = out.len();
        for child in &group.children {
            if let Err(e) = self.expand(child, context, out) {
                warn!("{}: 跳过无法路由的子目标 {}: {}", group.path, child.path(), e);
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) if out.len() == before => Err(e),
            _ => Ok(()),
        }
    }
}
