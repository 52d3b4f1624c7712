//! 路由指标收集模块
//!
//! 基于每次 emit 的结果 (`Delivery` / 失败) 收集和统计路由指标。

use std::collections::BTreeMap;

use contracts::{Delivery, Identity};
use metrics::{counter, gauge};

/// 指标中使用的 identity 标签
fn identity_label(identity: &Identity) -> String {
    identity.to_string()
}

/// 从 Delivery 记录指标
///
/// 每次 emit 成功返回时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_delivery;
///
/// let delivery = router.emit(record).await?;
/// record_delivery(&delivery);
/// ```
pub fn record_delivery(delivery: &Delivery) {
    match delivery {
        Delivery::Written(identity) => {
            counter!("keyroute_records_written_total", "identity" => identity_label(identity))
                .increment(1);
        }
        Delivery::BelowThreshold => {
            counter!("keyroute_records_below_threshold_total").increment(1);
        }
        Delivery::Rejected => {
            counter!("keyroute_records_rejected_total").increment(1);
        }
    }
}

/// 记录 emit 失败
pub fn record_failure(identity: &Identity, kind: &str) {
    counter!(
        "keyroute_emit_failures_total",
        "identity" => identity_label(identity),
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录已创建的 keyed destination 数量
pub fn record_destination_count(count: usize) {
    gauge!("keyroute_keyed_destinations").set(count as f64);
}

/// 路由指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RoutingStatsAggregator {
    /// 处理的记录总数
    pub total: u64,

    /// 低于阈值被丢弃的记录数
    pub below_threshold: u64,

    /// 被过滤器拒绝的记录数
    pub rejected: u64,

    /// 失败数
    pub failed: u64,

    /// 各 destination 写入数
    pub written: BTreeMap<String, u64>,

    /// 各 destination 失败数
    pub failures: BTreeMap<String, u64>,
}

impl RoutingStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功的 emit
    pub fn record(&mut self, delivery: &Delivery) {
        self.total += 1;
        match delivery {
            Delivery::Written(identity) => {
                *self.written.entry(identity_label(identity)).or_insert(0) += 1;
            }
            Delivery::BelowThreshold => self.below_threshold += 1,
            Delivery::Rejected => self.rejected += 1,
        }
    }

    /// 记录一次失败的 emit
    pub fn record_failure(&mut self, identity: &Identity) {
        self.total += 1;
        self.failed += 1;
        *self.failures.entry(identity_label(identity)).or_insert(0) += 1;
    }

    /// 写入总数
    pub fn total_written(&self) -> u64 {
        self.written.values().sum()
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RoutingSummary {
        RoutingSummary {
            total: self.total,
            written: self.total_written(),
            below_threshold: self.below_threshold,
            rejected: self.rejected,
            failed: self.failed,
            per_destination: self.written.clone(),
            failures: self.failures.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 路由摘要
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RoutingSummary {
    pub total: u64,
    pub written: u64,
    pub below_threshold: u64,
    pub rejected: u64,
    pub failed: u64,
    pub per_destination: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, u64>,
}

impl std::fmt::Display for RoutingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Routing Summary ===")?;
        writeln!(f, "Records: {}", self.total)?;
        writeln!(f, "Written: {}", self.written)?;
        writeln!(f, "Below threshold: {}", self.below_threshold)?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        writeln!(f, "Failed: {}", self.failed)?;

        if !self.per_destination.is_empty() {
            writeln!(f, "Per destination:")?;
            for (identity, count) in &self.per_destination {
                writeln!(f, "  {}: {}", identity, count)?;
            }
        }

        if !self.failures.is_empty() {
            writeln!(f, "Failures:")?;
            for (identity, count) in &self.failures {
                writeln!(f, "  {}: {}", identity, count)?;
            }
        }

        Ok(())
    }
}
