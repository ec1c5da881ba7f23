//! Monetization gate
//!
//! Per-tier monthly quotas per capability. The usage store does check and
//! increment under one lock, so concurrent requests can never push a count
//! past its limit.

use crate::models::{Capability, Tier, UsageRecord};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Monthly request allowance for a tier and capability
pub fn tier_limit(tier: Tier, capability: Capability) -> u32 {
    match (capability, tier) {
        (Capability::Translate, Tier::Free) => 10,
        (Capability::Translate, Tier::Basic) => 100,
        (Capability::Translate, Tier::Premium) => 500,
        (Capability::Translate, Tier::Enterprise) => 2000,

        (Capability::FinancialPlan, Tier::Free) => 5,
        (Capability::FinancialPlan, Tier::Basic) => 50,
        (Capability::FinancialPlan, Tier::Premium) => 200,
        (Capability::FinancialPlan, Tier::Enterprise) => 1000,

        (Capability::RemittanceAnalyze, Tier::Free) => 3,
        (Capability::RemittanceAnalyze, Tier::Basic) => 25,
        (Capability::RemittanceAnalyze, Tier::Premium) => 100,
        (Capability::RemittanceAnalyze, Tier::Enterprise) => 500,

        (Capability::VoiceSynthesize, Tier::Free) => 5,
        (Capability::VoiceSynthesize, Tier::Basic) => 50,
        (Capability::VoiceSynthesize, Tier::Premium) => 250,
        (Capability::VoiceSynthesize, Tier::Enterprise) => 1000,
    }
}

/// Monthly price in USD
pub fn monthly_price(tier: Tier, capability: Capability) -> f64 {
    match (capability, tier) {
        (_, Tier::Free) => 0.0,

        (Capability::Translate, Tier::Basic) => 9.99,
        (Capability::Translate, Tier::Premium) => 29.99,
        (Capability::Translate, Tier::Enterprise) => 99.99,

        (Capability::FinancialPlan, Tier::Basic) => 19.99,
        (Capability::FinancialPlan, Tier::Premium) => 49.99,
        (Capability::FinancialPlan, Tier::Enterprise) => 199.99,

        (Capability::RemittanceAnalyze, Tier::Basic) => 14.99,
        (Capability::RemittanceAnalyze, Tier::Premium) => 39.99,
        (Capability::RemittanceAnalyze, Tier::Enterprise) => 149.99,

        (Capability::VoiceSynthesize, Tier::Basic) => 12.99,
        (Capability::VoiceSynthesize, Tier::Premium) => 34.99,
        (Capability::VoiceSynthesize, Tier::Enterprise) => 129.99,
    }
}

const TIERS: [Tier; 4] = [Tier::Free, Tier::Basic, Tier::Premium, Tier::Enterprise];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePlan {
    pub capability: Capability,
    pub tier: Tier,
    pub monthly_limit: u32,
    pub monthly_price: f64,
    pub description: String,
}

/// Full price list, one entry per capability and tier
pub fn pricing() -> Vec<PricePlan> {
    let mut plans = Vec::with_capacity(Capability::ALL.len() * TIERS.len());
    for capability in Capability::ALL {
        let noun = match capability {
            Capability::Translate => "translations",
            Capability::FinancialPlan => "financial plans",
            Capability::RemittanceAnalyze => "remittance analyses",
            Capability::VoiceSynthesize => "multilingual voice responses",
        };
        for tier in TIERS {
            let monthly_limit = tier_limit(tier, capability);
            plans.push(PricePlan {
                capability,
                tier,
                monthly_limit,
                monthly_price: monthly_price(tier, capability),
                description: format!("{} {} per month", monthly_limit, noun),
            });
        }
    }
    plans
}

//
// ================= Subscriptions =================
//

/// Source of a user's subscription tier
#[async_trait::async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn tier_for(&self, user_id: &str) -> Result<Tier>;
}

/// Fixed user → tier table; everyone else is on the free tier
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriptions {
    tiers: HashMap<String, Tier>,
}

impl StaticSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `alice=premium,bob=basic`. Malformed entries are skipped.
    pub fn parse(entries: &str) -> Self {
        let mut tiers = HashMap::new();
        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((user, tier)) = entry.split_once('=') else {
                warn!(entry, "Ignoring subscription entry without '='");
                continue;
            };
            match tier.parse::<Tier>() {
                Ok(tier) => {
                    tiers.insert(user.trim().to_string(), tier);
                }
                Err(e) => warn!(entry, "Ignoring subscription entry: {}", e),
            }
        }
        Self { tiers }
    }

    pub fn with_user(mut self, user_id: impl Into<String>, tier: Tier) -> Self {
        self.tiers.insert(user_id.into(), tier);
        self
    }
}

#[async_trait::async_trait]
impl SubscriptionProvider for StaticSubscriptions {
    async fn tier_for(&self, user_id: &str) -> Result<Tier> {
        Ok(self.tiers.get(user_id).copied().unwrap_or_default())
    }
}

//
// ================= Usage Store =================
//

/// Outcome of one atomic check-and-increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Counted; `used` includes this request
    Admitted { used: u32 },
    /// Nothing counted; the user is already at `used`
    AtLimit { used: u32 },
}

/// Trait for usage persistence
#[async_trait::async_trait]
pub trait UsageStore: Send + Sync {
    /// Increment the count for (user, capability) only if it is below
    /// `limit`. Check and increment must be one atomic step.
    async fn check_and_increment(
        &self,
        user_id: &str,
        capability: Capability,
        tier: Tier,
        limit: u32,
    ) -> Result<Admission>;

    async fn usage(&self, user_id: &str) -> Result<Vec<UsageRecord>>;

    /// Start a new billing period
    async fn reset_period(&self) -> Result<()>;
}

/// In-memory usage store for development
pub struct InMemoryUsageStore {
    records: Mutex<HashMap<(String, Capability), UsageRecord>>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUsageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn check_and_increment(
        &self,
        user_id: &str,
        capability: Capability,
        tier: Tier,
        limit: u32,
    ) -> Result<Admission> {
        let mut records = self.records.lock().await;
        let record = records
            .entry((user_id.to_string(), capability))
            .or_insert_with(|| UsageRecord {
                user_id: user_id.to_string(),
                capability,
                tier,
                count_this_period: 0,
            });
        record.tier = tier;

        if record.count_this_period >= limit {
            return Ok(Admission::AtLimit {
                used: record.count_this_period,
            });
        }

        record.count_this_period += 1;
        Ok(Admission::Admitted {
            used: record.count_this_period,
        })
    }

    async fn usage(&self, user_id: &str) -> Result<Vec<UsageRecord>> {
        let records = self.records.lock().await;
        let mut items: Vec<_> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|r| r.capability.as_str());
        Ok(items)
    }

    async fn reset_period(&self) -> Result<()> {
        let mut records = self.records.lock().await;
        for record in records.values_mut() {
            record.count_this_period = 0;
        }
        Ok(())
    }
}

//
// ================= Gate =================
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Allowed { tier: Tier, remaining: u32 },
    Denied { reason: String, tier: Tier, limit: u32 },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityUsage {
    pub capability: Capability,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

/// A user's standing for the current period across every capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub user_id: String,
    pub tier: Tier,
    pub capabilities: Vec<CapabilityUsage>,
}

pub struct MonetizationGate {
    subscriptions: Arc<dyn SubscriptionProvider>,
    store: Arc<dyn UsageStore>,
}

impl MonetizationGate {
    pub fn new(subscriptions: Arc<dyn SubscriptionProvider>, store: Arc<dyn UsageStore>) -> Self {
        Self {
            subscriptions,
            store,
        }
    }

    /// Admit and count one request, or deny it without counting
    pub async fn check_and_increment(
        &self,
        user_id: &str,
        capability: Capability,
    ) -> Result<GateDecision> {
        let tier = self.subscriptions.tier_for(user_id).await?;
        let limit = tier_limit(tier, capability);

        match self
            .store
            .check_and_increment(user_id, capability, tier, limit)
            .await?
        {
            Admission::Admitted { used } => {
                debug!(user_id, %capability, %tier, used, limit, "Request admitted");
                Ok(GateDecision::Allowed {
                    tier,
                    remaining: limit - used,
                })
            }
            Admission::AtLimit { used } => {
                info!(user_id, %capability, %tier, used, limit, "Quota exceeded");
                Ok(GateDecision::Denied {
                    reason: "quota_exceeded".to_string(),
                    tier,
                    limit,
                })
            }
        }
    }

    pub async fn usage(&self, user_id: &str) -> Result<UsageSummary> {
        let tier = self.subscriptions.tier_for(user_id).await?;
        let records = self.store.usage(user_id).await?;

        let capabilities = Capability::ALL
            .into_iter()
            .map(|capability| {
                let used = records
                    .iter()
                    .find(|r| r.capability == capability)
                    .map(|r| r.count_this_period)
                    .unwrap_or(0);
                let limit = tier_limit(tier, capability);
                CapabilityUsage {
                    capability,
                    used,
                    limit,
                    remaining: limit.saturating_sub(used),
                }
            })
            .collect();

        Ok(UsageSummary {
            user_id: user_id.to_string(),
            tier,
            capabilities,
        })
    }

    pub async fn reset_period(&self) -> Result<()> {
        info!("Resetting usage counts for a new period");
        self.store.reset_period().await
    }

    pub fn pricing(&self) -> Vec<PricePlan> {
        pricing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn gate(subscriptions: StaticSubscriptions) -> MonetizationGate {
        MonetizationGate::new(
            Arc::new(subscriptions),
            Arc::new(InMemoryUsageStore::new()),
        )
    }

    #[test]
    fn test_pricing_table_matches_limits() {
        let plans = pricing();
        assert_eq!(plans.len(), 16);

        let plan = plans
            .iter()
            .find(|p| p.capability == Capability::RemittanceAnalyze && p.tier == Tier::Basic)
            .unwrap();
        assert_eq!(plan.monthly_limit, 25);
        assert_eq!(plan.monthly_price, 14.99);
        assert_eq!(plan.description, "25 remittance analyses per month");

        assert!(plans
            .iter()
            .filter(|p| p.tier == Tier::Free)
            .all(|p| p.monthly_price == 0.0));
    }

    #[test]
    fn test_static_subscriptions_parse() {
        let subs = StaticSubscriptions::parse(" alice=premium, bob=BASIC ,broken, carol=gold");
        assert_eq!(subs.tiers.get("alice"), Some(&Tier::Premium));
        assert_eq!(subs.tiers.get("bob"), Some(&Tier::Basic));
        assert!(!subs.tiers.contains_key("carol"));
        assert_eq!(subs.tiers.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_is_free_tier() {
        let subs = StaticSubscriptions::new().with_user("alice", Tier::Enterprise);
        assert_eq!(assert_ok!(subs.tier_for("alice").await), Tier::Enterprise);
        assert_eq!(assert_ok!(subs.tier_for("mallory").await), Tier::Free);
    }

    #[tokio::test]
    async fn test_denial_does_not_count() {
        let gate = gate(StaticSubscriptions::new());

        for expected_remaining in (0..3).rev() {
            let decision = assert_ok!(
                gate.check_and_increment("u1", Capability::RemittanceAnalyze)
                    .await
            );
            assert_eq!(
                decision,
                GateDecision::Allowed {
                    tier: Tier::Free,
                    remaining: expected_remaining
                }
            );
        }

        for _ in 0..3 {
            let decision = assert_ok!(
                gate.check_and_increment("u1", Capability::RemittanceAnalyze)
                    .await
            );
            assert_eq!(
                decision,
                GateDecision::Denied {
                    reason: "quota_exceeded".to_string(),
                    tier: Tier::Free,
                    limit: 3
                }
            );
        }

        let summary = assert_ok!(gate.usage("u1").await);
        let remittance = summary
            .capabilities
            .iter()
            .find(|c| c.capability == Capability::RemittanceAnalyze)
            .unwrap();
        assert_eq!(remittance.used, 3);
        assert_eq!(remittance.remaining, 0);
    }

    #[tokio::test]
    async fn test_quotas_are_per_user_and_capability() {
        let gate = gate(StaticSubscriptions::new());
        for _ in 0..3 {
            assert_ok!(gate.check_and_increment("u1", Capability::RemittanceAnalyze).await);
        }

        let other_user = assert_ok!(
            gate.check_and_increment("u2", Capability::RemittanceAnalyze)
                .await
        );
        assert!(other_user.is_allowed());

        let other_capability =
            assert_ok!(gate.check_and_increment("u1", Capability::Translate).await);
        assert!(other_capability.is_allowed());
    }

    #[tokio::test]
    async fn test_reset_period_restores_quota() {
        let gate = gate(StaticSubscriptions::new());
        for _ in 0..3 {
            assert_ok!(gate.check_and_increment("u1", Capability::RemittanceAnalyze).await);
        }
        assert_ok!(gate.reset_period().await);

        let decision = assert_ok!(
            gate.check_and_increment("u1", Capability::RemittanceAnalyze)
                .await
        );
        assert_eq!(
            decision,
            GateDecision::Allowed {
                tier: Tier::Free,
                remaining: 2
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_admit_exactly_the_limit() {
        let gate = Arc::new(gate(StaticSubscriptions::new()));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    gate.check_and_increment("racer", Capability::FinancialPlan)
                        .await
                })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_allowed() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 5);

        let summary = gate.usage("racer").await.unwrap();
        let plan = summary
            .capabilities
            .iter()
            .find(|c| c.capability == Capability::FinancialPlan)
            .unwrap();
        assert_eq!(plan.used, 5);
    }
}
