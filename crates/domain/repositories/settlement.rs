use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::settlement::{SettlementOutcome, SettlementPlan};

#[async_trait]
#[automock]
pub trait SettlementRepository {
    /// Applies every write of `plan` in one database transaction. Outcomes
    /// other than `Applied` leave the store untouched.
    async fn apply(&self, plan: SettlementPlan) -> Result<SettlementOutcome>;
}
