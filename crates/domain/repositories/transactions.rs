use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::transactions::TransactionEntity,
    value_objects::{pagination::Page, transactions::SettlementTotals},
};

/// Read side of the ledger. Rows are only ever written by a
/// `SettlementRepository`.
#[async_trait]
#[automock]
pub trait TransactionRepository {
    async fn list(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<TransactionEntity>>;

    async fn aggregate_totals(&self) -> Result<SettlementTotals>;
}
