use anyhow::Result;
use async_trait::async_trait;
use diesel::{
    RunQueryDsl,
    prelude::*,
    sql_query,
    sql_types::{Array, BigInt, Text},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain;
use crate::infra::db::postgres::{postgres_connection::PgPoolSquad, schema::transactions};
use domain::{
    entities::transactions::TransactionEntity,
    repositories::transactions::TransactionRepository,
    value_objects::{
        enums::transaction_types::TransactionType, pagination::Page,
        transactions::SettlementTotals,
    },
};

pub struct TransactionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TransactionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[derive(QueryableByName)]
struct TypeTotalRow {
    #[diesel(sql_type = Text)]
    transaction_type: String,
    #[diesel(sql_type = BigInt)]
    total_minor: i64,
}

fn fold_totals(rows: Vec<TypeTotalRow>) -> SettlementTotals {
    rows.into_iter()
        .fold(SettlementTotals::default(), |mut totals, row| {
            match TransactionType::from_str(&row.transaction_type) {
                Some(TransactionType::PayBooking) => totals.pay_booking += row.total_minor,
                Some(TransactionType::PayFine) => totals.pay_fine += row.total_minor,
                Some(TransactionType::PayWorker) => totals.pay_worker += row.total_minor,
                None => {}
            }
            totals
        })
}

#[async_trait]
impl TransactionRepository for TransactionPostgres {
    async fn list(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<TransactionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = transactions::table.into_boxed();
        if let Some(user_id) = user_id {
            query = query.filter(transactions::user_id.eq(user_id));
        }

        let results = query
            .order(transactions::occurred_at.desc())
            .limit(page.limit)
            .offset(page.offset())
            .select(TransactionEntity::as_select())
            .load::<TransactionEntity>(&mut conn)?;

        Ok(results)
    }

    async fn aggregate_totals(&self) -> Result<SettlementTotals> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let types: Vec<String> = TransactionType::ALL
            .iter()
            .map(|t| t.to_string())
            .collect();

        // SUM over int8 yields numeric in Postgres; cast back to keep i64.
        let rows = sql_query(
            "SELECT transaction_type, COALESCE(SUM(amount_minor), 0)::BIGINT AS total_minor \
             FROM transactions \
             WHERE transaction_type = ANY($1) \
             GROUP BY transaction_type",
        )
        .bind::<Array<Text>, _>(types)
        .load::<TypeTotalRow>(&mut conn)?;

        Ok(fold_totals(rows))
    }
}
