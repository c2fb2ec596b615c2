use anyhow::Result;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::commission::CommissionRate, infra::db::postgres::schema::users,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub device_token: Option<String>,
    pub provider_is_active: bool,
    pub provider_balance_minor: i64,
    pub provider_commission_rate_bps: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    pub fn commission_rate(&self) -> Result<CommissionRate> {
        CommissionRate::from_basis_points(self.provider_commission_rate_bps)
    }
}
