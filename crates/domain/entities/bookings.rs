use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{
        booking_window::BookingWindow, bookings::BookingAddress,
        enums::booking_statuses::BookingStatus,
    },
    infra::db::postgres::schema::bookings,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = bookings)]
pub struct BookingEntity {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub address_details: String,
    pub address_phone: String,
    pub address_city: String,
    pub address_postal_code: String,
    pub description: String,
    pub price_minor: i64,
    pub price_after_discount_minor: Option<i64>,
    pub status: String,
    pub reject_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingEntity {
    pub fn booking_status(&self) -> Result<BookingStatus> {
        BookingStatus::from_str(&self.status)
            .ok_or_else(|| anyhow!("booking {} has unknown status {:?}", self.id, self.status))
    }

    pub fn window(&self) -> Result<BookingWindow> {
        BookingWindow::new(self.start_date, self.end_date)
    }

    /// The amount the customer owes: the discounted price when one applies.
    pub fn payable_minor(&self) -> i64 {
        self.price_after_discount_minor.unwrap_or(self.price_minor)
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id || self.provider_id == user_id
    }

    pub fn address(&self) -> BookingAddress {
        BookingAddress {
            details: self.address_details.clone(),
            phone: self.address_phone.clone(),
            city: self.address_city.clone(),
            postal_code: self.address_postal_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct InsertBookingEntity {
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub address_details: String,
    pub address_phone: String,
    pub address_city: String,
    pub address_postal_code: String,
    pub description: String,
    pub price_minor: i64,
    pub price_after_discount_minor: Option<i64>,
    pub status: String,
    pub is_paid: bool,
}

impl InsertBookingEntity {
    pub fn window(&self) -> Result<BookingWindow> {
        BookingWindow::new(self.start_date, self.end_date)
    }
}
