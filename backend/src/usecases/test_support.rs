//! In-memory stand-ins for the Postgres repositories. They keep the same
//! conditional-write semantics so that stateful properties (overlap,
//! idempotency, transition guards) can be exercised without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use crates::{
    domain::{
        entities::{
            bookings::{BookingEntity, InsertBookingEntity},
            services::ServiceEntity,
            transactions::TransactionEntity,
            users::UserEntity,
        },
        repositories::{
            bookings::BookingRepository, services::ServiceRepository,
            settlement::SettlementRepository, transactions::TransactionRepository,
            users::UserRepository,
        },
        value_objects::{
            booking_window::BookingWindow,
            bookings::{BookingScope, CreateBookingOutcome, StatusTransition},
            enums::{
                booking_statuses::BookingStatus, notification_categories::NotificationCategory,
                transaction_types::TransactionType, user_roles::UserRole,
            },
            pagination::Page,
            settlement::{SettlementOutcome, SettlementPlan},
            transactions::SettlementTotals,
        },
    },
    notifications::NotificationSender,
};
use uuid::Uuid;

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
}

pub fn user(role: UserRole, name: &str) -> UserEntity {
    UserEntity {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role: role.to_string(),
        device_token: Some(format!("{}-device", name.to_lowercase())),
        provider_is_active: role == UserRole::Provider,
        provider_balance_minor: 0,
        provider_commission_rate_bps: 1000,
        created_at: at(0),
        updated_at: at(0),
    }
}

pub fn service(provider_id: Uuid) -> ServiceEntity {
    ServiceEntity {
        id: Uuid::new_v4(),
        provider_id,
        title: "Plumbing".to_string(),
        is_active: true,
        created_at: at(0),
    }
}

pub fn booking(
    provider_id: Uuid,
    customer_id: Uuid,
    window: (u32, u32),
    status: BookingStatus,
    price_minor: i64,
) -> BookingEntity {
    BookingEntity {
        id: Uuid::new_v4(),
        provider_id,
        customer_id,
        service_id: Uuid::new_v4(),
        start_date: at(window.0),
        end_date: at(window.1),
        address_details: "12 Nile St".to_string(),
        address_phone: "+201000000000".to_string(),
        address_city: "Cairo".to_string(),
        address_postal_code: "11511".to_string(),
        description: "Fix the sink".to_string(),
        price_minor,
        price_after_discount_minor: None,
        status: status.to_string(),
        reject_reason: None,
        cancel_reason: None,
        is_paid: false,
        created_at: at(0),
        updated_at: at(0),
    }
}

#[derive(Default)]
struct StoreState {
    bookings: Vec<BookingEntity>,
    users: HashMap<Uuid, UserEntity>,
    services: HashMap<Uuid, ServiceEntity>,
    transactions: Vec<TransactionEntity>,
    payment_events: HashSet<String>,
}

/// One shared store implementing every repository trait.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_user(&self, user: UserEntity) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }

    pub fn put_service(&self, service: ServiceEntity) {
        self.state.lock().unwrap().services.insert(service.id, service);
    }

    pub fn put_booking(&self, booking: BookingEntity) {
        self.state.lock().unwrap().bookings.push(booking);
    }

    pub fn booking(&self, booking_id: Uuid) -> Option<BookingEntity> {
        let state = self.state.lock().unwrap();
        state.bookings.iter().find(|b| b.id == booking_id).cloned()
    }

    pub fn balance(&self, user_id: Uuid) -> i64 {
        self.state.lock().unwrap().users[&user_id].provider_balance_minor
    }

    pub fn transactions(&self) -> Vec<TransactionEntity> {
        self.state.lock().unwrap().transactions.clone()
    }

    pub fn push_transaction(&self, transaction_type: TransactionType, amount_minor: i64) {
        self.state.lock().unwrap().transactions.push(TransactionEntity {
            id: Uuid::new_v4(),
            source: "USER".to_string(),
            user_id: Uuid::new_v4(),
            booking_id: None,
            amount_minor,
            transaction_type: transaction_type.to_string(),
            payment_method: "card".to_string(),
            payment_reference: None,
            occurred_at: at(0),
            created_at: at(0),
        });
    }
}

fn active_overlaps(bookings: &[BookingEntity], provider_id: Uuid, window: &BookingWindow) -> Vec<BookingEntity> {
    bookings
        .iter()
        .filter(|b| b.provider_id == provider_id)
        .filter(|b| {
            BookingStatus::from_str(&b.status)
                .map(|s| s.holds_slot())
                .unwrap_or(true)
        })
        .filter(|b| b.window().map(|w| w.overlaps(window)).unwrap_or(false))
        .cloned()
        .collect()
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        Ok(self.booking(booking_id))
    }

    async fn find_overlapping_active(
        &self,
        provider_id: Uuid,
        window: BookingWindow,
    ) -> Result<Vec<BookingEntity>> {
        let state = self.state.lock().unwrap();
        Ok(active_overlaps(&state.bookings, provider_id, &window))
    }

    async fn create_if_available(&self, booking: InsertBookingEntity) -> Result<CreateBookingOutcome> {
        let window = booking.window()?;
        let mut state = self.state.lock().unwrap();
        if !active_overlaps(&state.bookings, booking.provider_id, &window).is_empty() {
            return Ok(CreateBookingOutcome::SlotTaken);
        }

        let created = BookingEntity {
            id: Uuid::new_v4(),
            provider_id: booking.provider_id,
            customer_id: booking.customer_id,
            service_id: booking.service_id,
            start_date: booking.start_date,
            end_date: booking.end_date,
            address_details: booking.address_details,
            address_phone: booking.address_phone,
            address_city: booking.address_city,
            address_postal_code: booking.address_postal_code,
            description: booking.description,
            price_minor: booking.price_minor,
            price_after_discount_minor: booking.price_after_discount_minor,
            status: booking.status,
            reject_reason: None,
            cancel_reason: None,
            is_paid: booking.is_paid,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.bookings.push(created.clone());
        Ok(CreateBookingOutcome::Created(created))
    }

    async fn transition_status(&self, transition: StatusTransition) -> Result<Option<BookingEntity>> {
        let mut state = self.state.lock().unwrap();
        let Some(row) = state.bookings.iter_mut().find(|b| {
            b.id == transition.booking_id
                && b.status == transition.from.as_str()
                && (!transition.require_paid || b.is_paid)
        }) else {
            return Ok(None);
        };

        row.status = transition.to.to_string();
        if transition.reject_reason.is_some() {
            row.reject_reason = transition.reject_reason;
        }
        if transition.cancel_reason.is_some() {
            row.cancel_reason = transition.cancel_reason;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn list(&self, scope: BookingScope, page: Page) -> Result<Vec<BookingEntity>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bookings
            .iter()
            .filter(|b| match scope {
                BookingScope::All => true,
                BookingScope::Customer(id) => b.customer_id == id,
                BookingScope::Provider(id) => b.provider_id == id,
            })
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
    async fn find_by_id(&self, service_id: Uuid) -> Result<Option<ServiceEntity>> {
        Ok(self.state.lock().unwrap().services.get(&service_id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.state.lock().unwrap().users.get(&user_id).cloned())
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn list(&self, user_id: Option<Uuid>, page: Page) -> Result<Vec<TransactionEntity>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .transactions
            .iter()
            .filter(|t| user_id.is_none_or(|id| t.user_id == id))
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn aggregate_totals(&self) -> Result<SettlementTotals> {
        let state = self.state.lock().unwrap();
        let mut totals = SettlementTotals::default();
        for t in &state.transactions {
            match TransactionType::from_str(&t.transaction_type) {
                Some(TransactionType::PayBooking) => totals.pay_booking += t.amount_minor,
                Some(TransactionType::PayFine) => totals.pay_fine += t.amount_minor,
                Some(TransactionType::PayWorker) => totals.pay_worker += t.amount_minor,
                None => {}
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl SettlementRepository for InMemoryStore {
    async fn apply(&self, plan: SettlementPlan) -> Result<SettlementOutcome> {
        let mut state = self.state.lock().unwrap();

        if let Some(marker) = &plan.dedup_marker {
            if state.payment_events.contains(&marker.idempotency_key) {
                return Ok(SettlementOutcome::DuplicateEvent);
            }
        }

        if let Some(booking_id) = plan.mark_booking_paid {
            let payable = state.bookings.iter().any(|b| {
                b.id == booking_id && b.status == BookingStatus::Accepted.as_str() && !b.is_paid
            });
            if !payable {
                return Ok(SettlementOutcome::BookingNotPayable);
            }
        }

        if let Some(missing) = plan
            .balance_adjustments
            .iter()
            .find(|adj| !state.users.contains_key(&adj.user_id))
        {
            return Ok(SettlementOutcome::AccountMissing(missing.user_id));
        }

        // Every guard passed; apply all writes together.
        if let Some(marker) = &plan.dedup_marker {
            state.payment_events.insert(marker.idempotency_key.clone());
        }
        if let Some(booking_id) = plan.mark_booking_paid {
            if let Some(b) = state.bookings.iter_mut().find(|b| b.id == booking_id) {
                b.is_paid = true;
            }
        }
        for adj in &plan.balance_adjustments {
            if let Some(u) = state.users.get_mut(&adj.user_id) {
                u.provider_balance_minor += adj.delta_minor;
            }
        }
        for entry in plan.ledger_entries {
            state.transactions.push(TransactionEntity {
                id: Uuid::new_v4(),
                source: entry.source,
                user_id: entry.user_id,
                booking_id: entry.booking_id,
                amount_minor: entry.amount_minor,
                transaction_type: entry.transaction_type,
                payment_method: entry.payment_method,
                payment_reference: entry.payment_reference,
                occurred_at: entry.occurred_at,
                created_at: Utc::now(),
            });
        }

        Ok(SettlementOutcome::Applied)
    }
}

/// Captures push notifications instead of sending them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, NotificationCategory, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, NotificationCategory, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSender for RecordingNotifier {
    fn notify(&self, device_token: &str, category: NotificationCategory, subject_name: &str) {
        self.sent.lock().unwrap().push((
            device_token.to_string(),
            category,
            subject_name.to_string(),
        ));
    }
}
