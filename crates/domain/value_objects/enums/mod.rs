pub mod booking_decisions;
pub mod booking_statuses;
pub mod notification_categories;
pub mod payment_methods;
pub mod transaction_sources;
pub mod transaction_types;
pub mod user_roles;
