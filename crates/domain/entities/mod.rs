pub mod bookings;
pub mod payment_events;
pub mod services;
pub mod transactions;
pub mod users;
