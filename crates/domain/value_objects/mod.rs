pub mod booking_window;
pub mod bookings;
pub mod commission;
pub mod enums;
pub mod pagination;
pub mod payment_events;
pub mod settlement;
pub mod transactions;
