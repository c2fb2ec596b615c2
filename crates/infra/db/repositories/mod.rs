pub mod bookings;
pub mod services;
pub mod settlement;
pub mod transactions;
pub mod users;
