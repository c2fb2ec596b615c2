pub mod availability;
pub mod bookings;
pub mod payment_events;
pub mod payment_sheets;
pub mod settlement;

#[cfg(test)]
pub(crate) mod test_support;
