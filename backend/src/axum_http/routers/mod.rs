pub mod bookings;
pub mod payment_webhook;
pub mod transactions;

use axum::{http::StatusCode, response::Response};
use crates::domain::value_objects::pagination::{Page, PageQuery};

use super::error_responses::error_response;

pub(crate) fn page_from(query: PageQuery) -> Result<Page, Response> {
    Page::try_from(query).map_err(|message| error_response(StatusCode::UNPROCESSABLE_ENTITY, message))
}
