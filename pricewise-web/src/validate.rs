//! The validation endpoint, which lets a partner platform confirm who operates
//! this service.

use actix_web::{
    get,
    web::{Data, ServiceConfig},
    HttpResponse,
};
use pricewise_settings::Settings;
use serde::Serialize;

/// Configure a route to use the validation service.
pub fn configure(config: &mut ServiceConfig) {
    config.service(validate);
}

/// The validation record.
#[derive(Debug, Serialize)]
struct ValidationResponse<'a> {
    /// The operator's phone number, with country code.
    number: &'a str,
}

/// Report the configured validation number. Any query string is ignored.
#[get("/validate")]
async fn validate(settings: Data<Settings>) -> HttpResponse {
    HttpResponse::Ok().json(ValidationResponse {
        number: &settings.validation.number,
    })
}
