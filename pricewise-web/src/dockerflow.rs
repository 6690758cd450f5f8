//! An actix-web service to implement [Dockerflow](https://github.com/mozilla-services/Dockerflow).

use actix_web::{
    get,
    web::{Data, ServiceConfig},
    HttpResponse,
};
use pricewise_settings::Settings;
use serde_json::json;

/// Handles required Dockerflow Endpoints.
pub fn configure(config: &mut ServiceConfig) {
    config
        .service(lbheartbeat)
        .service(heartbeat)
        .service(version);
}

/// Used by the load balancer to indicate that the server can respond to
/// requests. Should just return OK.
#[get("/__lbheartbeat__")]
async fn lbheartbeat() -> HttpResponse {
    HttpResponse::Ok().body("")
}

/// Return the contents of the `version.json` file created by CI and stored
/// in the Docker root (or the placeholder version stored in the Git repo).
#[get("/__version__")]
async fn version() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/json")
        .body(include_str!("../version.json"))
}

/// Returns a status message indicating the current state of the server.
///
/// A missing SerpApi key doesn't stop the server, but every search will fail,
/// so it is reported as a warning.
#[get("/__heartbeat__")]
async fn heartbeat(settings: Data<Settings>) -> HttpResponse {
    let api_key_status = if settings.serpapi.api_key.is_some() {
        "ok"
    } else {
        "warning"
    };

    HttpResponse::Ok().json(json!({
        "status": api_key_status,
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "serpapi_api_key": api_key_status,
        },
    }))
}
