#![warn(missing_docs, clippy::missing_docs_in_private_items)]

//! Web server for [Pricewise](../pricewise/index.html)'s public API.

mod dockerflow;
mod errors;
mod logging;
mod middleware;
mod search;
mod validate;

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    get,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use anyhow::Context;
use cadence::StatsdClient;
use pricewise_serpapi::ShoppingClient;
use pricewise_settings::Settings;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::logging::PricewiseRootSpanBuilder;

/// Run the web server
///
/// The returned server is a `Future` that must either be `.await`ed, or run it
/// as a background task using `actix_rt::spawn`.
///
/// Most of the details from `settings` will be respected, except for those that
/// go into building the listener (the host and port). If you want to respect the
/// settings specified in that object, you must include them in the construction
/// of `listener`.
///
/// # Errors
///
/// Returns an error if the SerpApi client can't be created, or if the server
/// cannot be started on the provided listener.
///
/// # Examples
///
/// Run the server in the foreground. This will only return if there is an error
/// that causes the server to shut down. This is used to run Pricewise as a
/// service, such as in production.
///
/// ```no_run
/// # actix_rt::System::new().block_on(async {
/// let listener = std::net::TcpListener::bind("127.0.0.1:8080")
///     .expect("Failed to bind port");
/// let settings = pricewise_settings::Settings::load()
///     .expect("Failed to load settings");
/// let metrics_client = cadence::StatsdClient::from_sink("pricewise", cadence::NopMetricSink);
/// pricewise_web::run(listener, metrics_client, settings)
///     .expect("Failed to start server")
///     .await
///     .expect("Fatal error while running server");
/// # })
/// ```
pub fn run(
    listener: TcpListener,
    metrics_client: StatsdClient,
    settings: Settings,
) -> anyhow::Result<Server> {
    let num_workers = settings.http.workers;

    let shopping_client = Data::new(
        ShoppingClient::new(&settings.serpapi).context("Setting up the SerpApi client")?,
    );
    let metrics_client = Data::new(metrics_client);
    let settings = Data::new(settings);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(settings.clone())
            .app_data(shopping_client.clone())
            .app_data(metrics_client.clone())
            .wrap(middleware::Metrics)
            .wrap(middleware::Sentry)
            .wrap(Cors::permissive())
            .wrap(TracingLogger::<PricewiseRootSpanBuilder>::new())
            // The core functionality of Pricewise
            .service(
                web::scope("/api")
                    .configure(search::configure)
                    .configure(validate::configure),
            )
            .service(root_info)
            // Add the behavior necessary to satisfy Dockerflow.
            .service(web::scope("").configure(dockerflow::configure))
    })
    .listen(listener)
    .context("Listening for connections")?;

    if let Some(n) = num_workers {
        server = server.workers(n);
    }

    Ok(server.run())
}

/// The root view, to provide information about what this service is.
///
/// This is intended to be seen by people trying to investigate what this service
/// is. It should redirect to documentation, if it is available, or provide a
/// short message otherwise.
#[get("/")]
async fn root_info(settings: Data<Settings>) -> HttpResponse {
    match &settings.public_documentation {
        Some(redirect_url) => HttpResponse::Found()
            .insert_header(("location", redirect_url.as_str()))
            .finish(),
        None => HttpResponse::Ok().content_type("text/plain").body(
            "Pricewise searches online shops and ranks the results by value for money.",
        ),
    }
}
