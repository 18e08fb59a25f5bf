use std::io;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer};
use log::{error, info};
use taskdesk::{routes, Config, Database, Services};

fn startup_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> io::Error {
    move |e| {
        error!("{}: {}", context, e);
        io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error("Invalid configuration"))?;
    info!("Loaded configuration: {:?}", config.auth);

    let database = Database::connect(&config.database)
        .await
        .map_err(startup_error("Failed to connect to database"))?;
    database
        .migrate()
        .await
        .map_err(startup_error("Failed to run migrations"))?;

    let services = Services::build(database.pool().clone(), &config.auth);

    info!("Starting TaskDesk server at {}", config.server_url());
    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .expose_headers(["authorization"])
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| services.register(cfg))
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await;

    database.shutdown().await;
    server
}
