use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use std::path::PathBuf;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, GuideSettings, Settings};
use crate::email_client::{EmailAttachment, EmailClient};
use crate::routes::{handle_send_guide, handle_subscribe, health_check};

/// The PDF handed out to new leads. The file is read from disk at send time;
/// if it went missing the subscription fails with a server error.
#[derive(Clone)]
pub struct GuideAsset {
    path: PathBuf,
    filename: String,
}

impl GuideAsset {
    pub fn new(settings: &GuideSettings) -> Self {
        Self {
            path: PathBuf::from(&settings.attachment_path),
            filename: settings.attachment_filename.clone(),
        }
    }

    pub fn load(&self) -> Result<EmailAttachment, std::io::Error> {
        let content = std::fs::read(&self.path)?;

        Ok(EmailAttachment {
            filename: self.filename.clone(),
            content_type: String::from("application/pdf"),
            content,
        })
    }
}

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender = config
            .email_client
            .sender()
            .expect("Sender email is not valid");
        let email_client = EmailClient::new(
            config.email_client.base_url.clone(),
            sender,
            config.email_client.api_key.clone(),
            None,
        );
        let guide = GuideAsset::new(&config.guide);

        let listener = TcpListener::bind(config.address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db_pool, email_client, guide)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    email_client: EmailClient,
    guide: GuideAsset,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let guide = web::Data::new(guide);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            // Registering resources instead of bare routes so non-POST methods
            // get a 405 rather than a 404
            .service(web::resource("/api/subscribe").route(web::post().to(handle_subscribe)))
            .service(web::resource("/api/send").route(web::post().to(handle_send_guide)))
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(guide.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.connect_options())
}
