use once_cell::sync::Lazy;
use reqwest::Response;
use sqlx::{migrate, Connection, Executor, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use wiremock::MockServer;

use lead_capture::{
    config::{get_configuration, DatabaseSettings, Settings},
    startup::{get_connection_db_pool, Application},
    telemetry::{get_subscriber, init_subscriber},
};

// The tracing stack can only be initialized once per process. Output goes to a
// sink unless TEST_LOG is set.
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber("test".into(), "debug".into(), std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber("test".into(), "debug".into(), std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub db_pool: PgPool,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Self::spawn_app_with_config(|_| {}).await
    }

    pub async fn spawn_app_with_config(customize: impl FnOnce(&mut Settings)) -> TestApp {
        Lazy::force(&TRACING);

        let mut config = get_configuration().expect("Missing configuration file.");
        customize(&mut config);
        let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));
        let email_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special
        // case that operating systems take into account: when port is 0, the OS will search for
        // the first available port
        config.application.port = 0;
        config.email_client.base_url = email_server.uri();

        let db_pool = configure_db(&mut config.database, db_test_name.clone()).await;

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            db_pool,
            email_server,
        }
    }

    pub async fn post_subscribe(&self, body: HashMap<&str, &str>) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/api/subscribe", self.address);

        client
            .post(&url)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_send(&self, body: HashMap<&str, &str>) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/api/send", self.address);

        client
            .post(&url)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn lead_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&self.db_pool)
            .await
            .expect("Query to count leads failed.")
    }
}

async fn configure_db(db_config: &mut DatabaseSettings, db_test_name: String) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&db_config.connect_options())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    connection
        .close()
        .await
        .expect("Failed to close connection.");

    // Execute migrations
    db_config.name = db_test_name;

    let db_pool = get_connection_db_pool(db_config);

    migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations.");

    db_pool
}
