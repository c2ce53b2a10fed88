use lead_capture::config::get_configuration;
use lead_capture::startup::Application;
use lead_capture::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(
        String::from("lead_capture"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let application = Application::build(config).await?;

    tracing::info!("Server listening on port {}", application.port());

    application.run_until_stop().await
}
