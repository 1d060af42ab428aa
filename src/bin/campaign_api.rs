use campaign_pipeline::configuration::get_configuration;
use campaign_pipeline::startup::Application;
use campaign_pipeline::telemetry::get_subscriber;
use campaign_pipeline::telemetry::init_subscriber;

/// Entry point for the HTTP admission/read surface. Mirrors
/// `examples/original_source/services/campaign-api/cmd/campaign-api/main.go`: load config,
/// init telemetry, build and run the server, exit non-zero on any startup
/// fault.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = get_configuration()?;

    let subscriber = get_subscriber("campaign-api", &settings.log_level, std::io::stdout);
    init_subscriber(subscriber);

    let app = Application::build(settings).await?;
    tracing::info!(port = app.get_port(), "campaign_api_listening");
    app.run_until_stopped().await?;

    tracing::info!("campaign_api_exited_gracefully");
    Ok(())
}
