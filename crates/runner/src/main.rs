use scalper_runner::{App, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    log::info!("State directory: {}", config.state_dir.display());

    let app = App::bootstrap(config).await?;
    for bot in app.registry.get_all_bots().await {
        log::info!(
            "[{}] {} {} running={} phase={}",
            bot.id,
            bot.symbol,
            bot.strategy,
            bot.is_running,
            bot.phase()
        );
    }

    app.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for ctrl-c: {}", e);
        }
    })
    .await;

    Ok(())
}
