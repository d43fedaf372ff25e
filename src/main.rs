use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use recordbook::config::Config;
use recordbook::{db, http};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let conn = db::open_db(&config.workspace).with_context(|| {
        format!(
            "failed to open workspace {}",
            config.workspace.to_string_lossy()
        )
    })?;
    let state = web::Data::new(http::AppState::new(config.workspace.clone(), conn));

    log::info!(
        "serving workspace {} on http://{}:{}",
        config.workspace.to_string_lossy(),
        config.host,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(http::configure)
    })
    .bind((config.host.as_str(), config.port))
    .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?
    .run()
    .await?;

    Ok(())
}
