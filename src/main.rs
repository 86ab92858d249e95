use lambda_http::{run, service_fn, Error, Request};
use notes_api::config::{Config, LogFormat};
use notes_api::handler::{self, Ctx};
use notes_api::trace::log_filter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;

    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());
    let fmt = tracing_subscriber::fmt().with_env_filter(filter).without_time();
    match config.log_format {
        LogFormat::Json => fmt.json().init(),
        LogFormat::Text => fmt.init(),
    }

    tracing::info!(table = %config.table, store = ?config.store, "notes api starting");
    let ctx = Ctx::new(config).await;

    run(service_fn(move |req: Request| {
        let ctx = ctx.clone();
        async move { handler::router(req, &ctx).await }
    }))
    .await
}
