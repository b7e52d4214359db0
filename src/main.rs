mod app;

use std::env;

use tracing_subscriber::EnvFilter;

#[cfg_attr(feature = "window", show_image::main)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let params = app::Params::from_args(&args)?;

    app::run(params)?;

    return Ok(());
}
