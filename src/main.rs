use std::path::PathBuf;

use skyburst::{AppError, FireworksConfig};

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("skyburst=info"))
        .init();

    let config = FireworksConfig::resolve(std::env::args_os().nth(1).map(PathBuf::from))?;
    skyburst::run(config)
}
