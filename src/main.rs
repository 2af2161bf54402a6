use log::error;

use twinpass::RenderConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = twinpass::app::run(RenderConfig::default()) {
        error!("{err}");
        std::process::exit(1);
    }
}
