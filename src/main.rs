use myxo::{scheduler, SimConfig};

fn main() {
    env_logger::init();

    if let Err(err) = scheduler::run(SimConfig::default()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
