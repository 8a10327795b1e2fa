use drp_data::cli::cli_main::run_interactive_menu;
use drp_data::settings::{init_logging, with_config};

pub fn main() {
    let config = with_config(|manager| manager.config().clone());
    if let Err(e) = init_logging(&config) {
        eprintln!("logging disabled: {}", e);
    }
    run_interactive_menu();
}
