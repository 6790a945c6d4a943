use std::panic;

use crate::terminal_guard::restore_terminal;

pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        log::error!("Panic: {panic_info}");
        default_hook(panic_info);
        std::process::exit(1);
    }));
}
