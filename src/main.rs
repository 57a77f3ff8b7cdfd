use minish::{Shell, logging};

fn main() {
    logging::init();
    let mut shell = Shell::new();
    std::process::exit(shell.run());
}
