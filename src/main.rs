use std::process;

use clap::Parser;

use commalint::cli::Args;

fn main() {
    let args = Args::parse();
    match commalint::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(3);
        }
    }
}
