//! perfledger CLI entry point.

fn main() {
    if let Err(e) = perfledger_cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
