use std::process;

fn main() {
    if let Err(err) = project_finance::cli::run_cli() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
