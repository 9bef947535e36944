fn main() {
    if let Err(err) = csv_resolve::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
