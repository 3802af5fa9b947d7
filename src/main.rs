fn main() {
    if let Err(err) = csv_sql_loader::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
