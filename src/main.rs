fn main() {
    if let Err(e) = waterflow_lib::run() {
        eprintln!("waterflow: {:#}", e);
        std::process::exit(1);
    }
}
