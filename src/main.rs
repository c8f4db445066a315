fn main() {
    if let Err(err) = proxy_meter::run() {
        eprintln!("proxy_meter: {err:#}");
        std::process::exit(1);
    }
}
