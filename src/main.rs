fn main() {
    if let Err(err) = empathic_accuracy_lib::run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
