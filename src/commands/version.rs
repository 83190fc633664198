//! `gam version`

pub fn banner() -> String {
    format!(
        "{} {}\n{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::env::consts::FAMILY
    )
}

pub fn run() {
    println!("{}", banner());
}
