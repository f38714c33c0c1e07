//! Version command implementation.

use bootsim::StageCatalog;

/// Version information for the CLI.
const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_BIN_NAME");

pub fn run() {
    let catalog = StageCatalog::secure_boot();

    println!("{NAME} {VERSION}");
    println!();
    println!("Secure-boot chain of trust simulator.");
    println!();
    println!("Build info:");
    println!("  Stages:       {}", catalog.count());
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
}
