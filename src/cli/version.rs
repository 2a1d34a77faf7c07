/// Display version information
pub fn execute() {
    println!("zkballot {}", env!("CARGO_PKG_VERSION"));
    println!("Anonymous one-vote-per-voter polls over a Merkle voter registry");
}
