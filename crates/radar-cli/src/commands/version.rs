use anyhow::Result;

pub fn run() -> Result<()> {
    println!("radar {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
