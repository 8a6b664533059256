use anyhow::Result;

fn main() -> Result<()> {
    guildhall::run()?;
    Ok(())
}
