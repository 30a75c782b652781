use super::configured;
use devkit_core::compose::ContainerDriver;
use std::path::Path;

pub fn up(root: &Path) -> anyhow::Result<()> {
    let (_, driver) = configured(root)?;
    driver.up()?;
    println!("Containers started.");
    Ok(())
}

pub fn down(root: &Path, volumes: bool) -> anyhow::Result<()> {
    let (_, driver) = configured(root)?;
    driver.down(volumes)?;
    println!("Containers stopped.");
    Ok(())
}

pub fn build(root: &Path) -> anyhow::Result<()> {
    let (_, driver) = configured(root)?;
    driver.build()?;
    println!("Images built.");
    Ok(())
}

pub fn restart(root: &Path) -> anyhow::Result<()> {
    let (_, driver) = configured(root)?;
    driver.restart()?;
    println!("Containers restarted.");
    Ok(())
}

pub fn logs(root: &Path, service: Option<&str>, follow: bool) -> anyhow::Result<()> {
    let (_, driver) = configured(root)?;
    driver.logs(service, follow)?;
    Ok(())
}
