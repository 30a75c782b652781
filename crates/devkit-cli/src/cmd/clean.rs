use super::{compose_driver, load_config};
use devkit_core::guard;
use std::path::Path;

/// Destroy containers, volumes, dependencies, and setup state.
///
/// Always asks for typed confirmation on stdin; there is no flag to skip it.
pub fn run(root: &Path) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let driver = compose_driver(root, &config)?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    let report = guard::clean(root, &config, &driver, &mut input, &mut out)?;

    for dir in &report.removed {
        println!("Removed {dir}");
    }
    println!("Environment reset. Run 'devkit setup' to start again.");
    Ok(())
}
