use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{self, EXAMPLE_CONFIG};
use crate::platform::common::atomic_write;

/// Initialize a new configuration file
pub fn init(output: Option<PathBuf>, force: bool) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => config::get_config_path()?,
    };

    write_example(&output, force)?;

    println!("✓ Created configuration file: {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the file to point at your gateway checkout if needed");
    println!("  2. Check that the gateway can be found:");
    println!("     moltbot-desktop --config {} status", output.display());
    println!();

    Ok(())
}

fn write_example(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at: {}\n\
             Use --force to overwrite, or specify a different --output path",
            output.display()
        );
    }

    atomic_write(output, EXAMPLE_CONFIG.as_bytes())
        .with_context(|| format!("Failed to write configuration file to {}", output.display()))
}
