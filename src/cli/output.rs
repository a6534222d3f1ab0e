//! Output formatting for CLI

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Write `value` as pretty JSON.
pub fn export_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value)?;
    println!("\n✓ Results exported to: {}", path.display());
    Ok(())
}
