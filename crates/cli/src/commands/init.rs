//! `docpair init`: Write a starter config.

use super::config_file;
use docpair_config::{AppConfig, API_KEY_VARS};
use std::path::Path;

pub async fn run(path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_file(path);

    println!("docpair setup");
    println!("=============\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        } else {
            println!("  Config directory exists: {}", dir.display());
        }
    }

    if config_path.exists() && !force {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Wrote config.toml at: {}", config_path.display());

    let defaults = AppConfig::default();
    println!("\n📝 Next steps:");
    println!("   1. Set one of {} (or add api_key to the config)", API_KEY_VARS.join(", "));
    println!(
        "   2. Put the document files under {}",
        defaults.documents_dir.display()
    );
    println!("   3. Run: docpair chat\n");

    Ok(())
}
