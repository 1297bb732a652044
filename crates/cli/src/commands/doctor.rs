//! `docpair doctor`: Diagnose configuration and service health.

use super::config_file;
use docpair_config::{AppConfig, API_KEY_VARS};
use std::path::Path;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 docpair doctor");
    println!("=================\n");

    let mut issues = 0;

    let config_path = config_file(path);
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file: defaults in use (run `docpair init`)");
    }

    let config = match AppConfig::load_with(path) {
        Ok(config) => {
            println!("  ✅ Config valid (model: {})", config.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. Fix the config and re-run.");
            return Ok(());
        }
    };

    if config.documents_dir.is_dir() {
        println!(
            "  ✅ Documents directory exists: {}",
            config.documents_dir.display()
        );
    } else {
        println!(
            "  ❌ Documents directory missing: {}",
            config.documents_dir.display()
        );
        issues += 1;
    }

    for doc in config.registry().entries() {
        if doc.local_path.is_file() {
            println!("  ✅ {} file present", doc.identifier);
        } else {
            println!(
                "  ⚠️  {} file missing: {}",
                doc.identifier,
                doc.local_path.display()
            );
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  ✅ API key configured");
        match docpair_providers::build_from_config(&config) {
            Ok(service) => match service.health_check().await {
                Ok(true) => println!("  ✅ {} reachable, model available", service.name()),
                Ok(false) => {
                    println!("  ❌ {} rejected model {}", service.name(), config.model);
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ {} unreachable: {e}", service.name());
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Could not build service client: {e}");
                issues += 1;
            }
        }
    } else {
        println!(
            "  ❌ No API key: set one of {} or add api_key to the config",
            API_KEY_VARS.join(", ")
        );
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
