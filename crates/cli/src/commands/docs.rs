//! `docpair docs`: List configured documents.

use super::load_config;
use std::path::Path;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let registry = config.registry();

    println!("{}", config.title);
    println!("Documents in {}\n", config.documents_dir.display());

    let mut missing = 0;
    for doc in registry.entries() {
        let present = tokio::fs::metadata(&doc.local_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !present {
            missing += 1;
        }
        println!(
            "  {} {:<12} {}",
            if present { "✅" } else { "❌" },
            doc.identifier,
            doc.label
        );
        println!("     {}", doc.local_path.display());
    }

    println!();
    if missing > 0 {
        println!("  ⚠️  {missing} document file(s) missing; they will be skipped in requests.");
    } else {
        println!("  {} document(s) available.", registry.len());
    }

    Ok(())
}
