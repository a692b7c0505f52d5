//! `babel free`, `babel flush` and `babel stats`.

use anyhow::Result;
use colored::Colorize;

use super::print_json;
use crate::client::BabelClient;

/// Free the model serving `from -> to`.
pub async fn free(client: &BabelClient, from: &str, to: &str) -> Result<()> {
    if client.free(from, to).await? {
        println!("{} {from} -> {to}", "Freed".green());
    } else {
        println!("{} {from} -> {to}", "No resident model for".yellow());
    }
    Ok(())
}

/// Flush every resident model's cache.
pub async fn flush(client: &BabelClient) -> Result<()> {
    client.flush().await?;
    println!("{}", "Caches flushed".green());
    Ok(())
}

/// Print registry and cache statistics.
pub async fn stats(client: &BabelClient, json_output: bool) -> Result<()> {
    let stats = client.stats().await?;

    if json_output {
        return print_json(&stats);
    }

    let registry = &stats["registry"];
    println!("{}", "Registry".bold().cyan());
    println!("  resident:      {}", registry["resident"]);
    println!("  constructions: {}", registry["constructions"]);
    println!("  frees:         {}", registry["frees"]);
    println!("  flushes:       {}", registry["flushes"]);

    let instances = stats["instances"].as_array().map_or(&[][..], Vec::as_slice);
    for instance in instances {
        let pair = &instance["pair"];
        let cache = &instance["cache"];
        println!(
            "{} {}_{} on {}",
            "Instance".bold().cyan(),
            pair["source"].as_str().unwrap_or("?"),
            pair["target"].as_str().unwrap_or("?"),
            instance["device"].as_str().unwrap_or("?"),
        );
        println!(
            "  cache: {}/{} entries, {} hits, {} misses, {} evictions, {} engine batches",
            cache["size"],
            cache["capacity"],
            cache["hits"],
            cache["misses"],
            cache["evictions"],
            cache["engine_batches"],
        );
    }
    Ok(())
}
