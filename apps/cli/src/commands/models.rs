//! `babel models` and `babel supported`.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use super::print_json;
use crate::client::BabelClient;

/// List configured models and pairs.
pub async fn list(client: &BabelClient, json_output: bool) -> Result<()> {
    let response = client.models().await?;

    if json_output {
        return print_json(&json!({ "models": response.models, "pairs": response.pairs }));
    }

    println!("{}", format!("Configured Models ({})", response.models.len()).bold().cyan());
    for (model, pair) in response.models.iter().zip(&response.pairs) {
        println!("  {} {}", pair.green(), model);
    }
    Ok(())
}

/// List supported translation directions.
pub async fn supported(client: &BabelClient, json_output: bool) -> Result<()> {
    let translations = client.supported().await?;

    if json_output {
        return print_json(&translations);
    }

    println!("{}", "Supported translations:".bold().cyan());
    for direction in &translations {
        println!("  {direction}");
    }
    Ok(())
}
