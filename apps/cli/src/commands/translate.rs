//! `babel translate` and `babel augment`.

use anyhow::{Result, bail};
use colored::Colorize;

use super::print_json;
use crate::client::BabelClient;

/// Translate each text, printing one translation per line in input order.
pub async fn translate(
    client: &BabelClient,
    from: &str,
    to: &str,
    texts: &[String],
    json_output: bool,
) -> Result<()> {
    if texts.is_empty() {
        bail!("Nothing to translate: pass at least one TEXT");
    }

    let translated = client.translate(from, to, texts).await?;

    if json_output {
        return print_json(&translated);
    }
    for line in &translated {
        println!("{line}");
    }
    Ok(())
}

/// Back-translate `text` through every target language.
pub async fn augment(
    client: &BabelClient,
    from: &str,
    targets: &[String],
    text: &str,
    json_output: bool,
) -> Result<()> {
    let augmentations = client.augment(from, targets, text).await?;

    if json_output {
        return print_json(&augmentations);
    }
    if augmentations.is_empty() {
        println!("{}", "No augmentation: no target has both directions configured".yellow());
        return Ok(());
    }
    for (target, augmented) in &augmentations {
        println!("{} {}", format!("[{from} -> {target} -> {from}]").dimmed(), augmented);
    }
    Ok(())
}
