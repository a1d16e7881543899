use std::process::Command;

use anyhow::{Context, Result};

/// Each tier must build on its own, without help from a sibling crate.
const FEATURE_COMBINATIONS: &[&[&str]] = &[
    &[], // bare
    &["foundation"],
    &["runtime"],
    &["test-utils"],
];

/// Check that every `rendezvous-common` feature tier compiles in isolation.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} rendezvous-common feature tiers...", FEATURE_COMBINATIONS.len());

    for (index, features) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let is_bare = features.is_empty();
        let display_label = if is_bare { "none".to_string() } else { joined.clone() };
        let feature_arg = if is_bare { None } else { Some(joined) };

        println!(
            "\n[{}/{}] cargo check -p rendezvous-common{}",
            index + 1,
            FEATURE_COMBINATIONS.len(),
            feature_arg.as_ref().map(|arg| format!(" --features {arg}")).unwrap_or_default()
        );

        let mut command = Command::new("cargo");
        command.arg("check").arg("-p").arg("rendezvous-common");

        if let Some(feature_list) = feature_arg.as_ref() {
            command.arg("--features").arg(feature_list.as_str());
        }

        let status = command
            .status()
            .with_context(|| format!("Failed to run cargo check for '{display_label}'"))?;

        if !status.success() {
            anyhow::bail!("Feature tier '{display_label}' failed to compile");
        }

        println!("✅ Features '{display_label}' compiled successfully");
    }

    println!("\n✅ All {} feature tiers compile successfully!", FEATURE_COMBINATIONS.len());

    Ok(())
}
