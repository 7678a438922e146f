//! `cairn add`: ingest identifiers and list the registry

use anyhow::{bail, Context, Result};
use cairn_asset::{Asset, AssetStore, StoreConfig};
use cairn_core::Hash;

pub fn run(config: &StoreConfig, ids: &[String], hash: Option<&str>, format: &str) -> Result<()> {
    let mut store = AssetStore::from_config(config);

    match hash {
        Some(hash) => {
            let [url] = ids else {
                bail!("--hash applies to exactly one URL, got {}", ids.len());
            };
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("--hash requires an http:// or https:// URL, got {:?}", url);
            }
            let hash = Hash::parse(hash)?;
            store
                .add_url(url, Some(hash))
                .with_context(|| format!("Failed to add {}", url))?;
        }
        None => {
            for id in ids {
                store
                    .add(id)
                    .with_context(|| format!("Failed to add {}", id))?;
            }
        }
    }

    print_assets(store.assets(), format)
}

fn print_assets(assets: &[Asset], format: &str) -> Result<()> {
    if format == "json" {
        let items: Vec<serde_json::Value> = assets.iter().map(asset_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        println!("{} asset(s):\n", assets.len());
        for asset in assets {
            println!("  {} {}", asset.key(), asset.asset_path());
            println!("    from {}", asset.source());
        }
    }
    Ok(())
}

fn asset_json(asset: &Asset) -> serde_json::Value {
    let source = asset.source();
    serde_json::json!({
        "key": asset.key(),
        "asset_path": asset.asset_path(),
        "source": source.key(),
        "hash": source.hash().map(|h| h.to_prefixed_hex()),
        "parent": source.parent().map(|p| p.key()),
    })
}
