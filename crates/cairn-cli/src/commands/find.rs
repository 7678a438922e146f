//! `cairn find`: resolve a key and emit its bytes

use anyhow::{anyhow, Context, Result};
use cairn_asset::{AssetStore, HasSource, Source, StoreConfig};
use cairn_core::Resource;
use std::fs::File;
use std::io;
use std::path::PathBuf;

pub struct FindArgs {
    pub key: String,
    pub path: String,
    pub from: Vec<String>,
    pub output: Option<PathBuf>,
}

pub fn run(config: &StoreConfig, args: FindArgs) -> Result<()> {
    let mut store = AssetStore::from_config(config);
    for id in &args.from {
        store
            .add(id)
            .with_context(|| format!("Failed to add {}", id))?;
    }

    let resource = store
        .find(&args.key, &args.path)?
        .ok_or_else(|| anyhow!("No asset matches {}:{}", args.key, args.path))?;

    for line in provenance(resource.source()) {
        eprintln!("{}", line);
    }

    let mut reader = resource.open()?;
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            io::copy(&mut reader, &mut file)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            io::copy(&mut reader, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

/// One line per link in the provenance chain, outermost source first
fn provenance(source: &Source) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = Some(source);
    while let Some(s) = current {
        chain.push(s);
        current = s.parent().map(|p| p.as_ref());
    }

    chain
        .iter()
        .rev()
        .enumerate()
        .map(|(depth, s)| {
            let origin = s.origin().as_str();
            let indent = "  ".repeat(depth);
            match s.hash() {
                Some(hash) => format!("{}{} ({})", indent, origin, hash.to_prefixed_hex()),
                None => format!("{}{}", indent, origin),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::Hash;
    use std::sync::Arc;

    #[test]
    fn test_provenance_outermost_first() {
        let hash = Hash::parse("d41d8cd98f00b204e9800998ecf8427e").unwrap();
        let archive = Arc::new(Source::from_url("https://example.com/foo.tar.gz", Some(hash)));
        let file = Source::extracted(archive, "bin/foo");

        assert_eq!(
            provenance(&file),
            vec![
                "https://example.com/foo.tar.gz (md5:d41d8cd98f00b204e9800998ecf8427e)".to_string(),
                "  bin/foo".to_string(),
            ]
        );
    }

    #[test]
    fn test_provenance_single_url() {
        let source = Source::from_url("https://example.com/tool", None);
        assert_eq!(provenance(&source), vec!["https://example.com/tool".to_string()]);
    }
}
