use comfy_table::Cell;

use gfsbak_core::checkpoint::ChainRecord;
use gfsbak_core::config::GfsbakConfig;
use gfsbak_core::error::Result;
use gfsbak_core::store::{BackupStore, Namespace};
use gfsbak_core::tier::Tier;

use crate::table::CliTableTheme;

pub(crate) fn run(config: &GfsbakConfig) -> Result<()> {
    let store = BackupStore::new(&config.storage_root, &config.node);
    let theme = CliTableTheme::detect();
    let mut table = theme.new_data_table(&["TIER", "NAME", "KIND", "COMPRESSED", "PARENT"]);

    let mut total = 0usize;
    for tier in Tier::ALL {
        for name in store.list(Namespace::Payloads, tier)? {
            let checkpoint = store.instance_dir(Namespace::Checkpoints, tier, &name);
            let record = ChainRecord::load(&checkpoint).ok().flatten();
            let (kind, compressed, parent) = match record {
                Some(r) => (
                    r.kind.to_string(),
                    if r.compressed { "yes" } else { "no" }.to_string(),
                    r.parent
                        .map(short_parent)
                        .unwrap_or_else(|| "-".to_string()),
                ),
                // Payload without a chain record: interrupted or foreign.
                None => ("?".to_string(), "?".to_string(), "?".to_string()),
            };
            table.add_row(vec![
                Cell::new(tier.as_str()),
                Cell::new(&name),
                Cell::new(kind),
                Cell::new(compressed),
                Cell::new(parent),
            ]);
            total += 1;
        }
    }

    if total == 0 {
        eprintln!("No backup instances under {}", store.node_root().display());
    } else {
        println!("{table}");
    }
    Ok(())
}

/// Compress a parent payload path down to `<tier>/<name>` for display.
fn short_parent(parent: String) -> String {
    let mut tail: Vec<&str> = parent.rsplit('/').take(2).collect();
    tail.reverse();
    tail.join("/")
}
