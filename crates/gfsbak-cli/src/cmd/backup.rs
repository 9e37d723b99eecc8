use gfsbak_core::audit::AuditLog;
use gfsbak_core::config::GfsbakConfig;
use gfsbak_core::engine::ExecEngine;
use gfsbak_core::error::Result;
use gfsbak_core::scheduler::Scheduler;
use gfsbak_core::store::BackupStore;
use gfsbak_core::tier::Tier;

pub(crate) fn run(config: &GfsbakConfig, tier: &str) -> Result<()> {
    let tier: Tier = tier.parse()?;
    let store = BackupStore::new(&config.storage_root, &config.node);
    let engine = ExecEngine::from_config(config)?;
    let audit = AuditLog::new(&store, &config.node);

    let scheduler = Scheduler::new(config, &store, &engine, &engine, &audit);
    let report = scheduler.run(tier)?;

    if report.produced.len() > 1 {
        eprintln!("Cascaded through missing parent tiers:");
        for (tier, name) in &report.produced {
            eprintln!("  {tier:9} {name}");
        }
    }
    match report.parent {
        Some(parent) => eprintln!(
            "Produced {} {} backup {} (parent {parent})",
            report.kind, report.tier, report.name
        ),
        None => eprintln!(
            "Produced {} {} backup {}",
            report.kind, report.tier, report.name
        ),
    }
    Ok(())
}
