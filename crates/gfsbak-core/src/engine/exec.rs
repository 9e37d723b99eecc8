use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{EngineConfig, GfsbakConfig};
use crate::error::{GfsbakError, Result};
use crate::plan::BackupPlan;
use crate::platform::shell;

use super::{BackupEngine, DiskUsage, RestoreEngine, ServiceControl};

/// Subprocess-backed implementation of every collaborator trait, driven by
/// the command templates in [`EngineConfig`].
pub struct ExecEngine {
    config: EngineConfig,
    credential: Option<String>,
    timeout: Duration,
}

impl ExecEngine {
    pub fn from_config(config: &GfsbakConfig) -> Result<Self> {
        Ok(Self {
            timeout: config.engine.timeout()?,
            config: config.engine.clone(),
            credential: config.credential.clone(),
        })
    }

    fn run(&self, stage: &str, template: &str, subs: &[(&str, &str)]) -> Result<Vec<u8>> {
        let script = substitute(template, subs);
        info!(%stage, "running: {script}");

        let mut cmd = shell::command_for_script(&script);
        // The credential travels via environment, never the command line.
        if let Some(ref credential) = self.credential {
            cmd.env("GFSBAK_CREDENTIAL", credential);
        }

        let output = shell::run_command_with_timeout(&mut cmd, self.timeout)
            .map_err(|e| GfsbakError::engine(stage, format!("'{script}': {e}")))?;

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GfsbakError::engine(
                stage,
                format!("'{script}' exited with {code}: {}", stderr.trim()),
            ));
        }
        debug!(%stage, "command succeeded");
        Ok(output.stdout)
    }
}

impl BackupEngine for ExecEngine {
    fn produce(&self, plan: &BackupPlan) -> Result<()> {
        let target = plan.target.to_string_lossy();
        let checkpoint = plan.checkpoint.to_string_lossy();
        let workers = plan.workers.to_string();
        let compress = if plan.compressed { "--compress" } else { "" };

        match plan.parent {
            None => self.run(
                "backup",
                &self.config.backup_full,
                &[
                    ("target", target.as_ref()),
                    ("compress", compress),
                    ("workers", &workers),
                ],
            )?,
            Some(ref parent) => self.run(
                "backup",
                &self.config.backup_delta,
                &[
                    ("target", target.as_ref()),
                    ("parent", parent.to_string_lossy().as_ref()),
                    ("checkpoint", checkpoint.as_ref()),
                    ("compress", compress),
                    ("workers", &workers),
                ],
            )?,
        };
        Ok(())
    }
}

impl RestoreEngine for ExecEngine {
    fn stage_base(&self, source: &Path, base: &Path) -> Result<()> {
        self.run(
            "stage base",
            &self.config.stage,
            &[
                ("source", source.to_string_lossy().as_ref()),
                ("base", base.to_string_lossy().as_ref()),
            ],
        )?;
        Ok(())
    }

    fn prepare_base(&self, base: &Path) -> Result<()> {
        self.run(
            "prepare base",
            &self.config.prepare_base,
            &[("base", base.to_string_lossy().as_ref())],
        )?;
        Ok(())
    }

    fn apply_increment(&self, base: &Path, increment: &Path) -> Result<()> {
        self.run(
            "apply increment",
            &self.config.apply_increment,
            &[
                ("base", base.to_string_lossy().as_ref()),
                ("increment", increment.to_string_lossy().as_ref()),
            ],
        )?;
        Ok(())
    }

    fn move_into_place(&self, base: &Path, data_dir: &Path) -> Result<()> {
        self.run(
            "move into place",
            &self.config.move_into_place,
            &[
                ("base", base.to_string_lossy().as_ref()),
                ("datadir", data_dir.to_string_lossy().as_ref()),
            ],
        )?;
        Ok(())
    }
}

impl ServiceControl for ExecEngine {
    fn stop(&self) -> Result<()> {
        self.run("service stop", &self.config.service_stop, &[])?;
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.run("service start", &self.config.service_start, &[])?;
        Ok(())
    }
}

impl DiskUsage for ExecEngine {
    fn usage_percent(&self, path: &Path) -> Result<u8> {
        let stdout = match self.config.disk_usage {
            Some(ref template) => self.run(
                "disk usage",
                template,
                &[("path", path.to_string_lossy().as_ref())],
            )?,
            None => self.run(
                "disk usage",
                "df -P {path}",
                &[("path", path.to_string_lossy().as_ref())],
            )?,
        };
        let text = String::from_utf8_lossy(&stdout);
        if self.config.disk_usage.is_some() {
            parse_percent(text.trim())
        } else {
            parse_df_percent(&text)
        }
    }
}

/// Substitute `{placeholder}` tokens, shell-escaping every value.
/// The `{compress}` placeholder is a bare flag and is inserted verbatim.
fn substitute(template: &str, subs: &[(&str, &str)]) -> String {
    // Bare flags go in first: an empty {compress} leaves double spaces in
    // the template, which must be collapsed before quoted values (which may
    // legitimately contain runs of spaces) are spliced in.
    let mut result = template.to_string();
    for (key, value) in subs {
        if *key == "compress" {
            result = result.replace(&format!("{{{key}}}"), value);
        }
    }
    while result.contains("  ") {
        result = result.replace("  ", " ");
    }
    let mut result = result.trim().to_string();
    for (key, value) in subs {
        if *key != "compress" {
            result = result.replace(&format!("{{{key}}}"), &shell_escape(value));
        }
    }
    result
}

fn shell_escape(input: &str) -> String {
    if input.is_empty() {
        return "''".to_string();
    }
    let escaped = input.replace('\'', "'\"'\"'");
    format!("'{escaped}'")
}

fn parse_percent(raw: &str) -> Result<u8> {
    raw.trim_end_matches('%').trim().parse().map_err(|_| {
        GfsbakError::engine("disk usage", format!("cannot parse percentage from '{raw}'"))
    })
}

/// Pull the capacity column out of POSIX `df -P` output.
fn parse_df_percent(output: &str) -> Result<u8> {
    let line = output.lines().nth(1).ok_or_else(|| {
        GfsbakError::engine("disk usage", "df produced no data line".to_string())
    })?;
    let capacity = line.split_whitespace().nth(4).ok_or_else(|| {
        GfsbakError::engine("disk usage", format!("unexpected df line: '{line}'"))
    })?;
    parse_percent(capacity)
}
