use std::time::Duration;

use crate::error::{GfsbakError, Result};

pub(super) fn default_usage_threshold_percent() -> u8 {
    90
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_backup_full() -> String {
    "mariabackup --backup --target-dir={target} {compress} --parallel={workers}".to_string()
}

pub(super) fn default_backup_delta() -> String {
    "mariabackup --backup --target-dir={target} --incremental-basedir={parent} \
     --extra-lsndir={checkpoint} {compress} --parallel={workers}"
        .to_string()
}

pub(super) fn default_stage() -> String {
    "cp -a {source}/. {base}".to_string()
}

pub(super) fn default_prepare_base() -> String {
    "mariabackup --prepare --target-dir={base}".to_string()
}

pub(super) fn default_apply_increment() -> String {
    "mariabackup --prepare --target-dir={base} --incremental-dir={increment}".to_string()
}

pub(super) fn default_move_into_place() -> String {
    "mariabackup --move-back --target-dir={base} --datadir={datadir}".to_string()
}

pub(super) fn default_service_stop() -> String {
    "systemctl stop mariadb".to_string()
}

pub(super) fn default_service_start() -> String {
    "systemctl start mariadb".to_string()
}

pub(super) fn default_engine_timeout() -> String {
    "2h".to_string()
}

/// Parse a simple duration string like "30m", "4h", or "2d".
/// A bare number is taken as hours.
pub fn parse_human_duration(raw: &str) -> Result<Duration> {
    let input = raw.trim();
    if input.is_empty() {
        return Err(GfsbakError::Config("duration must not be empty".into()));
    }

    let (num_part, unit) = match input.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&input[..input.len() - 1], Some(c)),
        _ => (input, None),
    };

    let value: u64 = num_part
        .parse()
        .map_err(|_| GfsbakError::Config(format!("invalid duration value: '{raw}'")))?;

    let secs = match unit {
        Some('s') | Some('S') => value,
        Some('m') | Some('M') => value.saturating_mul(60),
        Some('h') | Some('H') => value.saturating_mul(60 * 60),
        Some('d') | Some('D') => value.saturating_mul(60 * 60 * 24),
        Some(other) => {
            return Err(GfsbakError::Config(format!(
                "unsupported duration suffix '{other}' in '{raw}' (use s/m/h/d)"
            )));
        }
        None => value.saturating_mul(60 * 60),
    };

    if secs == 0 {
        return Err(GfsbakError::Config(
            "duration must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_secs(secs))
}
