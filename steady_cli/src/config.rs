//! Config loading with command-line overrides applied.

use crate::cli::Overrides;
use std::path::{Path, PathBuf};
use steady_config::Config;
use thiserror::Error;

/// Bad user-supplied input: config file, overrides or trace.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read config {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid trace: {0}")]
    InvalidTrace(String),
}

pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config, InputError> {
    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|source| InputError::ReadConfig {
                path: p.to_path_buf(),
                source,
            })?;
            steady_config::load_toml(&text).map_err(|e| InputError::InvalidConfig(e.to_string()))?
        }
        None => Config::default(),
    };
    apply_overrides(&mut cfg, overrides);
    cfg.validate()
        .map_err(|e| InputError::InvalidConfig(format!("{e:#}")))?;
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, o: &Overrides) {
    if let Some(s) = o.sensitivity {
        if o.procedure.is_some() || cfg.procedure.kind.is_some() {
            tracing::warn!("a procedure preset selects the sensitivity; --sensitivity ignored");
        }
        cfg.analyzer.sensitivity = s.into();
    }
    if let Some(t) = o.time_threshold {
        cfg.analyzer.time_threshold_s = Some(t);
    }
    if let Some(p) = &o.procedure {
        cfg.procedure.kind = Some(p.clone());
    }
    if let Some(p) = &o.population {
        cfg.procedure.population = Some(p.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SensitivityArg;

    #[test]
    fn overrides_win_over_defaults() {
        let o = Overrides {
            sensitivity: Some(SensitivityArg::Low),
            time_threshold: Some(1.5),
            ..Overrides::default()
        };
        let cfg = load_config(None, &o).unwrap();
        let eff = cfg.effective().unwrap();
        assert_eq!(eff.threshold_px, 20);
        assert_eq!(eff.time_threshold_s, 1.5);
    }

    #[test]
    fn bad_override_is_a_config_error() {
        let o = Overrides {
            procedure: Some("dental".into()),
            ..Overrides::default()
        };
        let err = load_config(None, &o).unwrap_err();
        assert!(matches!(err, InputError::InvalidConfig(m) if m.contains("unknown procedure")));
    }
}
