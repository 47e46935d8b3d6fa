use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use loadout_core::{
    CustomOverride, SolverConfiguration, Stat, StatVector, TuningPlan, TuningRow, TuningRows,
};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Inline request overrides collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct RequestFlags {
    pub request: Option<std::path::PathBuf>,
    pub targets: Option<String>,
    pub fragments: Option<String>,
    pub tuning: Option<String>,
    pub auto: bool,
    pub least_favored: Option<String>,
    pub minor_slots: Option<usize>,
    pub custom_exotic: Option<String>,
}

/// Load the request file (if any), then apply inline flags on top.
pub fn build_request(flags: &RequestFlags) -> Result<SolverConfiguration> {
    let mut config = match &flags.request {
        Some(path) => load_request(path)?,
        None => SolverConfiguration::default(),
    };

    if let Some(spec) = &flags.targets {
        config.targets =
            parse_stat_pairs(spec, &config.targets).context("parsing --targets")?;
    }
    if let Some(spec) = &flags.fragments {
        config.fragments =
            parse_stat_pairs(spec, &config.fragments).context("parsing --fragments")?;
    }
    if let Some(spec) = &flags.tuning {
        if flags.auto {
            bail!("--tuning and --auto are mutually exclusive");
        }
        config.tuning = TuningPlan::Manual {
            rows: parse_tuning_rows(spec).context("parsing --tuning")?,
        };
    }
    let least_favored = flags
        .least_favored
        .as_deref()
        .map(str::parse::<Stat>)
        .transpose()
        .context("parsing --least-favored")?;
    if flags.auto || least_favored.is_some() {
        if flags.tuning.is_some() {
            bail!("--least-favored only applies to auto tuning");
        }
        config.tuning = TuningPlan::Auto { least_favored };
    }
    if let Some(minor) = flags.minor_slots {
        config.minor_slots = minor;
    }
    if let Some(spec) = &flags.custom_exotic {
        let vector =
            parse_stat_pairs(spec, &StatVector::zero()).context("parsing --custom-exotic")?;
        config.custom_exotic = CustomOverride::enabled(vector);
    }
    Ok(config)
}

pub fn load_request(path: &Path) -> Result<SolverConfiguration> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    SolverConfiguration::from_json(&raw)
        .with_context(|| format!("failed to parse request {}", path.display()))
}

/// Parse `stat=value` pairs on top of `base`. The key `all` sets every stat.
pub fn parse_stat_pairs(spec: &str, base: &StatVector) -> Result<StatVector> {
    let mut out = *base;
    for token in split_csv(spec) {
        let Some((key, value)) = token.split_once('=') else {
            bail!("expected stat=value, got '{token}'");
        };
        let value: i32 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid number in '{token}'"))?;
        if key.trim().eq_ignore_ascii_case("all") {
            out = StatVector::splat(value);
        } else {
            out[key.parse::<Stat>()?] = value;
        }
    }
    Ok(out)
}

/// Parse comma-separated tuning rows: `balanced`, `none`, or a general row
/// such as `+weapons/-health`, `+weapons` or `-health`.
pub fn parse_tuning_rows(spec: &str) -> Result<TuningRows> {
    split_csv(spec).iter().map(|token| parse_tuning_row(token)).collect()
}

fn parse_tuning_row(token: &str) -> Result<TuningRow> {
    match token.to_ascii_lowercase().as_str() {
        "balanced" => return Ok(TuningRow::balanced()),
        "none" => return Ok(TuningRow::NONE),
        _ => {}
    }
    let mut plus = None;
    let mut minus = None;
    for part in token.split('/').map(str::trim) {
        if let Some(stat) = part.strip_prefix('+') {
            if plus.replace(stat.parse::<Stat>()?).is_some() {
                bail!("tuning row '{token}' names two plus stats");
            }
        } else if let Some(stat) = part.strip_prefix('-').or_else(|| part.strip_prefix('−')) {
            if minus.replace(stat.parse::<Stat>()?).is_some() {
                bail!("tuning row '{token}' names two minus stats");
            }
        } else {
            bail!("unrecognized tuning row '{token}' (expected balanced, none, or +stat/-stat)");
        }
    }
    Ok(TuningRow::general(plus, minus))
}
