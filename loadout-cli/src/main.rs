mod reports;
mod request;
mod scenarios;
mod sweep;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use loadout_core::{SearchConfig, Solver};
use request::{RequestFlags, build_request, split_csv};
use scenarios::{list_scenarios, run_scenarios, select_scenarios};
use sweep::run_sweep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Solve one request and print the recommended loadout
    Solve,
    /// Run the named scenario catalog
    Scenarios,
    /// Check solver invariants on seeded random requests
    Sweep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "loadout", version)]
#[command(about = "Recommend five-piece armor loadouts that meet per-stat targets")]
struct Args {
    /// What to run
    #[arg(long, value_enum, default_value_t = Mode::Solve)]
    mode: Mode,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON request file; inline flags are applied on top of it
    #[arg(long)]
    request: Option<PathBuf>,

    /// Targets as stat=value pairs, e.g. weapons=100,health=80 (all=N sets every stat)
    #[arg(long)]
    targets: Option<String>,

    /// Fragments as stat=value pairs in steps of 10 between -30 and 30
    #[arg(long, allow_hyphen_values = true)]
    fragments: Option<String>,

    /// Manual tuning rows, e.g. "+weapons/-health,balanced"
    #[arg(long, allow_hyphen_values = true)]
    tuning: Option<String>,

    /// Derive tuning rows automatically
    #[arg(long)]
    auto: bool,

    /// Stat auto tuning may only take from (implies --auto)
    #[arg(long)]
    least_favored: Option<String>,

    /// Boost slots restricted to minor boosts
    #[arg(long)]
    minor_slots: Option<usize>,

    /// Replace catalog exotics with this stat spread, e.g. health=30,class=20
    #[arg(long)]
    custom_exotic: Option<String>,

    /// Beam widths tried in order (comma-separated)
    #[arg(long)]
    beam_widths: Option<String>,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Sweep seeds (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Random requests per sweep seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn request_flags(&self) -> RequestFlags {
        RequestFlags {
            request: self.request.clone(),
            targets: self.targets.clone(),
            fragments: self.fragments.clone(),
            tuning: self.tuning.clone(),
            auto: self.auto,
            least_favored: self.least_favored.clone(),
            minor_slots: self.minor_slots,
            custom_exotic: self.custom_exotic.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.output.is_some() {
        colored::control::set_override(false);
    }

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    let search = search_config(&args)?;
    let passed = match args.mode {
        Mode::Solve => solve_mode(&args, &search)?,
        Mode::Scenarios => scenarios_mode(&args, &search)?,
        Mode::Sweep => sweep_mode(&args, &search)?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_module("loadout_core", log::LevelFilter::Debug);
    }
    builder.init();
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_scenario_list(output_target.writer())?;
    output_target.flush_inner()?;
    Ok(true)
}

fn write_scenario_list(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(out, "  {key:22} - {description}")?;
    }
    Ok(())
}

fn announce_banner(args: &Args) {
    if args.report != ReportFormat::Console || args.output.is_some() {
        return;
    }
    println!("{}", "🛡  Loadout Solver".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn search_config(args: &Args) -> Result<SearchConfig> {
    let Some(spec) = &args.beam_widths else {
        return Ok(SearchConfig::default());
    };
    let widths = parse_widths(spec)?;
    let search = SearchConfig::with_beam_widths(&widths);
    search.validate().context("invalid --beam-widths")?;
    Ok(search)
}

fn parse_widths(spec: &str) -> Result<Vec<usize>> {
    split_csv(spec)
        .iter()
        .map(|token| {
            token
                .parse::<usize>()
                .with_context(|| format!("invalid beam width '{token}'"))
        })
        .collect()
}

fn parse_seeds(spec: &str) -> Result<Vec<u64>> {
    let seeds: Vec<u64> = split_csv(spec)
        .iter()
        .map(|token| {
            let parsed = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => token.parse::<u64>(),
            };
            parsed.with_context(|| format!("invalid seed '{token}'"))
        })
        .collect::<Result<_>>()?;
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}

fn solve_mode(args: &Args, search: &SearchConfig) -> Result<bool> {
    let config = build_request(&args.request_flags())?;
    let mut solver = Solver::new(search.clone())?;
    announce_banner(args);

    let start = Instant::now();
    let response = solver
        .solve(&config)
        .context("solve request rejected")?;
    let duration = start.elapsed();
    log::info!(
        "solved {:016x} in {duration:?} (cache hits {}, misses {})",
        response.fingerprint,
        solver.tuner().hits(),
        solver.tuner().misses()
    );

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => {
            reports::generate_solve_json_report(&mut output_target, &config, &response)?;
        }
        ReportFormat::Markdown => {
            reports::generate_solve_markdown_report(&mut output_target, &config, &response)?;
        }
        ReportFormat::Console => {
            reports::generate_solve_console_report(
                &mut output_target,
                &config,
                &response,
                duration,
            )?;
        }
    }
    output_target.flush_inner()?;

    // An unreachable target set is still a successful solve.
    Ok(true)
}

fn scenarios_mode(args: &Args, search: &SearchConfig) -> Result<bool> {
    let keys = split_csv(&args.scenarios);
    let (selected, unknown) = select_scenarios(&keys);
    for key in &unknown {
        eprintln!("⚠️  Unknown scenario: {}", key.yellow());
    }
    announce_banner(args);
    if args.verbose {
        println!("{}", "🧪 Running Scenarios".bright_yellow().bold());
    }

    let start = Instant::now();
    let results = run_scenarios(&selected, search, args.verbose)?;
    let duration = start.elapsed();

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_scenario_json_report(&mut output_target, &results)?,
        ReportFormat::Markdown => {
            reports::generate_scenario_markdown_report(&mut output_target, &results)?;
        }
        ReportFormat::Console => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_scenario_console_report(&mut output_target, &results, duration)?;
            }
        }
    }
    output_target.flush_inner()?;

    Ok(unknown.is_empty() && results.iter().all(|r| r.passed))
}

fn sweep_mode(args: &Args, search: &SearchConfig) -> Result<bool> {
    let seeds = parse_seeds(&args.seeds)?;
    announce_banner(args);
    if args.verbose {
        println!("{}", "🎲 Running Property Sweep".bright_yellow().bold());
    }

    let start = Instant::now();
    let summaries = run_sweep(&seeds, args.iterations, search, args.verbose)?;
    let duration = start.elapsed();

    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_sweep_json_report(&mut output_target, &summaries)?,
        ReportFormat::Markdown => {
            reports::generate_sweep_markdown_report(&mut output_target, &summaries)?;
        }
        ReportFormat::Console => {
            reports::generate_sweep_console_report(&mut output_target, &summaries, duration)?;
        }
    }
    output_target.flush_inner()?;

    Ok(summaries.iter().all(sweep::SweepSummary::passed))
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: Mode::Solve,
            report: ReportFormat::Json,
            output: None,
            request: None,
            targets: None,
            fragments: None,
            tuning: None,
            auto: false,
            least_favored: None,
            minor_slots: None,
            custom_exotic: None,
            beam_widths: None,
            scenarios: "all".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            verbose: false,
        }
    }

    #[test]
    fn parses_flags_into_args() {
        let args = Args::parse_from([
            "loadout",
            "--targets",
            "weapons=120",
            "--fragments",
            "class=-10",
            "--tuning",
            "-health",
            "--report",
            "markdown",
        ]);
        assert_eq!(args.report, ReportFormat::Markdown);
        assert_eq!(args.fragments.as_deref(), Some("class=-10"));
        assert_eq!(args.tuning.as_deref(), Some("-health"));
        let config = build_request(&args.request_flags()).unwrap();
        assert_eq!(config.targets[loadout_core::Stat::Weapons], 120);
        assert!(!config.tuning.is_auto());
    }

    #[test]
    fn default_search_uses_standard_widths() {
        let search = search_config(&base_args()).unwrap();
        assert_eq!(search, SearchConfig::default());
    }

    #[test]
    fn beam_widths_must_ascend() {
        let mut args = base_args();
        args.beam_widths = Some("100,50".to_string());
        assert!(search_config(&args).is_err());
        args.beam_widths = Some("10, 20".to_string());
        assert_eq!(search_config(&args).unwrap().beam_widths, vec![10, 20]);
        args.beam_widths = Some("wide".to_string());
        assert!(search_config(&args).is_err());
    }

    #[test]
    fn seeds_accept_hex_and_decimal() {
        assert_eq!(parse_seeds("1, 0x10").unwrap(), vec![1, 16]);
        assert!(parse_seeds("").is_err());
        assert!(parse_seeds("seed").is_err());
    }

    #[test]
    fn scenario_list_has_one_line_per_key() {
        let mut buffer = Vec::new();
        write_scenario_list(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let listed: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|line| line.split(" - ").next())
            .map(str::trim)
            .collect();
        let keys: Vec<&str> = list_scenarios().into_iter().map(|(key, _)| key).collect();
        assert_eq!(listed, keys);
    }

    #[test]
    fn output_target_writes_to_file() {
        let path = std::env::temp_dir().join(format!(
            "loadout-output-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target, "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello\n");
    }
}
