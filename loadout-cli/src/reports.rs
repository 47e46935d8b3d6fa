use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use loadout_core::{SolveResponse, SolverConfiguration, Stat};

use crate::scenarios::ScenarioResult;
use crate::sweep::SweepSummary;

#[derive(Serialize)]
struct SolveReport<'a> {
    generated_at: String,
    request: &'a SolverConfiguration,
    response: &'a SolveResponse,
}

pub fn generate_solve_console_report(
    out: &mut impl Write,
    config: &SolverConfiguration,
    response: &SolveResponse,
    duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🛡  Loadout Recommendation".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;
    let status = if response.feasible {
        "✅ FEASIBLE".green()
    } else {
        "⚠️  INFEASIBLE (closest loadout)".yellow()
    };
    writeln!(out, "Status: {status}")?;
    writeln!(out, "Request: {:016x}", response.fingerprint)?;
    writeln!(
        out,
        "Beam width: {}  Solve time: {duration:?}",
        response.beam_width
    )?;
    writeln!(out)?;

    writeln!(out, "{}", "Pieces".bold())?;
    for (i, piece) in response.chosen_pieces.iter().enumerate() {
        let label = piece.archetype.to_string();
        let label = if piece.archetype.is_exotic() {
            label.bright_yellow()
        } else {
            label.normal()
        };
        match &piece.boost {
            Some(boost) => writeln!(out, "  {}. {label}  + {boost}", i + 1)?,
            None => writeln!(out, "  {}. {label}", i + 1)?,
        }
    }
    writeln!(out)?;

    writeln!(out, "{}", "Tuning".bold())?;
    let active = response.active_tuning_rows();
    if active.is_empty() {
        writeln!(out, "  None")?;
    }
    for row in &active {
        writeln!(out, "  • {row}")?;
    }
    for (i, picks) in response
        .balanced_trace(&config.fragments)
        .iter()
        .enumerate()
    {
        let names: Vec<&str> = picks.iter().map(|s| s.as_str()).collect();
        writeln!(out, "  Balanced #{}: +1 {}", i + 1, names.join(", "))?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{}",
        format!("{:<8} {:>6} {:>6} {:>6}", "Stat", "Target", "Final", "Raw").bold()
    )?;
    for stat in Stat::ALL {
        let target = config.targets[stat];
        let total = response.totals_final[stat];
        let line = format!(
            "{:<8} {:>6} {:>6} {:>6}",
            stat.label(),
            target,
            total,
            response.totals_raw[stat]
        );
        if total >= target {
            writeln!(out, "{}", line.green())?;
        } else {
            writeln!(out, "{}", line.red())?;
        }
    }
    Ok(())
}

pub fn generate_solve_json_report(
    out: &mut impl Write,
    config: &SolverConfiguration,
    response: &SolveResponse,
) -> Result<()> {
    let report = SolveReport {
        generated_at: Utc::now().to_rfc3339(),
        request: config,
        response,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_solve_markdown_report(
    out: &mut impl Write,
    config: &SolverConfiguration,
    response: &SolveResponse,
) -> Result<()> {
    writeln!(out, "# Loadout Recommendation\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(
        out,
        "- **Status**: {}",
        if response.feasible {
            "✅ feasible"
        } else {
            "❌ infeasible"
        }
    )?;
    writeln!(out, "- **Request**: `{:016x}`", response.fingerprint)?;
    writeln!(out, "- **Beam width**: {}\n", response.beam_width)?;

    writeln!(out, "## Pieces\n")?;
    writeln!(out, "| # | Piece | Boost |")?;
    writeln!(out, "|---|-------|-------|")?;
    for (i, piece) in response.chosen_pieces.iter().enumerate() {
        let boost = piece
            .boost
            .map_or_else(|| "-".to_string(), |b| b.to_string());
        writeln!(out, "| {} | {} | {boost} |", i + 1, piece.archetype)?;
    }

    writeln!(out, "\n## Tuning\n")?;
    let active = response.active_tuning_rows();
    if active.is_empty() {
        writeln!(out, "_None_")?;
    }
    for row in &active {
        writeln!(out, "- {row}")?;
    }

    writeln!(out, "\n## Totals\n")?;
    writeln!(out, "| Stat | Target | Final | Raw |")?;
    writeln!(out, "|------|--------|-------|-----|")?;
    for stat in Stat::ALL {
        writeln!(
            out,
            "| {} | {} | {} | {} |",
            stat.label(),
            config.targets[stat],
            response.totals_final[stat],
            response.totals_raw[stat]
        )?;
    }
    Ok(())
}

pub fn generate_scenario_console_report(
    out: &mut impl Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Scenario Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{status} {} [{}]", result.scenario_name.bold(), result.key)?;
        writeln!(
            out,
            "   {} at width {} in {:?}",
            if result.feasible { "feasible" } else { "infeasible" },
            result.beam_width,
            result.duration
        )?;
        for failure in &result.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }

    if let Some(slowest) = results.iter().max_by_key(|r| r.duration) {
        writeln!(out)?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.duration
        )?;
    }
    Ok(())
}

pub fn generate_scenario_json_report(
    out: &mut impl Write,
    results: &[ScenarioResult],
) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_scenario_markdown_report(
    out: &mut impl Write,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# Loadout Scenario Results\n")?;
    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}\n", total - passed)?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(out, "### {status} {}\n", result.scenario_name)?;
        writeln!(out, "- **Key**: `{}`", result.key)?;
        writeln!(out, "- **Feasible**: {}", result.feasible)?;
        writeln!(out, "- **Beam width**: {}", result.beam_width)?;
        writeln!(out, "- **Time**: {:?}", result.duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_sweep_console_report(
    out: &mut impl Write,
    summaries: &[SweepSummary],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🎲 Property Sweep Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=========================".cyan())?;
    for summary in summaries {
        let status = if summary.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} seed {}: {}/{} feasible, {} violations, {} monotonicity warnings",
            summary.seed,
            summary.feasible,
            summary.iterations,
            summary.violations,
            summary.monotonicity_warnings
        )?;
        for record in &summary.records {
            for violation in &record.violations {
                writeln!(
                    out,
                    "     • #{} {}: {}",
                    record.iteration,
                    record.fingerprint,
                    violation.red()
                )?;
            }
            if let Some(warning) = &record.monotonicity_warning {
                writeln!(out, "     ⚠ #{} {}", record.iteration, warning.yellow())?;
            }
        }
    }
    writeln!(out, "Total time: {total_duration:?}")?;
    Ok(())
}

pub fn generate_sweep_json_report(out: &mut impl Write, summaries: &[SweepSummary]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, summaries)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_sweep_markdown_report(
    out: &mut impl Write,
    summaries: &[SweepSummary],
) -> Result<()> {
    writeln!(out, "# Loadout Property Sweep\n")?;
    writeln!(out, "| Seed | Iterations | Feasible | Violations | Monotonicity warnings |")?;
    writeln!(out, "|------|------------|----------|------------|-----------------------|")?;
    for summary in summaries {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            summary.seed,
            summary.iterations,
            summary.feasible,
            summary.violations,
            summary.monotonicity_warnings
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_core::{SearchConfig, Solver, StatVector};

    fn sample() -> (SolverConfiguration, SolveResponse) {
        let config = SolverConfiguration::with_targets(StatVector::splat(30));
        let mut solver = Solver::new(SearchConfig::with_beam_widths(&[10])).unwrap();
        let response = solver.solve(&config).unwrap();
        (config, response)
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            key: "all-zero".to_string(),
            scenario_name: "All-Zero Targets".to_string(),
            passed,
            feasible: true,
            beam_width: 10,
            fingerprint: "0000000000000001".to_string(),
            failures: if passed {
                Vec::new()
            } else {
                vec!["failure".to_string()]
            },
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn solve_json_report_embeds_request_and_response() {
        let (config, response) = sample();
        let mut buf = Vec::new();
        generate_solve_json_report(&mut buf, &config, &response).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["request"]["targets"]["weapons"], 30);
        assert_eq!(value["response"]["feasible"], true);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn solve_markdown_report_lists_every_stat() {
        let (config, response) = sample();
        let mut buf = Vec::new();
        generate_solve_markdown_report(&mut buf, &config, &response).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for stat in Stat::ALL {
            assert!(text.contains(&format!("| {} |", stat.label())));
        }
        assert!(text.contains("✅ feasible"));
    }

    #[test]
    fn solve_console_report_names_pieces() {
        colored::control::set_override(false);
        let (config, response) = sample();
        let mut buf = Vec::new();
        generate_solve_console_report(&mut buf, &config, &response, Duration::ZERO).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("FEASIBLE"));
        for piece in &response.chosen_pieces {
            assert!(text.contains(&piece.archetype.to_string()));
        }
    }

    #[test]
    fn scenario_reports_count_failures() {
        colored::control::set_override(false);
        let results = [sample_result(true), sample_result(false)];
        let mut console = Vec::new();
        generate_scenario_console_report(&mut console, &results, Duration::ZERO).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert!(text.contains("Failed: 1"));

        let mut markdown = Vec::new();
        generate_scenario_markdown_report(&mut markdown, &results).unwrap();
        let text = String::from_utf8(markdown).unwrap();
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("  - failure"));

        let mut json = Vec::new();
        generate_scenario_json_report(&mut json, &results).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value[1]["duration"], 10);
    }
}
