//! Colored terminal output.

use std::fmt::Write;

use colored::*;

use crate::model::{FunctionMetrics, ProjectReport};

use super::Renderer;

const TOP_FILES: usize = 10;

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn format(&self) -> &'static str {
        "text"
    }

    fn render(&self, report: &ProjectReport) -> anyhow::Result<String> {
        let mut out = String::new();

        writeln!(out)?;
        writeln!(
            out,
            "  {} v{}",
            "codepulse".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out)?;
        writeln!(out, "  {}{}", "Root:      ".dimmed(), report.root_path)?;
        writeln!(
            out,
            "  {}{}",
            "Generated: ".dimmed(),
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(out)?;

        write_project(&mut out, report)?;
        write_hotspots(&mut out, report)?;
        write_top_files(&mut out, report)?;
        write_functions(&mut out, report)?;
        write_smells(&mut out, report)?;
        write_warnings(&mut out, report)?;

        Ok(out)
    }
}

fn colored_ccn(ccn: usize) -> ColoredString {
    match ccn {
        c if c > 20 => c.to_string().red().bold(),
        c if c > 10 => c.to_string().yellow(),
        c => c.to_string().green(),
    }
}

fn pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}

fn write_project(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    let p = &report.project;
    writeln!(out, "  {}", "Project".bold())?;
    writeln!(out, "    Files:               {}", p.total_files)?;
    writeln!(out, "    Functions:           {}", p.total_functions)?;
    writeln!(
        out,
        "    CCN avg / max:       {:.2} / {}",
        p.avg_ccn_per_function,
        colored_ccn(p.max_ccn_per_function)
    )?;
    writeln!(
        out,
        "    CCN > 10 / > 20:     {} / {}",
        pct(p.functions_ccn_gt10_pct),
        pct(p.functions_ccn_gt20_pct)
    )?;
    writeln!(
        out,
        "    Size median / p95:   {:.1} / {:.1}",
        p.median_function_size, p.p95_function_size
    )?;
    writeln!(
        out,
        "    Size > 50/80/100:    {} / {} / {}",
        p.functions_gt50_lines, p.functions_gt80_lines, p.functions_gt100_lines
    )?;
    writeln!(
        out,
        "    Params avg / >= 5:   {:.2} / {}",
        p.avg_params_per_function, p.functions_params_ge5
    )?;
    writeln!(out, "    Comment density:     {}", pct(p.comment_density_avg))?;
    if p.git_total_commits > 0 {
        writeln!(
            out,
            "    Git:                 {} commits, {} / {}",
            p.git_total_commits,
            format!("+{}", p.git_total_lines_added).green(),
            format!("-{}", p.git_total_lines_deleted).red()
        )?;
    }
    writeln!(out)
}

fn write_hotspots(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    if report.hotspots.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {} ({}):", "Hotspots".bold(), report.hotspots.len())?;
    for h in &report.hotspots {
        writeln!(
            out,
            "    {:>8.2}  {}  {}",
            h.score,
            h.file_path.blue(),
            format!("(CCN {}, churn {})", h.ccn, h.churn).dimmed()
        )?;
    }
    writeln!(out)
}

fn write_top_files(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    if report.files.is_empty() {
        return Ok(());
    }
    let mut files: Vec<_> = report.files.iter().collect();
    files.sort_by(|a, b| b.summary.ccn_total.cmp(&a.summary.ccn_total));

    writeln!(out, "  {}", "Files by complexity".bold())?;
    writeln!(
        out,
        "    {}",
        format!("{:>6} {:>6} {:>6}  path", "ccn", "nloc", "funcs").dimmed()
    )?;
    for f in files.into_iter().take(TOP_FILES) {
        writeln!(
            out,
            "    {:>6} {:>6} {:>6}  {}",
            f.summary.ccn_total,
            f.summary.nloc,
            f.summary.functions_count,
            f.path.blue()
        )?;
    }
    writeln!(out)
}

fn write_functions(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    let mut functions: Vec<&FunctionMetrics> =
        report.files.iter().flat_map(|f| f.functions.iter()).collect();
    if functions.is_empty() {
        return Ok(());
    }
    functions.sort_by(|a, b| b.ccn.cmp(&a.ccn).then(b.nloc.cmp(&a.nloc)));

    writeln!(out, "  {} ({}):", "Functions".bold(), functions.len())?;
    writeln!(
        out,
        "    {}",
        format!(
            "{:>4} {:>5} {:>5} {:>6} {:>4} {:>4}  function",
            "ccn", "cog", "nloc", "params", "in", "out"
        )
        .dimmed()
    )?;
    for f in functions {
        // Pad before coloring so ANSI codes don't break alignment.
        let ccn = format!("{:>4}", f.ccn);
        let ccn = match f.ccn {
            c if c > 20 => ccn.red().bold(),
            c if c > 10 => ccn.yellow(),
            _ => ccn.normal(),
        };
        writeln!(
            out,
            "    {} {:>5} {:>5} {:>6} {:>4} {:>4}  {} {}",
            ccn,
            f.cognitive_complexity,
            f.nloc,
            f.parameters,
            f.fan_in,
            f.fan_out,
            f.name,
            format!("{}:{}", f.file_path, f.start_line).dimmed()
        )?;
    }
    writeln!(out)
}

fn write_smells(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    let smells: Vec<_> = report.files.iter().flat_map(|f| f.smells.iter()).collect();
    if smells.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {} ({}):", "Smells".bold(), smells.len())?;
    for s in smells {
        write!(out, "    {:<16} {}", s.kind.as_str().yellow(), s.file_path.blue())?;
        if let Some(line) = s.line {
            write!(out, "{}", format!(":{}", line).dimmed())?;
        }
        writeln!(out)?;
        match &s.function {
            Some(func) => writeln!(out, "            {}: {}", func, s.description)?,
            None => writeln!(out, "            {}", s.description)?,
        }
    }
    writeln!(out)
}

fn write_warnings(out: &mut String, report: &ProjectReport) -> std::fmt::Result {
    if report.warnings.is_empty() {
        return Ok(());
    }
    writeln!(out, "  {} ({}):", "Warnings".bold(), report.warnings.len())?;
    for w in &report.warnings {
        writeln!(out, "    {} {}", "WARN".yellow(), w)?;
    }
    writeln!(out)
}
