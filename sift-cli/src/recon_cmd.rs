use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use sift_core::{Archive, CustomerMatcher, CustomerRecord, Transaction, time::parse_date};
use sift_ingest::{
    ProcessedMarker, paths_for, read_transactions, scan_archives, write_transactions,
    write_transactions_to,
};
use sift_recon::{
    InvoicePattern, Pipeline, SumFinder, by_customer, by_min_amount, by_period, isolate_newest,
    merge_archives, open_items,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archives_cmd::{SelectArgs, print_selection};
use crate::config::{Config, ReconSection};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,

    /// Customer directory (default: [directory] path in config)
    #[arg(long)]
    pub customers: Option<PathBuf>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Write CSV here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Update the processed marker afterwards
    #[arg(long)]
    pub touch: bool,
}

/// Row filters applied after merging.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep bookings on or after this date
    #[arg(long)]
    pub since: Option<String>,

    /// Keep bookings on or before this date
    #[arg(long)]
    pub until: Option<String>,

    #[arg(long)]
    pub min_amount: Option<f64>,

    #[arg(long)]
    pub customer_id: Option<String>,

    /// File of booked invoice numbers, one per line; keep only open items
    #[arg(long)]
    pub known: Option<PathBuf>,
}

impl FilterArgs {
    pub fn apply(&self, mut txns: Vec<Transaction>, recon: &ReconSection) -> Result<Vec<Transaction>> {
        if self.since.is_some() || self.until.is_some() {
            let from = self.since.as_deref().map(parse_date).transpose()?.unwrap_or(NaiveDate::MIN);
            let to = self.until.as_deref().map(parse_date).transpose()?.unwrap_or(NaiveDate::MAX);
            txns = by_period(&txns, from, to);
        }
        if let Some(min) = self.min_amount {
            txns = by_min_amount(&txns, min);
        }
        if let Some(id) = &self.customer_id {
            txns = by_customer(&txns, id);
        }
        if let Some(path) = &self.known {
            let known = read_known_invoices(path)?;
            let pattern = InvoicePattern::new(&recon.invoice_pattern)?;
            txns = open_items(&txns, &known, &pattern);
        }
        Ok(txns)
    }
}

fn read_known_invoices(path: &Path) -> Result<Vec<String>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Extracted statement next to its archive: `<archive file name>.csv`.
fn extract_path(archive: &Path) -> PathBuf {
    let mut s = archive.as_os_str().to_owned();
    s.push(".csv");
    PathBuf::from(s)
}

/// Rows of one transaction CSV; rows without a source archive get the file stem.
fn read_labelled(path: &Path) -> Result<Vec<Transaction>> {
    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let rows = read_transactions(path)?;
    Ok(rows
        .into_iter()
        .map(|t| {
            if t.source_archive.is_some() {
                t
            } else {
                t.with_source_archive(label.clone())
            }
        })
        .collect())
}

fn emit(txns: &[Transaction], output: Option<&Path>) -> Result<()> {
    match output {
        Some(p) => {
            write_transactions(p, txns)?;
            println!("Wrote {} transactions to {}", txns.len(), p.display());
        }
        None => write_transactions_to(std::io::stdout().lock(), txns)?,
    }
    Ok(())
}

pub fn run_pipeline(
    args: &RunArgs,
    customers: &[CustomerRecord],
    cfg: &Config,
    today: NaiveDate,
) -> Result<()> {
    let files = scan_archives(&args.dir)?;
    let archives: Vec<Archive> = files.iter().map(|f| f.archive.clone()).collect();

    let extractor = |archive: &Archive| -> Result<Vec<Transaction>> {
        let Some(path) = paths_for(&files, std::slice::from_ref(archive)).into_iter().next() else {
            bail!("{} not found in {}", archive.filename, args.dir.display());
        };
        let sidecar = extract_path(path);
        read_transactions(&sidecar)
            .with_context(|| format!("no extracted statement at {}", sidecar.display()))
    };

    let matcher = CustomerMatcher::new(cfg.matcher.scoring.clone());
    let mut pipeline = Pipeline::new(args.select.policy(&cfg.coverage)?, matcher, extractor);
    let out = pipeline.run(&archives, customers, today)?;

    if args.output.is_some() {
        print_selection(&out.selection, archives.len());
        println!(
            "Merged {} transactions ({} duplicates dropped)",
            out.dedup.kept, out.dedup.dropped
        );
    }
    for gap in &out.selection.gaps {
        tracing::warn!(from = %gap.from, to = %gap.to, "statements missing for these days");
    }

    let rows = args.filters.apply(out.transactions, &cfg.recon)?;
    emit(&rows, args.output.as_deref())?;

    if args.touch {
        ProcessedMarker::in_dir(&args.dir).touch()?;
    }
    Ok(())
}

pub fn run_merge(
    inputs: &[PathBuf],
    customers: Option<&[CustomerRecord]>,
    filters: &FilterArgs,
    cfg: &Config,
    output: Option<&Path>,
) -> Result<()> {
    let matcher = CustomerMatcher::new(cfg.matcher.scoring.clone());
    let mut batches = Vec::with_capacity(inputs.len());
    for input in inputs {
        let rows = read_labelled(input)?;
        let rows = match customers {
            Some(c) => matcher.assign_customer_ids(&rows, c),
            None => rows,
        };
        batches.push(rows);
    }

    let merged = merge_archives(&batches);
    tracing::info!(inputs = inputs.len(), merged = merged.len(), "inputs merged");
    let rows = filters.apply(merged, &cfg.recon)?;
    emit(&rows, output)
}

pub fn run_newest(inputs: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let mut all = Vec::new();
    for input in inputs {
        all.extend(read_labelled(input)?);
    }
    let Some(batch) = isolate_newest(&all) else {
        bail!("no transactions in {} input file(s)", inputs.len());
    };
    tracing::info!(
        archive = %batch.archive,
        previous = batch.previous.as_deref().unwrap_or("-"),
        new = batch.transactions.len(),
        "newest archive"
    );
    emit(&batch.transactions, output)
}

pub fn run_sums(target: f64, amounts: &[f64]) -> Result<()> {
    let finder = SumFinder::new(amounts)?;
    let Some(m) = finder.nearest(target)? else {
        bail!("need at least two amounts");
    };
    let combination: Vec<String> = m.combination().iter().map(|a| format!("{a:.2}")).collect();

    println!("Target:      {target:.2}");
    println!("Nearest sum: {:.2}", m.sum());
    println!("Combination: {}", combination.join(" + "));
    println!("Summands:    {}", m.count());
    println!("Difference:  {:.2}", m.difference());
    Ok(())
}
