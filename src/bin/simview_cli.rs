//! CLI tool for simview - filters, sorts and windows replication results
//!
//! Usage:
//!   simview_cli <results.json>                          # Print the first screen of rows
//!   simview_cli <results.json> --where effect_size>0    # Column condition (repeatable)
//!   simview_cli <results.json> --filter 0.03            # Global text search
//!   simview_cli <results.json> --sort p_value:desc      # Sort by a column
//!   simview_cli <results.json> --scroll 700 --viewport 350 --overscan 2
//!   simview_cli <results.json> --csv out.csv            # Export filtered + sorted rows
//!   simview_cli <results.json> -v                       # Debug logging (-vv for trace)

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use simview::export::write_csv;
use simview::filter::parse_condition;
use simview::{
    load_replications, Replication, RowDataset, SimviewError, SortState, Table, TableConfig,
};

const USAGE: &str = "Usage: simview_cli <results.json> [--filter TEXT] [--where COND]... \
[--sort COL[:desc]] [--scroll PX] [--viewport PX] [--overscan N] [--csv out.csv] [-v|-vv]";

/// Twenty rows at the default row estimate
const DEFAULT_VIEWPORT: f64 = 700.0;

#[derive(Default)]
struct Args {
    input: String,
    filter: Option<String>,
    conditions: Vec<String>,
    sort: Option<String>,
    scroll: f64,
    viewport: Option<f64>,
    overscan: Option<i64>,
    csv: Option<String>,
    verbosity: u8,
}

fn fail(msg: &str) -> ! {
    eprintln!("{msg}");
    std::process::exit(1);
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| {
            it.next()
                .unwrap_or_else(|| fail(&format!("Missing value for {flag}\n{USAGE}")))
        };
        match arg.as_str() {
            "--filter" => args.filter = Some(value("--filter")),
            "--where" => args.conditions.push(value("--where")),
            "--sort" => args.sort = Some(value("--sort")),
            "--scroll" => args.scroll = number(&value("--scroll"), "--scroll"),
            "--viewport" => args.viewport = Some(number(&value("--viewport"), "--viewport")),
            "--overscan" => {
                let raw = value("--overscan");
                args.overscan = Some(
                    raw.parse()
                        .unwrap_or_else(|_| fail(&format!("Invalid --overscan: {raw}"))),
                );
            }
            "--csv" => args.csv = Some(value("--csv")),
            "-v" => args.verbosity = args.verbosity.max(1),
            "-vv" => args.verbosity = 2,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with('-') => fail(&format!("Unknown flag {other}\n{USAGE}")),
            other if args.input.is_empty() => args.input = other.to_string(),
            other => fail(&format!("Unexpected argument {other}\n{USAGE}")),
        }
    }
    if args.input.is_empty() {
        fail(USAGE);
    }
    args
}

fn number(raw: &str, flag: &str) -> f64 {
    raw.parse()
        .unwrap_or_else(|_| fail(&format!("Invalid {flag}: {raw}")))
}

fn known_column(table: &Table<Replication>, id: &str) -> Result<(), SimviewError> {
    if table.columns().contains(id) {
        Ok(())
    } else {
        Err(SimviewError::UnknownColumn(id.to_string()))
    }
}

fn main() {
    let args = parse_args();

    let level = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    // Read input file
    let json = match fs::read_to_string(&args.input) {
        Ok(j) => j,
        Err(e) => fail(&format!("Error reading {}: {}", args.input, e)),
    };
    let rows = match load_replications(&json) {
        Ok(r) => r,
        Err(e) => fail(&format!("Error loading results: {e}")),
    };

    let mut config =
        TableConfig::default().with_viewport_extent(args.viewport.unwrap_or(DEFAULT_VIEWPORT));
    if let Some(overscan) = args.overscan {
        config = config.with_overscan(overscan);
    }
    let mut table = match Table::new(RowDataset::new(rows), Replication::columns(), config) {
        Ok(t) => t,
        Err(e) => fail(&format!("Error building table: {e}")),
    };

    // Filters
    if let Some(text) = &args.filter {
        table.set_global_filter(text);
    }
    for cond in &args.conditions {
        let parsed = parse_condition(cond).and_then(|(column, predicate)| {
            known_column(&table, &column)?;
            Ok((column, predicate))
        });
        match parsed {
            Ok((column, predicate)) => table.set_column_filter(&column, Some(predicate)),
            Err(e) => fail(&format!("Error in --where {cond}: {e}")),
        }
    }

    // Sort
    if let Some(spec) = &args.sort {
        let state = match spec.split_once(':') {
            Some((col, "desc")) => SortState::desc(col),
            Some((col, "asc")) | Some((col, "")) => SortState::asc(col),
            Some((_, dir)) => fail(&format!("Unknown sort direction {dir}")),
            None => SortState::asc(spec.as_str()),
        };
        if let Some(column) = &state.column {
            if let Err(e) = known_column(&table, column) {
                fail(&format!("Error in --sort {spec}: {e}"));
            }
        }
        table.set_sort(state);
    }

    table.set_scroll_offset(args.scroll);

    // Output
    if let Some(path) = &args.csv {
        let result = fs::File::create(path)
            .map_err(SimviewError::from)
            .and_then(|mut f| write_csv(&table, &mut f));
        if let Err(e) = result {
            fail(&format!("Error writing {path}: {e}"));
        }
        eprintln!("Written: {} rows to {}", table.len(), path);
        return;
    }

    let frame = table.frame();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let headers: Vec<&str> = table.columns().iter().map(|c| c.header()).collect();
    writeln!(out, "{:>6}  {}", "row", headers.join("  ")).unwrap();
    for row in &frame.rendered_rows {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.display(row.record))
            .collect();
        writeln!(out, "{:>6}  {}", row.index, cells.join("  ")).unwrap();
    }
    writeln!(
        out,
        "-- rows {}..{} of {} (padding {} / {}, scroll {} of {})",
        table.range().start,
        table.range().end,
        table.len(),
        frame.padding_top,
        frame.padding_bottom,
        frame.scroll_offset,
        frame.total_extent
    )
    .unwrap();
}
