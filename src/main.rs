use scratchcalc::*;
use std::io::BufRead;
use std::path::PathBuf;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

/// Notepad calculator: annotates each line of a document with its result
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Document to evaluate; lines are read from stdin when omitted
    path: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = Format::Plain)]
    format: Format,

    /// Re-evaluate the document whenever the file changes
    #[arg(long, short, requires = "path")]
    watch: bool,

    /// Date bound to `today` (YYYY-MM-DD) instead of the current date
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut notepad = match args.today {
        Some(today) => Notepad::with_today(today),
        None => Notepad::new()
    };

    match args.path {
        Some(path) if args.watch => {
            watch::watch(&path, &mut notepad, |lines| {
                println!("{}\n", render(lines, args.format)?);
                Ok(())
            })
        },
        Some(path) => {
            let document = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            println!("{}", render(&notepad.run(&document), args.format)?);
            Ok(())
        },
        None => {
            // Each line typed extends the document, which is re-run in full, as an editor would.
            let stdin = std::io::stdin();
            let mut typed = vec![];
            for line in stdin.lock().lines() {
                typed.push(line?);
                if let Some(last) = notepad.run(&typed.join("\n")).last() {
                    println!("{}", render_line(last, args.format)?);
                }
            }
            Ok(())
        }
    }
}
