use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mpdump::{Report, ReportFormatter, Snapshot};

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode memory protection register snapshots")]
struct Opts {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a snapshot file
    Report {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long)]
        json: bool,

        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Print a power-on snapshot to start from
    Template,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    match opts.command {
        Command::Report { file, json, no_color } => {
            let snapshot = Snapshot::load(&file)?;
            let memprot = snapshot.to_memprot();
            let report = Report::decode(&memprot)
                .with_context(|| format!("decoding {}", file.display()))?;

            let formatter = ReportFormatter::new(!no_color);
            if json {
                println!("{}", formatter.render_json(&report)?);
            } else {
                print!("{}", formatter.render_text(&report));
            }
        }
        Command::Template => {
            println!("{}", Snapshot::power_on().to_json()?);
        }
    }

    Ok(())
}
