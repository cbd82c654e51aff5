//! Main entry point for the runzim CLI application.
//!
//! Opens an archive once and either holds it open until shutdown, lists its
//! index, prints entries to stdout, or extracts them to a directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use runzim::{Archive, Cli};

/// Application entry point.
///
/// Archive work is blocking file I/O, so it runs on tokio's blocking pool;
/// the async side only waits for it or for the shutdown signal.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    // Fail fast: nothing else runs if the archive cannot be opened
    let path = PathBuf::from(&cli.file);
    let archive = tokio::task::spawn_blocking({
        let path = path.clone();
        move || Archive::open(&path)
    })
    .await?
    .with_context(|| format!("cannot open archive '{}'", path.display()))?;

    if cli.is_hold() {
        return hold(archive).await;
    }

    tokio::task::spawn_blocking(move || process_archive(archive, &cli)).await?
}

/// Keep the archive open for the life of the process, releasing it on Ctrl-C.
///
/// # Arguments
///
/// * `archive` - The opened archive; closed once the shutdown signal arrives
///
/// # Returns
///
/// Returns `Ok(())` after a clean shutdown, or an error if the signal
/// handler cannot be installed.
async fn hold(mut archive: Archive) -> Result<()> {
    info!(
        path = %archive.path().display(),
        entries = archive.index()?.len(),
        "Archive ready; press Ctrl-C to close"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    archive.close();
    info!("Shutting down");
    Ok(())
}

/// Run the listing, pipe or extraction mode selected on the command line.
///
/// Entry selection (`ENTRIES` and `-x`) applies to pipe and extract modes;
/// listings always show the whole index.
///
/// # Arguments
///
/// * `archive` - The opened archive; closed before returning
/// * `cli` - Parsed command-line arguments
///
/// # Returns
///
/// Returns `Ok(())` on success, or the first error hit while reading or
/// writing entries.
fn process_archive(mut archive: Archive, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        list_entries(&archive, cli.verbose)?;
    } else if cli.pipe {
        pipe_entries(&mut archive, cli)?;
    } else if let Some(ref dir) = cli.extract_dir {
        archive
            .extractor()
            .extract_matching(Path::new(dir), |name| cli.selects(name))?;
    }

    archive.close();
    Ok(())
}

/// List entries in the archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): just entry names, one per line
/// - Verbose format (`-v`): header details plus a table of ranges and methods
///
/// # Arguments
///
/// * `archive` - The opened archive
/// * `verbose` - If true, print the header and a detailed table
///
/// # Returns
///
/// Returns `Ok(())` on success, or [`runzim::Error::HandleClosed`] if the
/// archive was already closed.
fn list_entries(archive: &Archive, verbose: bool) -> Result<()> {
    let index = archive.index()?;

    if verbose {
        let header = archive.header()?;
        println!("Archive:  {}", archive.path().display());
        println!("Version:  {}", header.version);
        println!("Created:  {} (Unix time)", header.unix_timestamp());
        println!();
        println!(
            "{:>12}  {:>10}  {:>7}  {:>8}  Name",
            "Offset", "Size", "Method", "CRC-32"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_size = 0u64;

    for (name, entry) in index.sorted() {
        if verbose {
            let crc = entry
                .checksum
                .map(|c| format!("{c:08x}"))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:>12}  {:>10}  {:>7}  {:>8}  {}",
                entry.offset,
                entry.size,
                entry.compression.name(),
                crc,
                name
            );
            total_size += entry.size;
        } else {
            println!("{name}");
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>12}  {:>10}  {:>7}  {:>8}  {} entries",
            "",
            total_size,
            "",
            "",
            index.len()
        );
    }

    Ok(())
}

/// Write the selected entries' contents to stdout.
///
/// With more than one entry, each is preceded by a `--- name ---` marker.
///
/// # Arguments
///
/// * `archive` - The opened archive
/// * `cli` - Parsed command-line arguments, used to select entries
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if an entry cannot be read or
/// stdout cannot be written.
fn pipe_entries(archive: &mut Archive, cli: &Cli) -> Result<()> {
    let names: Vec<String> = archive
        .index()?
        .sorted()
        .into_iter()
        .filter(|(name, _)| cli.selects(name))
        .map(|(name, _)| name.to_string())
        .collect();

    let show_names = names.len() > 1;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for name in &names {
        if show_names {
            writeln!(out, "--- {name} ---")?;
        }
        archive.extractor().extract_to_writer(name, &mut out)?;
    }
    out.flush()?;

    Ok(())
}
