use clap::{Parser, builder::styling::AnsiColor};

/// memscan – attach to a running process and resolve its scan target.
///
/// This binary is the thin CLI collaborator around `libmemscan`: argument
/// parsing, process resolution, printing, exit codes. All scanning logic
/// (region discovery, pattern search, the narrowing engine) lives in the
/// library.
#[derive(Parser, Debug)]
#[command(
    name = "memscan",
    bin_name = "memscan",
    about = "Attach to a running process for memory scanning",
    version,
    styles = clap::builder::Styles::styled()
        .header(AnsiColor::BrightYellow.on_default())
        .usage(AnsiColor::BrightYellow.on_default())
        .literal(AnsiColor::BrightGreen.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
)]
pub struct Cli {
    /// Attach to the first process whose name begins with this prefix
    /// (case-insensitive), or to a bare PID.
    #[arg(long, value_name = "NAME", conflicts_with = "print")]
    pub attach: Option<String>,

    /// Print the resolved configuration and exit without opening a process.
    #[arg(long, conflicts_with = "attach")]
    pub print: bool,
}
