use clap::Parser;

/// termbridge: serve a local shell to browser terminals over WebSocket.
#[derive(Parser, Debug)]
#[command(name = "termbridge", version, about)]
pub struct Args {
    /// Execute a command instead of the configured shell.
    #[arg(short = 'e', long)]
    pub execute: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log filter override (e.g. debug, termbridge=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Address to listen on.
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub fn parse() -> Args {
    Args::parse()
}
