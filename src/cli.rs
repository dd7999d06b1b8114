//! Command line interface for the `remotewire` binary.
//!
//! Kept free of crate types so the build script can render a man page from
//! it.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments for the `remotewire` binary.
#[derive(Debug, Parser)]
#[command(name = "remotewire", version, about = "Remote control client for a networked media player")]
pub struct Cli {
    /// Player host name or address.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Player remote-control port.
    #[arg(short, long, default_value_t = 5500)]
    pub port: u16,

    /// Numeric authentication code configured on the player.
    #[arg(short = 'a', long)]
    pub auth_code: Option<i32>,

    /// Directory receiving downloaded songs.
    #[arg(long, default_value = "downloads")]
    pub download_dir: PathBuf,

    /// Download the library snapshot into this directory once connected.
    #[arg(long, value_name = "DIR")]
    pub library: Option<PathBuf>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn defaults_target_local_player() {
        let cli = Cli::parse_from(["remotewire"]);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.port, 5500);
        assert!(cli.auth_code.is_none());
        assert!(cli.library.is_none());
    }

    #[test]
    fn parses_connection_options() {
        let cli = Cli::parse_from([
            "remotewire",
            "--host",
            "player.local",
            "-p",
            "5600",
            "--auth-code",
            "1234",
            "--library",
            "/tmp/lib",
            "-v",
        ]);
        assert_eq!(cli.host, "player.local");
        assert_eq!(cli.port, 5600);
        assert_eq!(cli.auth_code, Some(1234));
        assert_eq!(cli.library.as_deref(), Some(std::path::Path::new("/tmp/lib")));
        assert!(cli.verbose);
    }
}
