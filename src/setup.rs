use std::io::{self, Write};

use crate::config::{self, AppConfig};
use crate::player;

/// Install hint for the current platform
fn install_hint(command: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("winget install -e {}", command)
    } else if cfg!(target_os = "macos") {
        format!("brew install {}", command)
    } else {
        format!("sudo apt install {}", command)
    }
}

/// Print a short report on the player binary and config; false if playback
/// can only fall back to the browser
pub fn check_dependencies(config: &AppConfig) -> Result<bool, anyhow::Error> {
    let mut out = io::stdout();

    write!(out, "Checking player '{}'... ", config.player_command)?;
    out.flush()?;
    let player_ok = player::player_available(&config.player_command);
    if player_ok {
        writeln!(out, "✓ found.")?;
    } else {
        writeln!(out, "x NOT found.")?;
        writeln!(
            out,
            "  Episodes will open in the browser. Install it with '{}'.",
            install_hint(&config.player_command)
        )?;
    }

    match config::config_path() {
        Some(path) if path.exists() => writeln!(out, "Config: {}", path.display())?,
        Some(path) => writeln!(out, "Config: {} (defaults, not saved yet)", path.display())?,
        None => writeln!(out, "Config: no config directory on this platform")?,
    }
    if let Some(dir) = config::data_dir() {
        writeln!(out, "Data:   {}", dir.display())?;
    }
    writeln!(out, "API:    {}", config.api_base_url)?;

    Ok(player_ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint_names_the_command() {
        assert!(install_hint("mpv").ends_with("mpv"));
    }
}
