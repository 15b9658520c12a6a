use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// What the app asks the player layer to start
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub slug: String,
    pub episode_slug: String,
    pub title: String,
    pub episode_name: String,
    pub m3u8: String,
    pub embed: String,
    pub start: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    pub position: f64,
    /// 0 when the player does not know yet
    pub duration: f64,
}

#[derive(Clone)]
pub struct Player {
    command: String,
    extra_args: Vec<String>,
    process: Arc<Mutex<Option<Child>>>,
    ipc_path: Arc<Mutex<Option<PathBuf>>>,
    /// Wall-clock start and resume offset, for players without IPC
    started: Arc<Mutex<Option<(Instant, f64)>>>,
    session: Arc<AtomicU64>,
}

impl Player {
    pub fn new(command: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            extra_args,
            process: Arc::new(Mutex::new(None)),
            ipc_path: Arc::new(Mutex::new(None)),
            started: Arc::new(Mutex::new(None)),
            session: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.player_command.clone(), config.player_args.clone())
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Identifies the current playback; bumped by every `play` and `stop`,
    /// so a task holding an older value knows it was superseded
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }

    fn ipc_socket_path() -> Option<PathBuf> {
        if cfg!(unix) {
            Some(std::env::temp_dir().join(format!("binh-cinema-mpv-{}.sock", std::process::id())))
        } else {
            None
        }
    }

    /// Full argument list for one playback
    pub fn build_args(&self, url: &str, start: Option<f64>, ipc: Option<&PathBuf>) -> Vec<String> {
        let mut args = vec![url.to_string()];
        args.extend(self.extra_args.iter().cloned());
        if let Some(secs) = start.filter(|s| *s > 0.0) {
            args.push(format!("--start={}", secs.floor() as u64));
        }
        if let Some(path) = ipc {
            args.push(format!("--input-ipc-server={}", path.display()));
        }
        args
    }

    pub fn play(&self, url: &str, start: Option<f64>) -> Result<u64, anyhow::Error> {
        self.stop();

        let ipc = Self::ipc_socket_path();
        if let Some(path) = &ipc {
            let _ = std::fs::remove_file(path);
        }
        let args = self.build_args(url, start, ipc.as_ref());
        debug!(command = %self.command, ?args, "spawning player");

        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to start {}: {}. Make sure it is installed and in PATH.",
                    self.command,
                    e
                )
            })?;

        {
            let mut guard = self
                .process
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to lock process mutex: {}", e))?;
            *guard = Some(child);
        }
        {
            let mut guard = self
                .ipc_path
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to lock IPC path mutex: {}", e))?;
            *guard = ipc;
        }
        if let Ok(mut guard) = self.started.lock() {
            *guard = Some((Instant::now(), start.unwrap_or(0.0)));
        }

        let session = self.session.fetch_add(1, Ordering::SeqCst) + 1;
        info!(session, "player started");
        Ok(session)
    }

    /// Check if the player process is still alive
    pub fn is_running(&self) -> bool {
        if let Ok(mut guard) = self.process.lock() {
            if let Some(ref mut child) = *guard {
                match child.try_wait() {
                    Ok(Some(_)) => false,
                    Ok(None) => true,
                    Err(_) => false,
                }
            } else {
                false
            }
        } else {
            false
        }
    }

    /// Poll until the player has stayed alive long enough to count as playing.
    /// Ok(false) means it died during startup.
    pub async fn wait_for_playback(&self, timeout_ms: u64) -> Result<bool, anyhow::Error> {
        use tokio::time::{sleep, Duration, Instant};

        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        sleep(Duration::from_millis(500)).await;

        while start.elapsed() < timeout {
            if !self.is_running() {
                return Ok(false);
            }
            if start.elapsed() > Duration::from_millis(2000) {
                return Ok(true);
            }
            sleep(Duration::from_millis(200)).await;
        }

        Ok(self.is_running())
    }

    /// Current playback position, from mpv IPC when available
    pub async fn position(&self) -> Option<PlaybackPosition> {
        if !self.is_running() {
            return None;
        }
        let ipc = self.ipc_path.lock().ok().and_then(|g| g.clone());
        if let Some(path) = ipc {
            match query_ipc(&path).await {
                Ok(pos) => return Some(pos),
                Err(e) => debug!(error = %e, "player IPC query failed, estimating"),
            }
        }
        self.estimated_position()
    }

    fn estimated_position(&self) -> Option<PlaybackPosition> {
        let guard = self.started.lock().ok()?;
        let (since, offset) = (*guard)?;
        Some(PlaybackPosition {
            position: offset + since.elapsed().as_secs_f64(),
            duration: 0.0,
        })
    }

    pub fn stop(&self) {
        if let Ok(mut guard) = self.process.lock() {
            if let Some(mut child) = guard.take() {
                // Before the kill, so startup watchers see a stop, not a crash
                self.session.fetch_add(1, Ordering::SeqCst);
                let _ = child.kill();
                let _ = child.wait();
            }
        }

        if let Ok(mut ipc_guard) = self.ipc_path.lock() {
            if let Some(path) = ipc_guard.take() {
                let _ = std::fs::remove_file(path);
            }
        }
        if let Ok(mut guard) = self.started.lock() {
            *guard = None;
        }
    }
}

/// Open an embed page in the system browser
pub fn open_in_browser(url: &str) -> Result<(), anyhow::Error> {
    webbrowser::open(url).map_err(|e| anyhow::anyhow!("Failed to open browser: {}", e))
}

/// Check the configured player binary answers `--version`
pub fn player_available(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(unix)]
async fn query_ipc(path: &std::path::Path) -> Result<PlaybackPosition, anyhow::Error> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;
    use tokio::time::{timeout, Duration};

    let stream = timeout(Duration::from_millis(500), UnixStream::connect(path)).await??;
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let mut position = None;
    let mut duration = 0.0;
    for (request_id, property) in [(1u64, "time-pos"), (2u64, "duration")] {
        let cmd = serde_json::json!({ "command": ["get_property", property], "request_id": request_id });
        write_half.write_all(format!("{}\n", cmd).as_bytes()).await?;

        // mpv interleaves events with replies; skip until our request id shows up
        let value = timeout(Duration::from_millis(500), async {
            while let Some(line) = lines.next_line().await? {
                if let Some(v) = parse_ipc_reply(&line, request_id) {
                    return Ok::<Option<f64>, std::io::Error>(v);
                }
            }
            Ok(None)
        })
        .await??;

        match property {
            "time-pos" => position = value,
            _ => duration = value.unwrap_or(0.0),
        }
    }

    let position = position.ok_or_else(|| anyhow::anyhow!("player reported no position"))?;
    Ok(PlaybackPosition { position, duration })
}

#[cfg(not(unix))]
async fn query_ipc(_path: &std::path::Path) -> Result<PlaybackPosition, anyhow::Error> {
    Err(anyhow::anyhow!("player IPC is only supported on unix"))
}

/// Some(data) for the reply to `request_id`, None for other messages
pub fn parse_ipc_reply(line: &str, request_id: u64) -> Option<Option<f64>> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    if value.get("request_id").and_then(|v| v.as_u64()) != Some(request_id) {
        return None;
    }
    if value.get("error").and_then(|v| v.as_str()) != Some("success") {
        warn!(reply = %line, "player property error");
        return Some(None);
    }
    Some(value.get("data").and_then(|v| v.as_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_with_resume_and_ipc() {
        let player = Player::new("mpv", vec!["--fs".to_string()]);
        let ipc = PathBuf::from("/tmp/x.sock");
        let args = player.build_args("https://s/1.m3u8", Some(125.7), Some(&ipc));
        assert_eq!(
            args,
            vec![
                "https://s/1.m3u8".to_string(),
                "--fs".to_string(),
                "--start=125".to_string(),
                "--input-ipc-server=/tmp/x.sock".to_string(),
            ]
        );
    }

    #[test]
    fn test_build_args_skips_zero_start() {
        let player = Player::new("mpv", vec![]);
        assert_eq!(player.build_args("u", Some(0.0), None), vec!["u".to_string()]);
    }

    #[test]
    fn test_parse_ipc_reply() {
        assert_eq!(
            parse_ipc_reply(r#"{"data":42.5,"request_id":1,"error":"success"}"#, 1),
            Some(Some(42.5))
        );
        assert_eq!(parse_ipc_reply(r#"{"event":"playback-restart"}"#, 1), None);
        assert_eq!(
            parse_ipc_reply(r#"{"request_id":2,"error":"property unavailable"}"#, 2),
            Some(None)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_during_startup_ends_the_session() {
        let player = Player::new("sh", vec!["sleep 30".to_string()]);
        let session = player.play("-c", None).unwrap();
        assert!(player.is_running());

        let stopper = player.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(800)).await;
            stopper.stop();
        });

        // Looks like an early exit to the startup check...
        assert!(!player.wait_for_playback(10_000).await.unwrap());
        // ...but the session moved on, so it was a stop
        assert_ne!(player.session(), session);
    }

    #[test]
    fn test_idle_player_reports_nothing() {
        let player = Player::new("definitely-not-a-player-binary", vec![]);
        assert!(!player.is_running());
        assert!(player.play("u", None).is_err());
        assert_eq!(player.session(), 0);
    }
}
