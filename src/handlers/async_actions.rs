use std::future::Future;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::api::CatalogClient;
use crate::app::{App, AsyncAction, Effect, FetchRequest, HomeSection};
use crate::errors::CatalogError;
use crate::player::{self, PlayRequest, Player};

/// How often a running player is asked for its position
const PROGRESS_POLL_SECS: u64 = 5;
/// How long the player gets to prove it can open the stream
const STARTUP_TIMEOUT_MS: u64 = 10_000;
const RETRY_DELAY_MS: u64 = 500;

/// Apply a finished background result and run whatever it triggers
pub fn handle_async_action(
    app: &mut App,
    action: AsyncAction,
    client: &CatalogClient,
    player: &Player,
    tx: &mpsc::Sender<AsyncAction>,
) {
    let effects = app.apply_action(action);
    run_effects(effects, client, player, tx);
}

/// Spawn the work behind each effect; results come back over `tx`
pub fn run_effects(
    effects: Vec<Effect>,
    client: &CatalogClient,
    player: &Player,
    tx: &mpsc::Sender<AsyncAction>,
) {
    for effect in effects {
        match effect {
            Effect::Fetch(request) => spawn_fetch(request, client.clone(), tx.clone()),
            Effect::Play(request) => spawn_playback(request, player.clone(), tx.clone()),
            Effect::OpenUrl(url) => {
                let tx = tx.clone();
                tokio::task::spawn_blocking(move || {
                    if let Err(e) = player::open_in_browser(&url) {
                        warn!(%url, error = %e, "could not open browser");
                        let _ = tx.blocking_send(AsyncAction::Error(e.to_string()));
                    }
                });
            }
            Effect::StopPlayer => player.stop(),
        }
    }
}

/// Run a catalog request, retrying once after a short pause on timeouts and 5xx
pub async fn with_retry<T, F, Fut>(mut request: F) -> Result<T, CatalogError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CatalogError>>,
{
    match request().await {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "transient catalog error, retrying");
            sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
            request().await
        }
        result => result,
    }
}

fn spawn_fetch(request: FetchRequest, client: CatalogClient, tx: mpsc::Sender<AsyncAction>) {
    tokio::spawn(async move {
        let action = match request {
            FetchRequest::Home => {
                let futures = HomeSection::ALL.into_iter().map(|section| {
                    let client = client.clone();
                    async move {
                        let listing = section.listing();
                        let result = with_retry(|| client.fetch_listing(&listing, 1))
                            .await
                            .map(|page| page.items);
                        (section, result)
                    }
                });
                AsyncAction::HomeLoaded(join_all(futures).await)
            }
            FetchRequest::Listing(query) => {
                let listing = query.listing();
                let page = query.page.max(1);
                let result = with_retry(|| client.fetch_listing(&listing, page)).await;
                match result {
                    Ok(page) => AsyncAction::PageLoaded(query, page),
                    Err(e) => AsyncAction::PageFailed(query, e),
                }
            }
            FetchRequest::Detail(slug) => {
                let result = with_retry(|| client.movie_detail(&slug)).await;
                match result {
                    Ok(detail) => AsyncAction::DetailLoaded(slug, detail),
                    Err(e) => AsyncAction::DetailFailed(slug, e),
                }
            }
            FetchRequest::Instant(ticket) => match client.search(&ticket.query, 1).await {
                Ok(page) => AsyncAction::InstantResults(ticket.generation, page.items),
                Err(e) => AsyncAction::InstantFailed(ticket.generation, e.to_string()),
            },
        };
        let _ = tx.send(action).await;
    });
}

fn spawn_playback(request: PlayRequest, player: Player, tx: mpsc::Sender<AsyncAction>) {
    tokio::spawn(run_playback(request, player, tx));
}

fn failed(request: &PlayRequest, message: String) -> AsyncAction {
    AsyncAction::PlayerFailed {
        slug: request.slug.clone(),
        episode_slug: request.episode_slug.clone(),
        message,
    }
}

/// Launch, confirm startup, then watch progress until the player goes away.
/// A stop or a newer `play` moves the session on; that is never reported as a failure.
pub async fn run_playback(request: PlayRequest, player: Player, tx: mpsc::Sender<AsyncAction>) {
    info!(slug = %request.slug, episode = %request.episode_slug, start = ?request.start, "starting playback");

    let session = match player.play(&request.m3u8, request.start) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "player failed to launch");
            let _ = tx.send(failed(&request, e.to_string())).await;
            return;
        }
    };

    let started = player.wait_for_playback(STARTUP_TIMEOUT_MS).await;
    if player.session() != session {
        debug!(session, "playback stopped during startup");
        return;
    }

    match started {
        Ok(true) => {
            let _ = tx
                .send(AsyncAction::PlayerStarted {
                    slug: request.slug.clone(),
                    episode_slug: request.episode_slug.clone(),
                })
                .await;
        }
        Ok(false) => {
            warn!("player exited during startup");
            let message = if !request.embed.is_empty() && player::open_in_browser(&request.embed).is_ok() {
                "Không phát được luồng m3u8, đã mở trình duyệt".to_string()
            } else {
                format!("{} đã thoát khi mở luồng", player.command())
            };
            let _ = tx.send(failed(&request, message)).await;
            return;
        }
        Err(e) => {
            let _ = tx.send(failed(&request, e.to_string())).await;
            return;
        }
    }

    monitor_progress(request, player, session, tx).await;
}

/// Report the position every few seconds until the player exits or is replaced
async fn monitor_progress(
    request: PlayRequest,
    player: Player,
    session: u64,
    tx: mpsc::Sender<AsyncAction>,
) {
    let mut last = None;
    loop {
        sleep(Duration::from_secs(PROGRESS_POLL_SECS)).await;

        if player.session() != session {
            debug!(session, "playback superseded");
            // Keep what was watched; the new session owns the status
            if let Some(position) = last {
                let _ = tx
                    .send(AsyncAction::PlaybackProgress {
                        slug: request.slug.clone(),
                        episode_slug: request.episode_slug.clone(),
                        position,
                    })
                    .await;
            }
            break;
        }
        if !player.is_running() {
            info!(slug = %request.slug, position = ?last, "playback ended");
            let _ = tx
                .send(AsyncAction::PlaybackEnded {
                    slug: request.slug.clone(),
                    episode_slug: request.episode_slug.clone(),
                    position: last,
                })
                .await;
            break;
        }
        if let Some(position) = player.position().await {
            last = Some(position);
            if tx
                .send(AsyncAction::PlaybackProgress {
                    slug: request.slug.clone(),
                    episode_slug: request.episode_slug.clone(),
                    position,
                })
                .await
                .is_err()
            {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_only_transient_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, CatalogError> = with_retry(|| async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(CatalogError::ServerError(502, "bad gateway".into())),
                _ => Ok(7),
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let calls = AtomicU32::new(0);
        let result: Result<u32, CatalogError> = with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::NotFound("x".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stop_during_startup_is_not_a_failure() {
        let player = Player::new("sh", vec!["sleep 30".to_string()]);
        let (tx, mut rx) = mpsc::channel(8);
        let request = PlayRequest {
            slug: "a".into(),
            episode_slug: "tap-01".into(),
            title: "A".into(),
            episode_name: "Tap 01".into(),
            m3u8: "-c".into(),
            embed: String::new(),
            start: None,
        };

        let task = tokio::spawn(run_playback(request, player.clone(), tx));
        sleep(Duration::from_millis(800)).await;
        player.stop();
        task.await.unwrap();

        assert!(rx.try_recv().is_err());
    }
}
