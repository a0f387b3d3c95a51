use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use reqwest::Client;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;
use url::Url;

use crate::common::RigId;
use crate::config::{Config, LiveConfig, PollConfig, RigConfig};
use crate::refresh::{bust_url, CacheBuster};
use crate::status::{StatusError, StatusPayload};


/// Where a rig's status document comes from.
#[rocket::async_trait]
pub trait StatusSource: Send + Sync {
	async fn fetch(&self, rig: RigId) -> Result<StatusPayload, StatusError>;
}

/// Fetches `<base_url><url_prefix>/<host>/info.json?<cache-buster>`.
pub struct HttpStatusSource {
	client: Client,
	base: Url,
	rig: RigConfig,
	live: LiveConfig,
	buster: CacheBuster,
}

impl HttpStatusSource {
	pub fn new(config: &Config) -> Result<Self, StatusError> {
		Ok(Self {
			client: Client::builder().timeout(config.poll.timeout()).build()?,
			base: Url::parse(&config.live.base_url)?,
			rig: config.rig.clone(),
			live: config.live.clone(),
			buster: CacheBuster::new(),
		})
	}

	pub fn status_url(&self, rig: RigId) -> Result<Url, StatusError> {
		let url = self.base.join(&self.live.status_path(&self.rig.host(rig)))?;
		Ok(bust_url(url, self.buster.next()))
	}
}

#[rocket::async_trait]
impl StatusSource for HttpStatusSource {
	async fn fetch(&self, rig: RigId) -> Result<StatusPayload, StatusError> {
		let response = self.client.get(self.status_url(rig)?).send().await?;
		if !response.status().is_success() {
			return Err(StatusError::HttpStatus(response.status().as_u16()));
		}
		let body = response.text().await?;
		StatusPayload::parse(&body)
	}
}


#[derive(Clone)]
#[derive(Debug)]
pub struct PollSettings {
	pub interval: Duration,
	pub timeout: Duration,
	pub max_backoff: Duration,
	pub idle_timeout: Duration,
}

impl From<&PollConfig> for PollSettings {
	fn from(config: &PollConfig) -> Self {
		Self {
			interval: config.interval(),
			timeout: config.timeout(),
			max_backoff: config.max_backoff(),
			idle_timeout: config.idle_timeout(),
		}
	}
}

impl PollSettings {
	/// Delay before the next attempt after `failures` consecutive failures.
	pub fn backoff(&self, failures: u32) -> Duration {
		let exponent = failures.min(16);
		let base = self.interval.saturating_mul(1u32 << exponent).min(self.max_backoff);
		let jitter_ms = (base.as_millis() as u64) / 4;
		let jitter = if jitter_ms > 0 {
			rand::thread_rng().gen_range(0..=jitter_ms)
		} else {
			0
		};
		base + Duration::from_millis(jitter)
	}
}


#[derive(Debug)]
struct RigEntry {
	payload: Option<StatusPayload>,
	last_viewed: Instant,
	running: bool,
}

/// Latest status of every rig somebody is looking at.
///
/// A rig gets a poller task the first time its status is requested. The task
/// stops once nobody has asked for that rig within the idle timeout, or when
/// the board is shut down; a later request starts a fresh one.
pub struct StatusBoard {
	rigs: RwLock<HashMap<RigId, RigEntry>>,
	source: Arc<dyn StatusSource>,
	settings: PollSettings,
	shutdown: watch::Sender<bool>,
}

impl StatusBoard {
	pub fn new(source: Arc<dyn StatusSource>, settings: PollSettings) -> Self {
		let (shutdown, _) = watch::channel(false);
		Self {
			rigs: RwLock::new(HashMap::new()),
			source,
			settings,
			shutdown,
		}
	}

	/// Marks `rig` as viewed, starts its poller if needed and returns the last good payload.
	pub async fn watch(self: &Arc<Self>, rig: RigId) -> Option<StatusPayload> {
		let mut rigs = self.rigs.write().await;
		let entry = rigs.entry(rig).or_insert_with(|| RigEntry {
			payload: None,
			last_viewed: Instant::now(),
			running: false,
		});
		entry.last_viewed = Instant::now();

		if !entry.running && !*self.shutdown.borrow() {
			entry.running = true;
			tokio::spawn(run_poller(self.clone(), rig));
		}
		entry.payload.clone()
	}

	#[cfg(test)]
	pub async fn is_polling(&self, rig: RigId) -> bool {
		let rigs = self.rigs.read().await;
		rigs.get(&rig).map(|entry| entry.running).unwrap_or(false)
	}

	pub fn shutdown(&self) {
		info!("Stopping status pollers");
		self.shutdown.send_replace(true);
	}

	async fn store(&self, rig: RigId, payload: StatusPayload) {
		let mut rigs = self.rigs.write().await;
		if let Some(entry) = rigs.get_mut(&rig) {
			entry.payload = Some(payload);
		}
	}

	// Decided under the write lock so a concurrent `watch` either sees the
	// poller still running or starts a new one.
	async fn should_stop(&self, rig: RigId, shutting_down: bool) -> bool {
		let mut rigs = self.rigs.write().await;
		match rigs.get_mut(&rig) {
			Some(entry) => {
				let idle = entry.last_viewed.elapsed() > self.settings.idle_timeout;
				if idle || shutting_down {
					entry.running = false;
					true
				} else {
					false
				}
			},
			None => true,
		}
	}
}

async fn run_poller(board: Arc<StatusBoard>, rig: RigId) {
	info!("Starting status poller for rig {}", rig);
	let mut shutdown = board.shutdown.subscribe();
	let mut failures: u32 = 0;

	loop {
		let shutting_down = *shutdown.borrow();
		if board.should_stop(rig, shutting_down).await {
			break;
		}

		let result = match tokio::time::timeout(board.settings.timeout, board.source.fetch(rig)).await {
			Ok(result) => result,
			Err(_) => Err(StatusError::Timeout),
		};

		let delay = match result {
			Ok(payload) => {
				if failures > 0 {
					info!("Status for rig {} recovered after {} failures", rig, failures);
				}
				failures = 0;
				board.store(rig, payload).await;
				board.settings.interval
			},
			Err(err) => {
				failures = failures.saturating_add(1);
				warn!("Status poll for rig {} failed ({} in a row); error was {}", rig, failures, err);
				board.settings.backoff(failures)
			},
		};

		tokio::select! {
			_ = tokio::time::sleep(delay) => {},
			// The board owns the sender, so this only resolves on shutdown.
			_ = shutdown.changed() => {},
		}
	}
	debug!("Status poller for rig {} stopped", rig);
}
