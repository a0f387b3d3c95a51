use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};

use crate::common::{host_name, CameraIndex, RigId};


const DEFAULT_CONFIG_FILES: [&str; 2] = ["/etc/pfcmu-live/pfcmu-live.toml", "pfcmu-live.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: io::Error,
	},
	#[error("invalid config file {path}: {source}")]
	Parse {
		path: String,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid merged config: {0}")]
	Merged(#[source] toml::de::Error),
}


#[derive(Clone)]
#[derive(Debug)]
#[derive(Default)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub rig: RigConfig,
	pub live: LiveConfig,
	pub poll: PollConfig,
	pub probe: ProbeConfig,
}

/// Layout of the capture rig: which hosts exist and how the grid shows them.
#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
	pub host_count: RigId,
	pub columns: u32,
	pub host_prefix: String,
	pub cameras_per_host: CameraIndex,
	/// Liveness probe URL; `{host}` is replaced by the host name.
	pub probe_url: String,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
	pub url_prefix: String,
	pub base_url: String,
	pub dir: Option<PathBuf>,
	pub refresh_ms: u64,
	pub thumb_width: u32,
	pub thumb_height: u32,
	pub image_width: u32,
	pub image_height: u32,
	pub test_rig: RigId,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
	pub interval_ms: u64,
	pub timeout_ms: u64,
	pub max_backoff_ms: u64,
	pub idle_timeout_secs: u64,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
	pub timeout_ms: u64,
}

impl Default for RigConfig {
	fn default() -> Self {
		Self {
			host_count: 20,
			columns: 5,
			host_prefix: "ve".into(),
			cameras_per_host: 24,
			probe_url: "http://localhost/ping.php?hostname={host}".into(),
		}
	}
}

impl Default for LiveConfig {
	fn default() -> Self {
		Self {
			url_prefix: "/live".into(),
			base_url: "http://localhost".into(),
			dir: None,
			refresh_ms: 50,
			thumb_width: 160,
			thumb_height: 120,
			image_width: 640,
			image_height: 480,
			test_rig: 14,
		}
	}
}

impl Default for PollConfig {
	fn default() -> Self {
		Self {
			interval_ms: 200,
			timeout_ms: 2000,
			max_backoff_ms: 5000,
			idle_timeout_secs: 30,
		}
	}
}

impl Default for ProbeConfig {
	fn default() -> Self {
		Self { timeout_ms: 1000 }
	}
}

impl RigConfig {
	pub fn host(&self, rig: RigId) -> String {
		host_name(&self.host_prefix, rig)
	}

	/// Probe URLs for hosts `1..=host_count`, in host order.
	pub fn probe_urls(&self) -> Vec<String> {
		(1..=self.host_count)
			.map(|rig| self.probe_url.replace("{host}", &self.host(rig)))
			.collect()
	}

	pub fn is_valid_rig(&self, rig: RigId) -> bool {
		rig >= 1 && rig <= self.host_count
	}

	pub fn is_valid_camera(&self, cam: CameraIndex) -> bool {
		cam >= 1 && cam <= self.cameras_per_host
	}
}

impl LiveConfig {
	fn prefix(&self) -> &str {
		self.url_prefix.trim_end_matches('/')
	}

	pub fn status_path(&self, host: &str) -> String {
		format!("{}/{}/info.json", self.prefix(), host)
	}

	pub fn thumb_path(&self, host: &str) -> String {
		format!("{}/{}/thumb.jpg", self.prefix(), host)
	}

	pub fn image_path(&self, host: &str, cam: CameraIndex) -> String {
		format!("{}/{}/{:02}.jpg", self.prefix(), host, cam)
	}
}

impl PollConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	pub fn max_backoff(&self) -> Duration {
		Duration::from_millis(self.max_backoff_ms)
	}

	pub fn idle_timeout(&self) -> Duration {
		Duration::from_secs(self.idle_timeout_secs)
	}
}

impl ProbeConfig {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}


/// Reads one or more TOML files; keys in later files override earlier ones.
#[derive(Clone)]
#[derive(Debug)]
pub struct ConfigManager {
	merged: toml::Table,
	config: Config,
}

impl ConfigManager {
	pub fn new() -> Self {
		Self {
			merged: toml::Table::new(),
			config: Config::default(),
		}
	}

	pub fn get_config(&self) -> &Config {
		&self.config
	}

	pub fn read_config(&mut self, filenames: Vec<&str>) -> Result<(), ConfigError> {
		for filename in filenames {
			let table = read_table(Path::new(filename))?;
			merge_tables(&mut self.merged, table);
			info!("Read config file {}", filename);
		}
		self.rebuild()
	}

	/// Like `read_config`, but files that don't exist are skipped.
	pub fn read_default_config_files(&mut self) -> Result<(), ConfigError> {
		for filename in DEFAULT_CONFIG_FILES {
			if !Path::new(filename).exists() {
				warn!("Config file {} not found; skipping", filename);
				continue;
			}
			self.read_config(vec![filename])?;
		}
		self.rebuild()
	}

	fn rebuild(&mut self) -> Result<(), ConfigError> {
		self.config = toml::Value::Table(self.merged.clone())
			.try_into()
			.map_err(ConfigError::Merged)?;
		Ok(())
	}
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
	let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
		path: path.display().to_string(),
		source,
	})?;
	toml::from_str(&text).map_err(|source| ConfigError::Parse {
		path: path.display().to_string(),
		source,
	})
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
	for (key, value) in overlay {
		match value {
			toml::Value::Table(incoming) => {
				if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
					merge_tables(existing, incoming);
					continue;
				}
				base.insert(key, toml::Value::Table(incoming));
			},
			value => {
				base.insert(key, value);
			},
		}
	}
}
