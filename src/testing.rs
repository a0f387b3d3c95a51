// Fakes shared by the unit tests of several modules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::RigId;
use crate::config::Config;
use crate::liveness::LivenessProbe;
use crate::poller::StatusSource;
use crate::status::{StatusError, StatusPayload};


/// An info.json as the capture process writes it, trailing commas included.
pub const SAMPLE_INFO_JSON: &str = "{\"desc\": \"ProFusion-CMU by ViewPLUS, DEVICE#=7, API=2\", \
	\"shutter\": [ 31, 32, 33, 34, 35, ], \"gain\": [ 5.5, 6, 7, 8, 9, ], \
	\"shutter_auto\": [ 0, 0, 0, 0, 1, ], \"gain_auto\": [ 0, 0, 0, 0, 0, ], \
	\"curr\": 10, \"total\": 100, \"framecount\": 4242, \"framedrop\": 0, }";

pub fn sample_payload() -> StatusPayload {
	StatusPayload::parse(SAMPLE_INFO_JSON).unwrap()
}

pub struct FakeStatusSource {
	payload: StatusPayload,
	malformed: Mutex<bool>,
	fetches: AtomicUsize,
}

impl FakeStatusSource {
	pub fn ok(payload: StatusPayload) -> Self {
		Self {
			payload,
			malformed: Mutex::new(false),
			fetches: AtomicUsize::new(0),
		}
	}

	pub fn fail_with_malformed_json(&self) {
		*self.malformed.lock().unwrap() = true;
	}

	pub fn fetches(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}
}

#[rocket::async_trait]
impl StatusSource for FakeStatusSource {
	async fn fetch(&self, _rig: RigId) -> Result<StatusPayload, StatusError> {
		self.fetches.fetch_add(1, Ordering::SeqCst);
		let malformed = *self.malformed.lock().unwrap();
		if malformed {
			StatusPayload::parse("{\"curr\": ")
		} else {
			Ok(self.payload.clone())
		}
	}
}

/// Reports the hosts in `alive` (1-based) as up.
pub struct FakeProbe {
	alive: Vec<RigId>,
}

impl FakeProbe {
	pub fn with_alive(alive: Vec<RigId>) -> Self {
		Self { alive }
	}
}

#[rocket::async_trait]
impl LivenessProbe for FakeProbe {
	async fn probe_all(&self, urls: &[String]) -> Vec<bool> {
		(1..=urls.len() as RigId).map(|rig| self.alive.contains(&rig)).collect()
	}
}

pub fn test_rocket(config: Config, alive: Vec<RigId>) -> anyhow::Result<rocket::Rocket<rocket::Build>> {
	crate::build_rocket(
		config,
		Box::new(FakeProbe::with_alive(alive)),
		Arc::new(FakeStatusSource::ok(sample_payload())),
	)
}
