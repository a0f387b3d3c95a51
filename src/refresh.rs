use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

use crate::pages::escape;


/// Millisecond timestamps used as cache-busting query values.
///
/// Two calls within the same millisecond would otherwise produce the same
/// value, so each value is at least one greater than the last one handed out.
#[derive(Debug)]
#[derive(Default)]
pub struct CacheBuster {
	last: AtomicU64,
}

impl CacheBuster {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn next(&self) -> u64 {
		let now = now_millis();
		let mut last = self.last.load(Ordering::Relaxed);
		loop {
			let candidate = now.max(last + 1);
			match self.last.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
				Ok(_) => return candidate,
				Err(actual) => last = actual,
			}
		}
	}
}

fn now_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_millis() as u64)
		.unwrap_or(0)
}

/// Appends a cache buster to a (possibly relative) URL.
pub fn bust_path(path: &str, buster: u64) -> String {
	let separator = if path.contains('?') { '&' } else { '?' };
	format!("{}{}{}", path, separator, buster)
}

pub fn bust_url(mut url: Url, buster: u64) -> Url {
	let query = match url.query() {
		Some(query) if !query.is_empty() => format!("{}&{}", query, buster),
		_ => buster.to_string(),
	};
	url.set_query(Some(&query));
	url
}


/// An `<img>` element that the client script keeps re-fetching.
#[derive(Clone)]
#[derive(Debug)]
pub struct LiveImage {
	pub id: String,
	pub url: String,
	pub width: u32,
	pub height: u32,
	pub refresh_ms: u64,
}

impl LiveImage {
	pub fn render(&self, buster: &CacheBuster) -> String {
		let id = escape(&self.id);
		let url = escape(&self.url);
		format!(
			"<img id=\"{id}\" src=\"{src}\" width=\"{w}\" height=\"{h}\" onload=\"InitialImg('{id}', '{url}', {ms})\">",
			id = id,
			src = escape(&bust_path(&self.url, buster.next())),
			w = self.width,
			h = self.height,
			url = url,
			ms = self.refresh_ms,
		)
	}
}
