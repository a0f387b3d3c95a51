use std::time::Duration;

use futures::future::join_all;
use log::debug;
use reqwest::Client;


/// Answers whether each rig host is up, one flag per probe URL, in order.
#[rocket::async_trait]
pub trait LivenessProbe: Send + Sync {
	async fn probe_all(&self, urls: &[String]) -> Vec<bool>;
}

/// Probes every URL concurrently; a host is alive when it answers 2xx within the timeout.
pub struct HttpLivenessProbe {
	client: Client,
}

impl HttpLivenessProbe {
	pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
		let client = Client::builder()
			.timeout(timeout)
			.build()?;
		Ok(Self { client })
	}

	async fn probe_one(&self, url: &str) -> bool {
		match self.client.get(url).send().await {
			Ok(response) => {
				let alive = response.status().is_success();
				if !alive {
					debug!("Probe {} answered {}", url, response.status());
				}
				alive
			},
			Err(err) => {
				debug!("Probe {} failed; error was {}", url, err);
				false
			},
		}
	}
}

#[rocket::async_trait]
impl LivenessProbe for HttpLivenessProbe {
	async fn probe_all(&self, urls: &[String]) -> Vec<bool> {
		join_all(urls.iter().map(|url| self.probe_one(url))).await
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[rocket::async_test]
	async fn unreachable_hosts_are_dead() {
		let probe = HttpLivenessProbe::new(Duration::from_millis(200)).unwrap();
		// Port 9 on loopback: nothing listens there in a test environment.
		let urls = vec![
			"http://127.0.0.1:9/ping.php?hostname=ve01".to_string(),
			"not a url".to_string(),
		];
		assert_eq!(probe.probe_all(&urls).await, vec![false, false]);
	}

	#[rocket::async_test]
	async fn empty_batch() {
		let probe = HttpLivenessProbe::new(Duration::from_millis(200)).unwrap();
		assert!(probe.probe_all(&[]).await.is_empty());
	}
}
