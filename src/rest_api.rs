use std::sync::Arc;

use rocket::serde::json::{json, Json, Value};
use rocket::{Request, State};

use log::debug;

use crate::common::CameraIndex;
use crate::common::RigId;
use crate::config::Config;
use crate::liveness::LivenessProbe;
use crate::poller::StatusBoard;
use crate::status::StatusView;


// Until the rig's poller has produced a payload the view is all placeholders.
#[get("/status/<pf>?<cam>")]
async fn get_status(
	pf: RigId,
	cam: Option<CameraIndex>,
	config: &State<Config>,
	board: &State<Arc<StatusBoard>>,
) -> Option<Json<StatusView>> {
	if !config.rig.is_valid_rig(pf) {
		return None;
	}
	let view = match board.watch(pf).await {
		Some(payload) => StatusView::project(&payload, cam),
		None => {
			debug!("No status for rig {} yet", pf);
			StatusView::placeholder()
		},
	};
	Some(Json(view))
}

#[get("/liveness")]
async fn get_liveness(config: &State<Config>, probe: &State<Box<dyn LivenessProbe>>) -> Json<Vec<bool>> {
	Json(probe.probe_all(&config.rig.probe_urls()).await)
}

#[catch(404)]
fn not_found() -> Value {
	json!({
		"status": "error",
		"reason": "Resource was not found."
	})
}

#[catch(422)]
fn unprocessable(request: &Request<'_>) -> Value {
	json!({
		"status": "error",
		"reason": format!("Invalid parameters for {}.", request.uri())
	})
}



pub fn stage() -> rocket::fairing::AdHoc {
	rocket::fairing::AdHoc::on_ignite("JSON", |rocket| async {
		rocket
			.register("/", catchers![not_found, unprocessable])
			.mount("/v0", routes![get_status, get_liveness])
	})
}


#[cfg(test)]
mod tests {
	use std::time::Duration;

	use rocket::http::Status;
	use rocket::local::asynchronous::Client;
	use rocket::serde::json::Value;

	use crate::common::PLACEHOLDER;
	use crate::config::{Config, PollConfig};
	use crate::status::StatusView;
	use crate::testing::test_rocket;

	fn fast_config() -> Config {
		Config {
			poll: PollConfig {
				interval_ms: 5,
				..PollConfig::default()
			},
			..Config::default()
		}
	}

	#[rocket::async_test]
	async fn status_starts_as_placeholders_then_fills_in() {
		let client = Client::tracked(test_rocket(fast_config(), vec![]).unwrap()).await.unwrap();

		let response = client.get("/v0/status/3?cam=5&1700000000000").dispatch().await;
		assert_eq!(response.status(), Status::Ok);
		let first: StatusView = response.into_json().await.unwrap();
		assert_eq!(first, StatusView::placeholder());

		tokio::time::sleep(Duration::from_millis(100)).await;

		let view: StatusView = client.get("/v0/status/3?cam=5").dispatch().await.into_json().await.unwrap();
		assert_eq!(view.shutter, "35");
		assert_eq!(view.gain, "9");
		assert_eq!(view.shutter_auto, "on");
		assert_eq!(view.gain_auto, "off");
		assert_eq!(view.timestamp, "4242");
	}

	#[rocket::async_test]
	async fn status_without_camera_reads_whole_fields() {
		let client = Client::tracked(test_rocket(fast_config(), vec![]).unwrap()).await.unwrap();
		client.get("/v0/status/14").dispatch().await;
		tokio::time::sleep(Duration::from_millis(100)).await;

		let view: StatusView = client.get("/v0/status/14").dispatch().await.into_json().await.unwrap();
		assert_eq!(view.curr, "10");
		assert_eq!(view.total, "100");
		assert_eq!(view.shutter, "31,32,33,34,35");
		assert_eq!(view.shutter_auto, PLACEHOLDER);
	}

	#[rocket::async_test]
	async fn unknown_rig_is_not_found() {
		let client = Client::tracked(test_rocket(fast_config(), vec![]).unwrap()).await.unwrap();
		let response = client.get("/v0/status/99").dispatch().await;
		assert_eq!(response.status(), Status::NotFound);
		let body: Value = response.into_json().await.unwrap();
		assert_eq!(body["status"], "error");
	}

	#[rocket::async_test]
	async fn liveness_lists_every_host() {
		let client = Client::tracked(test_rocket(Config::default(), vec![2, 20]).unwrap()).await.unwrap();
		let flags: Vec<bool> = client.get("/v0/liveness").dispatch().await.into_json().await.unwrap();
		assert_eq!(flags.len(), 20);
		assert!(flags[1]);
		assert!(flags[19]);
		assert_eq!(flags.iter().filter(|alive| **alive).count(), 2);
	}
}
