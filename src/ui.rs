use rocket::http::ContentType;
use rocket::response::content::RawHtml;
use rocket::State;

use crate::common::{CameraIndex, RigId};
use crate::config::Config;
use crate::liveness::LivenessProbe;
use crate::pages::{self, PageContext};
use crate::refresh::CacheBuster;


const RELOAD_JS: &str = include_str!("../static/reload.js");

fn context<'a>(config: &'a Config, buster: &'a CacheBuster) -> PageContext<'a> {
	PageContext {
		rig: &config.rig,
		live: &config.live,
		buster,
		status_interval_ms: config.poll.interval_ms,
	}
}

#[get("/")]
async fn view_all(
	config: &State<Config>,
	probe: &State<Box<dyn LivenessProbe>>,
	buster: &State<CacheBuster>,
) -> RawHtml<String> {
	let alive = probe.probe_all(&config.rig.probe_urls()).await;
	RawHtml(pages::render_grid(&context(config, buster), &alive))
}

#[get("/view_pf?<pf>")]
fn view_pf(pf: RigId, config: &State<Config>, buster: &State<CacheBuster>) -> Option<RawHtml<String>> {
	if !config.rig.is_valid_rig(pf) {
		return None;
	}
	Some(RawHtml(pages::render_host(&context(config, buster), pf)))
}

#[get("/view_cam?<pf>&<cam>")]
fn view_cam(pf: RigId, cam: CameraIndex, config: &State<Config>, buster: &State<CacheBuster>) -> Option<RawHtml<String>> {
	if !config.rig.is_valid_rig(pf) || !config.rig.is_valid_camera(cam) {
		return None;
	}
	Some(RawHtml(pages::render_camera(&context(config, buster), pf, cam)))
}

#[get("/test")]
fn status_test(config: &State<Config>, buster: &State<CacheBuster>) -> RawHtml<String> {
	RawHtml(pages::render_status_test(&context(config, buster)))
}

#[get("/reload.js")]
fn reload_js() -> (ContentType, &'static str) {
	(ContentType::JavaScript, RELOAD_JS)
}



pub fn stage() -> rocket::fairing::AdHoc {
	rocket::fairing::AdHoc::on_ignite("Pages", |rocket| async {
		rocket.mount("/", routes![view_all, view_pf, view_cam, status_test, reload_js])
	})
}
