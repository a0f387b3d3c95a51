#[macro_use] extern crate rocket;
#[macro_use] extern crate serde_derive;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Command, Arg, ArgAction};
use log::info;
use rocket::{Build, Request, Response, Rocket};
use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;

use crate::config::Config;
use crate::liveness::{HttpLivenessProbe, LivenessProbe};
use crate::poller::{HttpStatusSource, PollSettings, StatusBoard, StatusSource};
use crate::refresh::CacheBuster;

mod common;
mod config;
mod liveness;
mod pages;
mod poller;
mod refresh;
mod rest_api;
mod status;
mod ui;

#[cfg(test)]
mod testing;



// The status JSON may be polled by dashboards served from the rig hosts' own web servers.
pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
	fn info(&self) -> Info {
		Info {
			name: "Add CORS headers to responses",
			kind: Kind::Response
		}
	}

	async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
		response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
		response.set_header(Header::new("Access-Control-Allow-Methods", "GET, OPTIONS"));
		response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
	}
}


pub fn build_rocket(config: Config, probe: Box<dyn LivenessProbe>, source: Arc<dyn StatusSource>) -> anyhow::Result<Rocket<Build>> {
	let board = Arc::new(StatusBoard::new(source, PollSettings::from(&config.poll)));
	let live_dir = config.live.dir.clone();
	let live_prefix = config.live.url_prefix.clone();

	let mut rocket = rocket::build()
		.manage(config)
		.manage(probe)
		.manage(board)
		.manage(CacheBuster::new())
		.attach(rest_api::stage())
		.attach(ui::stage())
		.attach(CORS)
		.attach(AdHoc::on_shutdown("Stop status pollers", |rocket| Box::pin(async move {
			if let Some(board) = rocket.state::<Arc<StatusBoard>>() {
				board.shutdown();
			}
		})));

	if let Some(dir) = live_dir {
		if !dir.is_dir() {
			anyhow::bail!("live directory {} is not a directory", dir.display());
		}
		info!("Serving live directory {} at {}", dir.display(), live_prefix);
		rocket = rocket.mount(live_prefix.as_str(), FileServer::from(dir));
	}
	Ok(rocket)
}


#[rocket::main]
async fn main() -> anyhow::Result<()> {
	let matches = Command::new("pfcmu-live")
		.version("0.1.0")
		.about("Live view dashboard for ProFusion-CMU camera rigs.")
		.arg(
			Arg::new("config")
				.action(ArgAction::Append)	// Allow argument to be specified multiple times
				.short('c')
				.long("config")
				.help("TOML config file; later files override earlier ones")
		)
		.arg(
			Arg::new("live-dir")
				.long("live-dir")
				.help("Directory written by the capture process, served under the live URL prefix")
		)
		.get_matches();

	let mut config_manager = config::ConfigManager::new();
	let config_filename_matches = matches.get_many::<String>("config");
	match config_filename_matches {
		Some(filenames) => {
			config_manager.read_config(filenames.map(|v| v.as_str()).collect())?;
		},
		None => {
			// Use default file path
			config_manager.read_default_config_files()?;
		}
	};

	let mut config = config_manager.get_config().clone();
	if let Some(dir) = matches.get_one::<String>("live-dir") {
		config.live.dir = Some(PathBuf::from(dir));
	}

	let probe = HttpLivenessProbe::new(config.probe.timeout())?;
	let source = HttpStatusSource::new(&config)?;

	build_rocket(config, Box::new(probe), Arc::new(source))?
		.launch()
		.await?;

	anyhow::Ok(())
}
