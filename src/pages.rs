//! HTML for the grid, host, camera and status test pages.
//!
//! The markup is deliberately plain: tables of live images plus a status list
//! whose `<span>` ids match the fields of the status JSON, so the client script
//! can copy them across by name.

use std::borrow::Cow;

use crate::common::{next_camera, prev_camera, CameraIndex, RigId, PLACEHOLDER};
use crate::config::{LiveConfig, RigConfig};
use crate::refresh::{CacheBuster, LiveImage};


const GRID_STYLE: &str = "td {\n  width: 160px;\n  height: 120px;\n  border-width: 0px;\n  padding: 4px 4px 4px 4px;\n  text-align: center;\n  background-color: #888;\n}\n";
const BASE_STYLE: &str = "img {\n  border: none;\n}\na {\n  border: none;\n  text-decoration: none;\n}\n";

pub struct PageContext<'a> {
	pub rig: &'a RigConfig,
	pub live: &'a LiveConfig,
	pub buster: &'a CacheBuster,
	pub status_interval_ms: u64,
}

pub fn escape(text: &str) -> Cow<'_, str> {
	if !text.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
		return Cow::Borrowed(text);
	}
	let mut out = String::with_capacity(text.len() + 8);
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	Cow::Owned(out)
}

fn page(title: &str, style: &str, body: &str) -> String {
	format!(
		"<html>\n<head>\n<meta http-equiv=\"Pragma\" content=\"no-cache\">\n<title>{}</title>\n<script type=\"text/javascript\" src=\"/reload.js\"></script>\n<style type=\"text/css\">\n{}{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
		escape(title),
		style,
		BASE_STYLE,
		body
	)
}

/// One `<td>` per host, `columns` to a row; dead hosts get a placeholder cell.
pub fn render_grid(ctx: &PageContext<'_>, alive: &[bool]) -> String {
	let mut body = String::from("<table>\n");
	let hosts: Vec<RigId> = (1..=ctx.rig.host_count).collect();

	for row in hosts.chunks(ctx.rig.columns.max(1) as usize) {
		body.push_str("<tr>");
		for &rig in row {
			let host = escape(&ctx.rig.host(rig)).into_owned();
			let is_alive = alive.get((rig - 1) as usize).copied().unwrap_or(false);
			if is_alive {
				let thumb = LiveImage {
					id: format!("{}{}", ctx.rig.host_prefix, rig),
					url: ctx.live.thumb_path(&ctx.rig.host(rig)),
					width: ctx.live.thumb_width,
					height: ctx.live.thumb_height,
					refresh_ms: ctx.live.refresh_ms,
				};
				body.push_str(&format!(
					"<td id=\"{}td\"><a href=\"/view_pf?pf={}\">{}</a><br>{}</td>\n",
					escape(&thumb.id),
					rig,
					thumb.render(ctx.buster),
					host
				));
			} else {
				body.push_str(&format!("<td>{} is inactive</td>\n", host));
			}
		}
		body.push_str("</tr>\n");
	}
	body.push_str("</table>\n");

	page("ProFusion-CMU live view", GRID_STYLE, &body)
}

/// Every camera of one host as a thumbnail linking to its camera page.
pub fn render_host(ctx: &PageContext<'_>, rig: RigId) -> String {
	let host = ctx.rig.host(rig);
	let mut body = format!("<h1>ProFusion-CMU #{}</h1>\n<table>\n", rig);
	let cameras: Vec<CameraIndex> = (1..=ctx.rig.cameras_per_host).collect();

	for row in cameras.chunks(ctx.rig.columns.max(1) as usize) {
		body.push_str("<tr>");
		for &cam in row {
			let image = LiveImage {
				id: format!("{}cam{:02}", host, cam),
				url: ctx.live.image_path(&host, cam),
				width: ctx.live.thumb_width,
				height: ctx.live.thumb_height,
				refresh_ms: ctx.live.refresh_ms,
			};
			body.push_str(&format!(
				"<td id=\"{}td\"><a href=\"/view_cam?pf={}&amp;cam={}\">{}</a><br>CAM {:02}</td>\n",
				escape(&image.id),
				rig,
				cam,
				image.render(ctx.buster),
				cam
			));
		}
		body.push_str("</tr>\n");
	}
	body.push_str("</table>\n<div class=\"navi\">\n<a href=\"/\">[Up]</a>\n</div>\n");

	page(&format!("{} live view", host), GRID_STYLE, &body)
}

fn status_item(label: &str, id: &str) -> String {
	format!("{}: <span id=\"{}\">{}</span>", label, id, PLACEHOLDER)
}

/// One camera at full size, with navigation and a live status panel.
pub fn render_camera(ctx: &PageContext<'_>, rig: RigId, cam: CameraIndex) -> String {
	let host = ctx.rig.host(rig);
	let count = ctx.rig.cameras_per_host;
	let image = LiveImage {
		id: format!("{}{}", ctx.rig.host_prefix, rig),
		url: ctx.live.image_path(&host, cam),
		width: ctx.live.image_width,
		height: ctx.live.image_height,
		refresh_ms: ctx.live.refresh_ms,
	};

	let mut body = String::new();
	body.push_str(&format!("<h1>ProFusion-CMU #{}, CAM={}</h1>\n", rig, cam));
	body.push_str(&format!("{}\n", image.render(ctx.buster)));
	body.push_str("<div class=\"navi\">\n");
	body.push_str(&format!("<a href=\"/view_cam?pf={}&amp;cam={}\">[Prev]</a>\n", rig, prev_camera(cam, count)));
	body.push_str(&format!("<a href=\"/view_pf?pf={}\">[Up]</a>\n", rig));
	body.push_str(&format!("<a href=\"/view_cam?pf={}&amp;cam={}\">[Next]</a>\n", rig, next_camera(cam, count)));
	body.push_str("</div>\n<hr>\n<div class=\"status\">\n<h4>Status</h4>\n<ul>\n");
	body.push_str(&format!("<li>{}</li>\n", status_item("Description", "desc")));
	body.push_str(&format!(
		"<li>Frame: <span id=\"curr\">{p}</span> / <span id=\"total\">{p}</span> (framedrop=<span id=\"framedrop\">{p}</span>)</li>\n",
		p = PLACEHOLDER
	));
	body.push_str(&format!("<li>{}</li>\n", status_item("Timestamp", "timestamp")));
	body.push_str(&format!(
		"<li>Shutter: <span id=\"shutter\">{p}</span> (auto=<span id=\"shutter_auto\">{p}</span>)</li>\n",
		p = PLACEHOLDER
	));
	body.push_str(&format!(
		"<li>Gain: <span id=\"gain\">{p}</span> (auto=<span id=\"gain_auto\">{p}</span>)</li>\n",
		p = PLACEHOLDER
	));
	body.push_str("</ul>\n</div>\n");
	body.push_str(&format!(
		"<script type=\"text/javascript\">\nrefreshStatus('/v0/status/{}?cam={}', {});\n</script>\n",
		rig,
		cam,
		ctx.status_interval_ms
	));

	page(&format!("ProFusion-CMU #{}, CAM={}", rig, cam), "", &body)
}

/// Bare frame counters for a single fixed rig.
pub fn render_status_test(ctx: &PageContext<'_>) -> String {
	let mut body = String::from("<ul>\n");
	body.push_str(&format!(
		"<li>Frame: <span id=\"curr\">{p}</span> / <span id=\"total\">{p}</span></li>\n",
		p = PLACEHOLDER
	));
	body.push_str(&format!("<li>{}</li>\n", status_item("Timestamp", "timestamp")));
	body.push_str("</ul>\n");
	body.push_str(&format!(
		"<script type=\"text/javascript\">\nrefreshStatus('/v0/status/{}', {});\n</script>\n",
		ctx.live.test_rig,
		ctx.status_interval_ms
	));

	page("Status", "", &body)
}


#[cfg(test)]
mod tests {
	use super::*;

	fn with_context<T>(f: impl FnOnce(&PageContext<'_>) -> T) -> T {
		let rig = RigConfig::default();
		let live = LiveConfig::default();
		let buster = CacheBuster::new();
		let ctx = PageContext {
			rig: &rig,
			live: &live,
			buster: &buster,
			status_interval_ms: 200,
		};
		f(&ctx)
	}

	#[test]
	fn escape_special_characters() {
		assert_eq!(escape("ve01"), "ve01");
		assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
	}

	#[test]
	fn grid_has_one_cell_per_host() {
		let mut alive = vec![false; 20];
		alive[2] = true;
		alive[19] = true;
		let html = with_context(|ctx| render_grid(ctx, &alive));

		assert_eq!(html.matches("<td").count(), 20);
		assert_eq!(html.matches("<tr>").count(), 4);
		assert_eq!(html.matches("is inactive").count(), 18);
		assert!(html.contains("<td>ve01 is inactive</td>"));
		assert!(html.contains("<td id=\"ve3td\"><a href=\"/view_pf?pf=3\"><img id=\"ve3\" src=\"/live/ve03/thumb.jpg?"));
		assert!(html.contains("<br>ve03</td>"));
		assert!(html.contains("<a href=\"/view_pf?pf=20\">"));
	}

	#[test]
	fn short_liveness_list_means_inactive() {
		let html = with_context(|ctx| render_grid(ctx, &[true]));
		assert_eq!(html.matches("<td").count(), 20);
		assert_eq!(html.matches("is inactive").count(), 19);
	}

	#[test]
	fn uneven_grid_keeps_slot_count() {
		let rig = RigConfig { host_count: 7, columns: 3, ..RigConfig::default() };
		let live = LiveConfig::default();
		let buster = CacheBuster::new();
		let ctx = PageContext { rig: &rig, live: &live, buster: &buster, status_interval_ms: 200 };
		let html = render_grid(&ctx, &[]);
		assert_eq!(html.matches("<td").count(), 7);
		assert_eq!(html.matches("<tr>").count(), 3);
	}

	#[test]
	fn host_page_links_every_camera() {
		let html = with_context(|ctx| render_host(ctx, 4));
		assert_eq!(html.matches("<td").count(), 24);
		assert!(html.contains("<a href=\"/view_cam?pf=4&amp;cam=1\">"));
		assert!(html.contains("<a href=\"/view_cam?pf=4&amp;cam=24\">"));
		assert!(html.contains("src=\"/live/ve04/24.jpg?"));
	}

	#[test]
	fn camera_page_navigation_wraps() {
		let html = with_context(|ctx| render_camera(ctx, 2, 24));
		assert!(html.contains("<h1>ProFusion-CMU #2, CAM=24</h1>"));
		assert!(html.contains("<a href=\"/view_cam?pf=2&amp;cam=1\">[Next]</a>"));
		assert!(html.contains("<a href=\"/view_cam?pf=2&amp;cam=23\">[Prev]</a>"));
		assert!(html.contains("<a href=\"/view_pf?pf=2\">[Up]</a>"));
		assert!(html.contains("[Prev]</a>\n<a href=\"/view_pf?pf=2\">[Up]</a>\n<a href"));

		let html = with_context(|ctx| render_camera(ctx, 2, 1));
		assert!(html.contains("<a href=\"/view_cam?pf=2&amp;cam=24\">[Prev]</a>"));
		assert!(html.contains("<a href=\"/view_cam?pf=2&amp;cam=2\">[Next]</a>"));
	}

	#[test]
	fn camera_page_starts_status_polling() {
		let html = with_context(|ctx| render_camera(ctx, 2, 5));
		assert!(html.contains("src=\"/live/ve02/05.jpg?"));
		assert!(html.contains("width=\"640\" height=\"480\""));
		assert!(html.contains("refreshStatus('/v0/status/2?cam=5', 200);"));
		for id in ["desc", "curr", "total", "framedrop", "timestamp", "shutter", "shutter_auto", "gain", "gain_auto"] {
			assert!(html.contains(&format!("<span id=\"{}\">N/A</span>", id)), "missing {}", id);
		}
	}

	#[test]
	fn status_test_page_uses_fixed_rig() {
		let html = with_context(render_status_test);
		assert!(html.contains("refreshStatus('/v0/status/14', 200);"));
		assert!(html.contains("<span id=\"curr\">N/A</span>"));
		assert!(!html.contains("id=\"shutter\""));
	}
}
