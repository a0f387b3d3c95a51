use std::fmt;

use crate::common::{has_per_camera_status, CameraIndex, PLACEHOLDER};


#[derive(Debug, thiserror::Error)]
pub enum StatusError {
	#[error("status request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("status endpoint answered with HTTP {0}")]
	HttpStatus(u16),
	#[error("malformed status payload: {0}")]
	Parse(#[from] serde_json::Error),
	#[error("invalid status URL: {0}")]
	Url(#[from] url::ParseError),
	#[error("status request timed out")]
	Timeout,
}


/// A camera setting reported either once for the whole rig or once per camera.
#[derive(Clone)]
#[derive(Debug)]
#[derive(PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
	PerCamera(Vec<f64>),
	Scalar(f64),
}

impl Reading {
	pub fn at(&self, index: usize) -> Option<f64> {
		match self {
			Reading::PerCamera(values) => values.get(index).copied(),
			Reading::Scalar(value) => Some(*value),
		}
	}
}

impl fmt::Display for Reading {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Reading::Scalar(value) => write!(f, "{}", value),
			Reading::PerCamera(values) => {
				for (i, value) in values.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					write!(f, "{}", value)?;
				}
				Ok(())
			},
		}
	}
}


/// The `info.json` document the capture process rewrites every frame.
#[derive(Clone)]
#[derive(Debug)]
#[derive(Default)]
#[derive(PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct StatusPayload {
	pub desc: Option<String>,
	pub curr: Option<i64>,
	pub total: Option<i64>,
	pub framecount: Option<u64>,
	pub framedrop: Option<i64>,
	pub shutter: Option<Reading>,
	pub gain: Option<Reading>,
	pub shutter_auto: Option<Reading>,
	pub gain_auto: Option<Reading>,
	pub brightness: Option<Reading>,
	pub brightness_auto: Option<Reading>,
	pub exposure: Option<Reading>,
	pub exposure_auto: Option<Reading>,
}

impl StatusPayload {
	/// Parses a payload, tolerating the trailing commas the capture process writes.
	pub fn parse(text: &str) -> Result<Self, StatusError> {
		let cleaned = strip_trailing_commas(text);
		Ok(serde_json::from_str(&cleaned)?)
	}
}

fn strip_trailing_commas(text: &str) -> String {
	let chars: Vec<char> = text.chars().collect();
	let mut out = String::with_capacity(text.len());
	let mut in_string = false;
	let mut escaped = false;

	for (i, &c) in chars.iter().enumerate() {
		if in_string {
			out.push(c);
			if escaped {
				escaped = false;
			} else if c == '\\' {
				escaped = true;
			} else if c == '"' {
				in_string = false;
			}
			continue;
		}

		match c {
			'"' => {
				in_string = true;
				out.push(c);
			},
			',' => {
				let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
				if !matches!(next, Some('}') | Some(']')) {
					out.push(c);
				}
			},
			_ => out.push(c),
		}
	}
	out
}


/// The status fields shown on a camera page, already formatted for display.
#[derive(Clone)]
#[derive(Debug)]
#[derive(PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct StatusView {
	pub desc: String,
	pub curr: String,
	pub total: String,
	pub timestamp: String,
	pub framedrop: String,
	pub shutter: String,
	pub gain: String,
	pub shutter_auto: String,
	pub gain_auto: String,
}

impl StatusView {
	pub fn placeholder() -> Self {
		Self {
			desc: PLACEHOLDER.into(),
			curr: PLACEHOLDER.into(),
			total: PLACEHOLDER.into(),
			timestamp: PLACEHOLDER.into(),
			framedrop: PLACEHOLDER.into(),
			shutter: PLACEHOLDER.into(),
			gain: PLACEHOLDER.into(),
			shutter_auto: PLACEHOLDER.into(),
			gain_auto: PLACEHOLDER.into(),
		}
	}

	/// Cameras 1..=23 read their own element of the per-camera arrays; anything
	/// else shows the fields as reported.
	pub fn project(payload: &StatusPayload, cam: Option<CameraIndex>) -> Self {
		let mut view = Self {
			desc: display(payload.desc.as_ref()),
			curr: display(payload.curr.as_ref()),
			total: display(payload.total.as_ref()),
			timestamp: display(payload.framecount.as_ref()),
			framedrop: display(payload.framedrop.as_ref()),
			..Self::placeholder()
		};

		match cam {
			Some(id) if has_per_camera_status(cam) => {
				let index = (id - 1) as usize;
				view.shutter = display(reading_at(&payload.shutter, index).as_ref());
				view.gain = display(reading_at(&payload.gain, index).as_ref());
				view.shutter_auto = on_off(reading_at(&payload.shutter_auto, index));
				view.gain_auto = on_off(reading_at(&payload.gain_auto, index));
			},
			_ => {
				view.shutter = display(payload.shutter.as_ref());
				view.gain = display(payload.gain.as_ref());
			},
		}
		view
	}
}

fn reading_at(reading: &Option<Reading>, index: usize) -> Option<f64> {
	reading.as_ref().and_then(|reading| reading.at(index))
}

fn display<T: fmt::Display>(value: Option<&T>) -> String {
	match value {
		Some(value) => value.to_string(),
		None => PLACEHOLDER.into(),
	}
}

fn on_off(value: Option<f64>) -> String {
	match value {
		Some(v) if v == 0.0 => "off".into(),
		Some(_) => "on".into(),
		None => PLACEHOLDER.into(),
	}
}
