pub type RigId = u32;
pub type CameraIndex = u32;

// Status payloads carry per-camera arrays; indices outside this range fall back to the scalar fields.
pub const PER_CAMERA_STATUS_MAX: CameraIndex = 23;

pub const PLACEHOLDER: &str = "N/A";


pub fn host_name(prefix: &str, rig: RigId) -> String {
	format!("{}{:02}", prefix, rig)
}

/// Camera after `cam`, wrapping from the last camera back to 1.
pub fn next_camera(cam: CameraIndex, count: CameraIndex) -> CameraIndex {
	cam % count + 1
}

/// Camera before `cam`, wrapping from 1 back to the last camera.
pub fn prev_camera(cam: CameraIndex, count: CameraIndex) -> CameraIndex {
	(cam + count - 2) % count + 1
}

pub fn has_per_camera_status(cam: Option<CameraIndex>) -> bool {
	matches!(cam, Some(id) if id > 0 && id <= PER_CAMERA_STATUS_MAX)
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn host_names_are_zero_padded() {
		assert_eq!(host_name("ve", 3), "ve03");
		assert_eq!(host_name("ve", 14), "ve14");
		assert_eq!(host_name("cam", 120), "cam120");
	}

	#[test]
	fn next_wraps_to_first_camera() {
		assert_eq!(next_camera(24, 24), 1);
		assert_eq!(next_camera(1, 24), 2);
		assert_eq!(next_camera(23, 24), 24);
	}

	#[test]
	fn prev_wraps_to_last_camera() {
		assert_eq!(prev_camera(1, 24), 24);
		assert_eq!(prev_camera(2, 24), 1);
		assert_eq!(prev_camera(24, 24), 23);
	}

	#[test]
	fn per_camera_range() {
		assert!(!has_per_camera_status(None));
		assert!(!has_per_camera_status(Some(0)));
		assert!(has_per_camera_status(Some(1)));
		assert!(has_per_camera_status(Some(23)));
		assert!(!has_per_camera_status(Some(24)));
	}
}
