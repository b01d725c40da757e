// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Finds telegram boundaries in a byte stream coming off a wM-Bus radio
//! dongle. Unlike the wired M-Bus framing in `parse::link_layer` (start
//! byte, explicit tail, checksum), a wM-Bus RF frame is simply
//! length-prefixed: one `L` byte gives the count of bytes that follow it,
//! and there is no checksum or tail marker in the air frame itself (the
//! dongle's own CRC, if any, is stripped before bytes reach this crate).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDetection {
	/// Not enough bytes have arrived yet to know the frame's length.
	PartialFrame,
	/// A complete frame is present; `length` is the total byte count
	/// including the leading `L` field, `payload_offset`/`payload_length`
	/// describe the bytes after `L` that should be handed to the DLL parser.
	FullFrame {
		length: usize,
		payload_offset: usize,
		payload_length: usize,
	},
	/// The leading byte cannot be a valid `L` field for any known framing
	/// (currently: always recoverable, kept for parity with richer
	/// transports that can signal definite corruption).
	ErrorInFrame,
}

/// The smallest possible wM-Bus telegram: `L` + 1 byte `C` + 1 byte `M`
/// low + 1 byte `M` high... in practice nothing useful is shorter than a
/// bare DLL header (L C M M A A A A CI), 10 bytes total.
const MIN_FRAME_LEN: usize = 10;

pub fn detect(buf: &[u8]) -> FrameDetection {
	let Some(&l_field) = buf.first() else {
		return FrameDetection::PartialFrame;
	};

	let total_len = l_field as usize + 1;
	if total_len < MIN_FRAME_LEN {
		return FrameDetection::ErrorInFrame;
	}

	if buf.len() < total_len {
		return FrameDetection::PartialFrame;
	}

	FrameDetection::FullFrame {
		length: total_len,
		payload_offset: 1,
		payload_length: total_len - 1,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_buffer_is_partial() {
		assert_eq!(detect(&[]), FrameDetection::PartialFrame);
	}

	#[test]
	fn short_buffer_is_partial() {
		assert_eq!(detect(&[0x09, 0x44]), FrameDetection::PartialFrame);
	}

	#[test]
	fn too_short_l_field_is_an_error() {
		assert_eq!(detect(&[0x02, 0x44, 0x00]), FrameDetection::ErrorInFrame);
	}

	#[test]
	fn full_frame_detected() {
		let mut buf = vec![0x0A];
		buf.extend(std::iter::repeat(0xFF).take(10));
		assert_eq!(
			detect(&buf),
			FrameDetection::FullFrame {
				length: 11,
				payload_offset: 1,
				payload_length: 10,
			}
		);
	}

	#[test]
	fn extra_trailing_bytes_do_not_extend_the_frame() {
		let mut buf = vec![0x0A];
		buf.extend(std::iter::repeat(0xFF).take(10));
		buf.extend(std::iter::repeat(0xAA).take(5));
		assert_eq!(
			detect(&buf),
			FrameDetection::FullFrame {
				length: 11,
				payload_offset: 1,
				payload_length: 10,
			}
		);
	}
}
