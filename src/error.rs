// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

//! Top-level decode errors. Each layer's `winnow`-based parser reports
//! failures through `parse::error::MBusError`; this module is where those
//! get converted into the typed, `thiserror`-derived errors a caller outside
//! the parsing internals actually wants to match on.

use crate::crypto::CryptoError;
use crate::parse::error::MBusError;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
	#[error("not enough bytes received yet for a complete frame")]
	Partial,
	#[error("the declared frame length is too short to be valid")]
	TooShort,
}

#[derive(Debug, thiserror::Error)]
pub enum LayerParseError {
	#[error("{layer}: {source}")]
	Layer { layer: &'static str, source: MBusError },
	#[error("unrecognised CI field 0x{0:02x}")]
	UnknownCI(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
	#[error(transparent)]
	Parse(#[from] MBusError),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("frame detection failed: {0}")]
	Frame(#[from] FrameError),
	#[error("layer parse failed: {0}")]
	Layer(#[from] LayerParseError),
	#[error("decryption failed: {0}")]
	Crypto(#[from] CryptoError),
	#[error("application record parse failed: {0}")]
	Record(#[from] RecordParseError),
	#[error("no confidentiality key configured for this meter")]
	MissingKey,
	#[error("compact frame format signature 0x{0:04x} is unknown")]
	UnknownFormatSignature(u16),
}
