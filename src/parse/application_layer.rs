// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2

pub mod application;
pub mod dib;
pub mod frame;
pub mod record;
pub mod records;
pub mod vib;

pub use application::ApplicationMessage;
pub use frame::Frame;
pub use record::Record;
pub use records::RecordMap;
