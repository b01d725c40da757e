// Copyright 2024 Lexi Robinson
// Licensed under the EUPL-1.2
pub mod header;
pub mod manufacturer;
