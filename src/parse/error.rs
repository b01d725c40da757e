/*
 * Copyright 2023 Lexi Robinson
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Error type for the `winnow`-combinator parsers used throughout
//! `application_layer` and `transport_layer`.

use winnow::error::{AddContext, ErrMode, ErrorConvert, ErrorKind, FromExternalError, ParserError, StrContext};
use winnow::stream::Stream;

/// Error type for the `winnow`-combinator parsers. This carries a stack of
/// `StrContext` breadcrumbs (one per `.context(...)` call
/// on the way back out) plus an optional cause string for errors that
/// originated from a foreign `TryFrom`/`FromStr` failure.
#[derive(Debug, Clone, Default)]
pub struct MBusError {
    pub context: Vec<StrContext>,
    pub cause: Option<String>,
}

pub type MBResult<T> = winnow::PResult<T, MBusError>;

impl MBusError {
    /// Build a hard failure ("cut") that parent `alt`/`repeat` combinators
    /// will not try to recover from, used for conditions that mean the
    /// telegram is definitely malformed rather than merely "not this
    /// alternative".
    pub fn assert<I: Stream>(_input: &I, message: &'static str) -> ErrMode<Self> {
        ErrMode::Cut(Self {
            context: Vec::new(),
            cause: Some(message.to_string()),
        })
    }

    pub fn from_input<I: Stream>(_input: &I) -> Self {
        Self::default()
    }

    pub fn message(&self) -> String {
        if let Some(cause) = &self.cause {
            cause.clone()
        } else if let Some(ctx) = self.context.last() {
            ctx.to_string()
        } else {
            "parse error".to_string()
        }
    }
}

impl std::fmt::Display for MBusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())?;
        for ctx in self.context.iter().rev() {
            write!(f, "\n  while parsing {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MBusError {}

impl<I: Stream> ParserError<I> for MBusError {
    fn from_error_kind(_input: &I, _kind: ErrorKind) -> Self {
        Self::default()
    }

    fn append(self, _input: &I, _checkpoint: &<I as Stream>::Checkpoint, _kind: ErrorKind) -> Self {
        self
    }
}

impl<I: Stream> AddContext<I, StrContext> for MBusError {
    fn add_context(mut self, _input: &I, _checkpoint: &<I as Stream>::Checkpoint, context: StrContext) -> Self {
        self.context.push(context);
        self
    }
}

/// `bits::bits` crosses from a `(I, usize)` bit-stream error back to a
/// byte-stream error; since both sides of that boundary use the same
/// `MBusError` here, the conversion is the identity.
impl ErrorConvert<MBusError> for MBusError {
    fn convert(self) -> MBusError {
        self
    }
}

impl<I: Stream, E: std::fmt::Display> FromExternalError<I, E> for MBusError {
    fn from_external_error(_input: &I, _kind: ErrorKind, e: E) -> Self {
        Self {
            context: Vec::new(),
            cause: Some(e.to_string()),
        }
    }
}
