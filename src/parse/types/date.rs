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
use winnow::binary;
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

use crate::parse::error::{MBResult, MBusError};

fn decode_7bit_year(hi: u8, lo: u8) -> u16 {
    let year = ((hi & 0x07) << 4) | (lo & 0x0F);
    2000 + year as u16
}

#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub struct TypeFDateTime {
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: u16,
    pub invalid: bool,
    pub dst: bool,
}

impl TypeFDateTime {
    pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
        let (b0, b1, b2, b3): (u8, u8, u8, u8) = (
            binary::u8,
            binary::u8,
            binary::u8,
            binary::u8,
        )
            .context(StrContext::Label("Type F date/time"))
            .parse_next(input)?;
        Ok(Self {
            minute: b0 & 0x3F,
            invalid: b0 & 0x80 != 0,
            hour: b1 & 0x1F,
            dst: b1 & 0x80 != 0,
            day: b2 & 0x1F,
            month: b3 & 0x0F,
            year: decode_7bit_year(b2 >> 5, b3 >> 4),
        })
    }
}

#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub struct TypeGDate {
    pub day: u8,
    pub month: u8,
    pub year: u16,
}

impl TypeGDate {
    pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
        let (b0, b1): (u8, u8) = (binary::u8, binary::u8)
            .context(StrContext::Label("Type G date"))
            .parse_next(input)?;
        Ok(Self {
            day: b0 & 0x1F,
            month: b1 & 0x0F,
            year: decode_7bit_year(b0 >> 5, b1 >> 4),
        })
    }
}

#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub struct TypeIDateTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: u16,
    pub day_of_week: u8,
    pub week: u8,
    pub invalid: bool,
    pub in_dst: bool,
    pub leap_year: bool,
}

impl TypeIDateTime {
    pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
        let (b0, b1, b2, b3, b4, b5): (u8, u8, u8, u8, u8, u8) = (
            binary::u8,
            binary::u8,
            binary::u8,
            binary::u8,
            binary::u8,
            binary::u8,
        )
            .context(StrContext::Label("Type I date/time"))
            .parse_next(input)?;
        let year = decode_7bit_year(b3 >> 5, b4 >> 4);
        Ok(Self {
            second: b0 & 0x3F,
            invalid: b0 & 0x80 != 0,
            minute: b1 & 0x3F,
            hour: b2 & 0x1F,
            in_dst: b2 & 0x20 != 0,
            day: b3 & 0x1F,
            month: b4 & 0x0F,
            year,
            day_of_week: b5 & 0x07,
            week: (b5 >> 4) & 0x3F,
            leap_year: year % 4 == 0 && (year % 100 != 0 || year % 400 == 0),
        })
    }
}

#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub struct TypeJTime {
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub invalid: bool,
}

impl TypeJTime {
    pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
        let (b0, b1, b2): (u8, u8, u8) = (binary::u8, binary::u8, binary::u8)
            .context(StrContext::Label("Type J time"))
            .parse_next(input)?;
        Ok(Self {
            second: b0 & 0x3F,
            minute: b1 & 0x3F,
            invalid: b1 & 0x80 != 0,
            hour: b2 & 0x1F,
        })
    }
}

/// "Daylight Saving Type K" — EN 13757-3 names this VIFE extension but the
/// publicly available parts of the standard do not spell out its bit
/// layout beyond "one byte, manufacturer-defined transition code". Exposed
/// as the raw byte rather than guessed-at fields.
#[allow(dead_code)]
#[derive(Debug, PartialEq, Eq)]
pub struct TypeKDST {
    pub raw: u8,
}

impl TypeKDST {
    pub fn parse(input: &mut &Bytes) -> MBResult<Self> {
        binary::u8
            .map(|raw| Self { raw })
            .context(StrContext::Label("Type K DST"))
            .parse_next(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    #[test]
    fn type_g_date() {
        let data = bytes(&[0x01, 0x02]);
        let b = Bytes::new(&data);
        let mut input = &b;
        let date = TypeGDate::parse(&mut input).unwrap();
        assert_eq!(date.day, 1);
        assert_eq!(date.month, 2);
    }

    #[test]
    fn type_j_time() {
        let data = bytes(&[30, 45, 12]);
        let b = Bytes::new(&data);
        let mut input = &b;
        let time = TypeJTime::parse(&mut input).unwrap();
        assert_eq!(time.second, 30);
        assert_eq!(time.minute, 45);
        assert_eq!(time.hour, 12);
        assert!(!time.invalid);
    }
}
