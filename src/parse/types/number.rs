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
use winnow::combinator::repeat;
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::Bytes;

use crate::parse::error::MBusError;

/// BCD is stored little-endian nibble-pair-per-byte, with the top nibble of
/// the most significant byte used as a sign marker (`0xF` = negative) by
/// some manufacturers (libmbus-compatible, not in the EN 13757-3 base spec).
pub fn parse_bcd<'a>(bytes: usize) -> impl Parser<&'a Bytes, i64, MBusError> {
    move |input: &mut &'a Bytes| {
        let checkpoint = input.checkpoint();
        let data: Vec<u8> = repeat(bytes, binary::u8).parse_next(input)?;
        decode_bcd(&data).ok_or_else(|| {
            input.reset(&checkpoint);
            winnow::error::ErrMode::Backtrack(MBusError::default())
        })
    }
}

/// Accepts any `bytes`-length run without validating the nibbles, for the
/// `alt((parse_bcd, parse_invalid_bcd))` fallback used when a meter emits a
/// non-decimal nibble (seen on some out-of-spec devices).
pub fn parse_invalid_bcd<'a>(bytes: usize) -> impl Parser<&'a Bytes, Vec<u8>, MBusError> {
    repeat(bytes, binary::u8).context(StrContext::Label("invalid BCD passthrough"))
}

fn decode_bcd(data: &[u8]) -> Option<i64> {
    let mut reversed: Vec<u8> = data.iter().copied().collect();
    reversed.reverse();
    let mut negative = false;
    if let Some(first) = reversed.first_mut() {
        if *first & 0xF0 == 0xF0 {
            negative = true;
            *first &= 0x0F;
        }
    }
    let mut ret: i64 = 0;
    for byte in reversed {
        ret = ret.checked_mul(10)?.checked_add(decode_bcd_digit(byte >> 4)? as i64)?;
        ret = ret.checked_mul(10)?.checked_add(decode_bcd_digit(byte)? as i64)?;
    }
    Some(if negative { -ret } else { ret })
}

fn decode_bcd_digit(byte: u8) -> Option<u8> {
    let nibble = byte & 0x0F;
    (nibble < 0x0A).then_some(nibble)
}

const TWOS_COMPLEMENT_MASK: u8 = 0b1000_0000;

pub fn parse_binary_signed<'a>(bytes: usize) -> impl Parser<&'a Bytes, i64, MBusError> {
    move |input: &mut &'a Bytes| {
        let mut data: Vec<u8> = repeat(bytes, binary::u8)
            .context(StrContext::Label("signed binary value"))
            .parse_next(input)?;
        Ok(match data.len() {
            1 => i8::from_le_bytes(data.try_into().unwrap()) as i64,
            2 => i16::from_le_bytes(data.try_into().unwrap()) as i64,
            4 => i32::from_le_bytes(data.try_into().unwrap()) as i64,
            8 => i64::from_le_bytes(data.try_into().unwrap()),
            len @ (3 | 6) => {
                let is_negative = data.last().unwrap() & TWOS_COMPLEMENT_MASK == TWOS_COMPLEMENT_MASK;
                let filler = if is_negative { 0xFF } else { 0x00 };
                data.extend((0..(8 - len)).map(|_| filler));
                i64::from_le_bytes(data.try_into().unwrap())
            }
            _ => return Err(MBusError::assert(input, "unsupported byte count for signed binary")),
        })
    }
}

pub fn parse_binary_unsigned<'a>(bytes: usize) -> impl Parser<&'a Bytes, u64, MBusError> {
    move |input: &mut &'a Bytes| {
        let mut data: Vec<u8> = repeat(bytes, binary::u8)
            .context(StrContext::Label("unsigned binary value"))
            .parse_next(input)?;
        Ok(match data.len() {
            1 => data[0] as u64,
            2 => u16::from_le_bytes(data.try_into().unwrap()) as u64,
            4 => u32::from_le_bytes(data.try_into().unwrap()) as u64,
            8 => u64::from_le_bytes(data.try_into().unwrap()),
            len @ (3 | 6) => {
                data.extend((0..(8 - len)).map(|_| 0x00));
                u64::from_le_bytes(data.try_into().unwrap())
            }
            _ => return Err(MBusError::assert(input, "unsupported byte count for unsigned binary")),
        })
    }
}

pub fn parse_real<'a>(input: &mut &'a Bytes) -> winnow::PResult<f32, MBusError> {
    repeat::<_, _, Vec<u8>, _, _>(4, binary::u8)
        .map(|data| f32::from_le_bytes(data.try_into().unwrap()))
        .context(StrContext::Label("IEEE-754 real value"))
        .parse_next(input)
}

#[cfg(test)]
mod bcd_tests {
    use super::*;

    #[test]
    fn single_byte() {
        assert_eq!(decode_bcd(&[0x12]), Some(12));
    }

    #[test]
    fn double_byte() {
        assert_eq!(decode_bcd(&[0x34, 0x12]), Some(1234));
    }

    #[test]
    fn negativity() {
        assert_eq!(decode_bcd(&[0xF1]), Some(-1));
    }

    #[test]
    fn mass_negativity() {
        assert_eq!(decode_bcd(&[0x23, 0xF1]), Some(-123));
    }

    #[test]
    fn dodgy_data() {
        assert_eq!(decode_bcd(&[0xA2]), None);
    }
}

#[cfg(test)]
mod binary_signed_tests {
    use super::*;

    fn decode(data: &[u8]) -> i64 {
        let bytes = Bytes::new(data);
        let mut input = &bytes;
        parse_binary_signed(data.len()).parse_next(&mut input).unwrap()
    }

    #[test]
    fn i8() {
        for i in [i8::MIN, -1, 0, 1, i8::MAX] {
            assert_eq!(decode(&i.to_le_bytes()), i as i64);
        }
    }

    #[test]
    fn i16() {
        for i in [i16::MIN, -1, 0, 1, i16::MAX] {
            assert_eq!(decode(&i.to_le_bytes()), i as i64);
        }
    }

    #[test]
    fn i24() {
        for (expected, bytes) in [
            (-8388608, [0x00, 0x00, 0x80]),
            (-1, [0xFF, 0xFF, 0xFF]),
            (0, [0x00, 0x00, 0x00]),
            (1, [0x01, 0x00, 0x00]),
            (8388607, [0xFF, 0xFF, 0x7F]),
        ] {
            assert_eq!(decode(&bytes), expected as i64);
        }
    }
}
