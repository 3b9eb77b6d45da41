// crates/kryon-core/src/codec.rs
//! Little-endian primitives shared by the reader and property encoding.
//!
//! Reads compose one byte at a time and never assume alignment. Short or
//! empty input yields zero; checking lengths is the caller's job.

pub fn read_u8(bytes: &[u8]) -> u8 {
    bytes.first().copied().unwrap_or(0)
}

pub fn read_u16_le(bytes: &[u8]) -> u16 {
    if bytes.len() < 2 {
        return 0;
    }
    (bytes[0] as u16) | ((bytes[1] as u16) << 8)
}

pub fn read_u32_le(bytes: &[u8]) -> u32 {
    if bytes.len() < 4 {
        return 0;
    }
    (bytes[0] as u32)
        | ((bytes[1] as u32) << 8)
        | ((bytes[2] as u32) << 16)
        | ((bytes[3] as u32) << 24)
}

pub fn write_u16_le(out: &mut Vec<u8>, value: u16) {
    out.push((value & 0xFF) as u8);
    out.push((value >> 8) as u8);
}

pub fn write_u32_le(out: &mut Vec<u8>, value: u32) {
    out.push((value & 0xFF) as u8);
    out.push(((value >> 8) & 0xFF) as u8);
    out.push(((value >> 16) & 0xFF) as u8);
    out.push((value >> 24) as u8);
}

/// Unsigned 8.8 fixed point: 1.0 is stored as 256. Saturates at both ends.
pub fn percentage_to_fixed(value: f32) -> u16 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let scaled = (value * 256.0).round();
    if scaled >= u16::MAX as f32 {
        u16::MAX
    } else {
        scaled as u16
    }
}

pub fn fixed_to_percentage(value: u16) -> f32 {
    value as f32 / 256.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        assert_eq!(read_u16_le(&[0x34, 0x12]), 0x1234);
        assert_eq!(read_u32_le(&[0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
    }

    #[test]
    fn short_input_reads_zero() {
        assert_eq!(read_u8(&[]), 0);
        assert_eq!(read_u16_le(&[0xFF]), 0);
        assert_eq!(read_u32_le(&[1, 2, 3]), 0);
    }

    #[test]
    fn writers_emit_low_byte_first() {
        let mut out = Vec::new();
        write_u16_le(&mut out, 0xBEEF);
        write_u32_le(&mut out, 0x0102_0304);
        assert_eq!(out, vec![0xEF, 0xBE, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn fixed_point_saturates() {
        assert_eq!(percentage_to_fixed(0.5), 128);
        assert_eq!(percentage_to_fixed(-3.0), 0);
        assert_eq!(percentage_to_fixed(1000.0), u16::MAX);
        assert_eq!(fixed_to_percentage(384), 1.5);
    }
}
