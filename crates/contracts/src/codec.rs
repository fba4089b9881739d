//! Little-endian `f32` record codec shared by log loading and persistence.
//!
//! Device logs and synced exports are both bare sequences of 4-byte LE floats.

use std::borrow::Cow;

use crate::ContractError;

/// Width of one encoded value in bytes
pub const F32_WIDTH: usize = std::mem::size_of::<f32>();

/// Decode a byte buffer whose length must be a whole number of `record_width`-byte records
pub fn decode_f32_le(
    bytes: &[u8],
    record_width: usize,
    context: &str,
) -> Result<Vec<f32>, ContractError> {
    if record_width == 0 || record_width % F32_WIDTH != 0 {
        return Err(ContractError::decode(
            context,
            format!("record width {record_width} is not a positive multiple of {F32_WIDTH}"),
        ));
    }
    if bytes.len() % record_width != 0 {
        return Err(ContractError::decode(
            context,
            format!(
                "{} bytes is not a whole number of {}-byte records ({} trailing)",
                bytes.len(),
                record_width,
                bytes.len() % record_width
            ),
        ));
    }

    Ok(bytes
        .chunks_exact(F32_WIDTH)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Encode values as raw little-endian bytes
///
/// Borrows the buffer directly on little-endian targets.
pub fn encode_f32_le(values: &[f32]) -> Cow<'_, [u8]> {
    if cfg!(target_endian = "little") {
        Cow::Borrowed(bytemuck::cast_slice(values))
    } else {
        Cow::Owned(values.iter().flat_map(|v| v.to_le_bytes()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_bits() {
        let values = [0.0f32, -1.5, 1.0e-7, f32::MAX, 3.1415927];
        let bytes = encode_f32_le(&values);
        assert_eq!(bytes.len(), values.len() * F32_WIDTH);
        let decoded = decode_f32_le(&bytes, F32_WIDTH, "test").unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_encoding_is_little_endian() {
        let bytes = encode_f32_le(&[1.0]);
        assert_eq!(&bytes[..], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_rejects_truncated_record() {
        let bytes = vec![0u8; 13];
        let err = decode_f32_le(&bytes, 12, "sensor.log").unwrap_err();
        assert!(matches!(err, ContractError::Decode { .. }));
        assert!(err.to_string().contains("1 trailing"), "got: {err}");
    }

    #[test]
    fn test_rejects_bad_record_width() {
        assert!(decode_f32_le(&[0u8; 8], 6, "x").is_err());
        assert!(decode_f32_le(&[0u8; 8], 0, "x").is_err());
    }
}
