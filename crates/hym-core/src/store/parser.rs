use crate::common::constants::{INT_BYTES, SAMPLE_BYTES};
use crate::domain::{Failure, HymError, HymResult};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub(super) fn read_i32_triple<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    path: &Path,
) -> HymResult<[i32; 3]> {
    let mut bytes = [0_u8; 3 * INT_BYTES];
    read_exact_at(reader, offset, &mut bytes, path)?;
    let mut triple = [0_i32; 3];
    for (value, chunk) in triple.iter_mut().zip(bytes.chunks_exact(INT_BYTES)) {
        *value = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(triple)
}

pub(super) fn read_f64_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    path: &Path,
) -> HymResult<f64> {
    let mut bytes = [0_u8; SAMPLE_BYTES];
    read_exact_at(reader, offset, &mut bytes, path)?;
    Ok(f64::from_le_bytes(bytes))
}

pub(super) fn read_f64_block<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    count: usize,
    path: &Path,
) -> HymResult<Vec<f64>> {
    let mut bytes = vec![0_u8; count * SAMPLE_BYTES];
    read_exact_at(reader, offset, &mut bytes, path)?;
    Ok(bytes
        .chunks_exact(SAMPLE_BYTES)
        .map(|chunk| {
            let mut sample = [0_u8; SAMPLE_BYTES];
            sample.copy_from_slice(chunk);
            f64::from_le_bytes(sample)
        })
        .collect())
}

fn read_exact_at<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    buffer: &mut [u8],
    path: &Path,
) -> HymResult<()> {
    reader
        .seek(SeekFrom::Start(offset))
        .and_then(|_| reader.read_exact(buffer))
        .map_err(|source| {
            HymError::new(
                Failure::SourceRead,
                format!(
                    "failed to read {} bytes at offset {} of '{}': {}",
                    buffer.len(),
                    offset,
                    path.display(),
                    source
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{read_f64_at, read_f64_block, read_i32_triple};
    use std::io::Cursor;
    use std::path::Path;

    #[test]
    fn positioned_reads_decode_little_endian_values() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[0xAA; 4]);
        for value in [7_i32, -2, 11] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for value in [1.25_f64, -3.5] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut cursor = Cursor::new(bytes);
        let path = Path::new("memory");

        assert_eq!(read_i32_triple(&mut cursor, 4, path).expect("triple"), [7, -2, 11]);
        assert_eq!(read_f64_at(&mut cursor, 24, path).expect("sample"), -3.5);
        assert_eq!(
            read_f64_block(&mut cursor, 16, 2, path).expect("block"),
            vec![1.25, -3.5]
        );
    }

    #[test]
    fn reads_past_end_are_io_errors() {
        let mut cursor = Cursor::new(vec![0_u8; 8]);
        let error = read_f64_at(&mut cursor, 4, Path::new("short.d")).expect_err("past end");
        assert_eq!(error.placeholder(), "IO.SOURCE_READ");
        assert!(error.message().contains("short.d"));
    }
}
