//! Record encoding and decoding
//!
//! On-disk layout, with no file header or footer:
//!
//! ```text
//! record := length (u32, big-endian) || payload (length bytes of UTF-8)
//! file   := record*
//! ```

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

use super::error::{LogError, LogResult};

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Encode a text payload as a length-prefixed record
pub fn encode_record(payload: &str) -> LogResult<Vec<u8>> {
    let bytes = payload.as_bytes();
    let len = u32::try_from(bytes.len()).map_err(|_| {
        LogError::Io(io::Error::new(
            ErrorKind::InvalidInput,
            format!("payload of {} bytes exceeds u32 length prefix", bytes.len()),
        ))
    })?;

    let mut record = Vec::with_capacity(LENGTH_PREFIX_SIZE + bytes.len());
    record.extend_from_slice(&len.to_be_bytes());
    record.extend_from_slice(bytes);
    Ok(record)
}

/// Encoded size of a payload, prefix included
pub fn encoded_len(payload: &str) -> u64 {
    (LENGTH_PREFIX_SIZE + payload.len()) as u64
}

/// Lazy iterator over the records of one source
///
/// Yields decoded payloads until end of input. A malformed record yields a
/// single `Decode` error and ends the iteration.
pub struct RecordReader<R> {
    reader: R,
    offset: u64,
    /// Total input length when known; bounds payload allocations
    limit: Option<u64>,
    done: bool,
}

impl RecordReader<BufReader<File>> {
    /// Open a log file for reading from its start
    pub fn open<P: AsRef<Path>>(path: P) -> LogResult<Self> {
        let file = File::open(path.as_ref())?;
        let limit = file.metadata()?.len();
        Ok(Self {
            reader: BufReader::new(file),
            offset: 0,
            limit: Some(limit),
            done: false,
        })
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader of unknown length
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            limit: None,
            done: false,
        }
    }

    /// Byte offset of the next record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn read_record(&mut self) -> LogResult<Option<String>> {
        let start = self.offset;

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let got = read_up_to(&mut self.reader, &mut prefix)?;
        if got == 0 {
            return Ok(None);
        }
        if got < LENGTH_PREFIX_SIZE {
            return Err(LogError::decode(start, "incomplete length prefix"));
        }

        let len = u64::from(u32::from_be_bytes(prefix));
        let payload_start = start + LENGTH_PREFIX_SIZE as u64;

        if let Some(limit) = self.limit {
            let remaining = limit.saturating_sub(payload_start);
            if len > remaining {
                return Err(LogError::decode(
                    start,
                    format!("record length {} exceeds remaining {} bytes", len, remaining),
                ));
            }
        }

        let mut payload = vec![0u8; len as usize];
        let got = read_up_to(&mut self.reader, &mut payload)?;
        if got < payload.len() {
            return Err(LogError::decode(
                start,
                format!("incomplete payload: expected {} bytes, found {}", len, got),
            ));
        }

        let text = String::from_utf8(payload)
            .map_err(|e| LogError::decode(start, format!("invalid UTF-8: {}", e)))?;

        self.offset = payload_start + len;
        Ok(Some(text))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = LogResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_record() {
            Ok(Some(text)) => Some(Ok(text)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Fill `buf` as far as the input allows, returning the bytes read
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(bytes: Vec<u8>) -> Vec<LogResult<String>> {
        RecordReader::new(Cursor::new(bytes)).collect()
    }

    #[test]
    fn test_encode_layout() {
        let record = encode_record("ab").unwrap();
        assert_eq!(record, vec![0, 0, 0, 2, b'a', b'b']);

        let empty = encode_record("").unwrap();
        assert_eq!(empty, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_is_big_endian() {
        let payload = "x".repeat(0x0102);
        let record = encode_record(&payload).unwrap();
        assert_eq!(&record[..4], &[0, 0, 1, 2]);
        assert_eq!(record.len(), 4 + 0x0102);
    }

    #[test]
    fn test_encoded_len_counts_utf8_bytes() {
        assert_eq!(encoded_len("ab"), 6);
        assert_eq!(encoded_len("héllo"), 4 + 6);
        assert_eq!(encoded_len("日本"), 4 + 6);
    }

    #[test]
    fn test_decode_sequence() {
        let mut bytes = Vec::new();
        for msg in ["first", "", "🦀 crab", "Null\0byte"] {
            bytes.extend(encode_record(msg).unwrap());
        }

        let decoded: Vec<String> = decode_all(bytes).into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(decoded, vec!["first", "", "🦀 crab", "Null\0byte"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(decode_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_truncated_prefix() {
        let mut bytes = encode_record("ok").unwrap();
        bytes.extend_from_slice(&[0, 0]);

        let results = decode_all(bytes);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "ok");
        match &results[1] {
            Err(LogError::Decode { offset, .. }) => assert_eq!(*offset, 6),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = encode_record("complete").unwrap();
        let mut partial = encode_record("partial").unwrap();
        partial.truncate(partial.len() - 3);
        bytes.extend(partial);

        let results = decode_all(bytes);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "complete");
        assert!(results[1].as_ref().unwrap_err().is_decode());
    }

    #[test]
    fn test_invalid_utf8_stops_iteration() {
        let mut bytes = vec![0, 0, 0, 2, 0xff, 0xfe];
        bytes.extend(encode_record("never reached").unwrap());

        let results = decode_all(bytes);
        assert_eq!(results.len(), 1);
        assert!(results[0].as_ref().unwrap_err().is_decode());
    }

    #[test]
    fn test_open_rejects_oversized_length() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("huge.bin");
        std::fs::write(&path, [0xff, 0xff, 0xff, 0xff, b'a']).unwrap();

        let results: Vec<_> = RecordReader::open(&path).unwrap().collect();
        assert_eq!(results.len(), 1);
        let err = results[0].as_ref().unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().contains("exceeds remaining 1 bytes"));
    }

    #[test]
    fn test_offset_tracks_records() {
        let mut bytes = encode_record("ab").unwrap();
        bytes.extend(encode_record("cdef").unwrap());

        let mut reader = RecordReader::new(Cursor::new(bytes));
        assert_eq!(reader.offset(), 0);
        reader.next().unwrap().unwrap();
        assert_eq!(reader.offset(), 6);
        reader.next().unwrap().unwrap();
        assert_eq!(reader.offset(), 14);
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }
}
