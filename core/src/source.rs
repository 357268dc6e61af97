//! Byte-windowed input sources.
//!
//! Feature extraction needs exactly two capabilities from its input: the
//! total length, and bounded reads at arbitrary offsets. In-memory buffers,
//! seekable files, and bounded stream accumulators all provide them, which
//! is what lets `identify_bytes`, `identify_path`, and `identify_stream`
//! share one extraction path.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// A byte source of known length supporting bounded positional reads.
pub trait WindowSource {
    /// Total length of the underlying input in bytes.
    fn len(&self) -> u64;

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// Reads partially or fully out of range are silently clipped; an
    /// offset at or past the end yields an empty vector. Errors are real
    /// I/O failures only, never EOF.
    fn read_at(&mut self, offset: u64, max_len: usize) -> io::Result<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WindowSource for &[u8] {
    fn len(&self) -> u64 {
        (**self).len() as u64
    }

    fn read_at(&mut self, offset: u64, max_len: usize) -> io::Result<Vec<u8>> {
        let total = (**self).len();
        let start = offset.min(total as u64) as usize;
        let end = start.saturating_add(max_len).min(total);
        Ok(self[start..end].to_vec())
    }
}

/// A seekable file with its length captured at open time.
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Open `path` for windowed reading.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }

    /// Wrap an already-open file.
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(FileSource { file, len })
    }
}

impl WindowSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, max_len: usize) -> io::Result<Vec<u8>> {
        if offset >= self.len {
            return Ok(Vec::new());
        }
        let take = (self.len - offset).min(max_len as u64) as usize;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; take];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Bounded accumulator over a non-seekable stream.
///
/// Keeps the first `block_size` bytes and a rolling window of the last
/// `block_size` bytes while counting the total length; memory use is
/// bounded by `2 * block_size` regardless of stream size. This covers
/// every window the extractor requests for current models (no middle
/// block, no offset probes).
pub struct StreamWindows {
    head: Vec<u8>,
    tail: Vec<u8>,
    len: u64,
}

impl StreamWindows {
    /// Drain `reader`, retaining only the leading and trailing windows.
    pub fn from_reader<R: Read>(reader: &mut R, block_size: usize) -> io::Result<Self> {
        let mut head = Vec::with_capacity(block_size);
        let mut tail: Vec<u8> = Vec::with_capacity(block_size);
        let mut len = 0u64;
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            len += n as u64;
            let chunk = &buf[..n];
            if head.len() < block_size {
                let take = (block_size - head.len()).min(chunk.len());
                head.extend_from_slice(&chunk[..take]);
            }
            if chunk.len() >= block_size {
                tail.clear();
                tail.extend_from_slice(&chunk[chunk.len() - block_size..]);
            } else {
                let keep = block_size - chunk.len();
                if tail.len() > keep {
                    tail.drain(..tail.len() - keep);
                }
                tail.extend_from_slice(chunk);
            }
        }
        Ok(StreamWindows { head, tail, len })
    }
}

impl WindowSource for StreamWindows {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, max_len: usize) -> io::Result<Vec<u8>> {
        if offset >= self.len {
            return Ok(Vec::new());
        }
        let take = (self.len - offset).min(max_len as u64) as usize;
        if offset + take as u64 <= self.head.len() as u64 {
            let start = offset as usize;
            return Ok(self.head[start..start + take].to_vec());
        }
        let tail_start = self.len - self.tail.len() as u64;
        if offset >= tail_start {
            let start = (offset - tail_start) as usize;
            return Ok(self.tail[start..start + take].to_vec());
        }
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "requested range is outside the buffered stream windows",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_reads_are_clipped() {
        let mut source: &[u8] = b"hello";
        assert_eq!(source.read_at(0, 3).unwrap(), b"hel");
        assert_eq!(source.read_at(3, 10).unwrap(), b"lo");
        assert_eq!(source.read_at(5, 4).unwrap(), b"");
        assert_eq!(source.read_at(100, 4).unwrap(), b"");
        assert_eq!(WindowSource::len(&source), 5);
    }

    #[test]
    fn test_stream_windows_short_stream() {
        // Shorter than one block: head and tail both hold everything.
        let data = b"short stream".to_vec();
        let mut windows = StreamWindows::from_reader(&mut &data[..], 64).unwrap();
        assert_eq!(windows.len(), data.len() as u64);
        assert_eq!(windows.read_at(0, 64).unwrap(), data);
        assert_eq!(windows.read_at(0, data.len()).unwrap(), data);
    }

    #[test]
    fn test_stream_windows_long_stream() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let block = 4096;
        let mut windows = StreamWindows::from_reader(&mut &data[..], block).unwrap();
        assert_eq!(windows.len(), data.len() as u64);
        assert_eq!(windows.read_at(0, block).unwrap(), &data[..block]);
        let tail_start = data.len() - block;
        assert_eq!(
            windows.read_at(tail_start as u64, block).unwrap(),
            &data[tail_start..]
        );
        // A middle range was never buffered.
        assert!(windows.read_at(50_000, 16).is_err());
    }

    #[test]
    fn test_stream_windows_empty_stream() {
        let mut windows = StreamWindows::from_reader(&mut &b""[..], 4096).unwrap();
        assert_eq!(windows.len(), 0);
        assert!(windows.is_empty());
        assert_eq!(windows.read_at(0, 16).unwrap(), b"");
    }

    #[test]
    fn test_file_source_matches_slice() {
        let dir = std::env::temp_dir().join("deeptype_test_source");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.bin");
        let data = b"The quick brown fox jumps over the lazy dog";
        std::fs::write(&path, data).unwrap();

        let mut file = FileSource::open(&path).unwrap();
        let mut slice: &[u8] = data;
        assert_eq!(file.len(), WindowSource::len(&slice));
        for (offset, max_len) in [(0u64, 9usize), (4, 100), (42, 10), (44, 1), (99, 3)] {
            assert_eq!(
                file.read_at(offset, max_len).unwrap(),
                slice.read_at(offset, max_len).unwrap(),
                "mismatch at offset {offset}"
            );
        }
        let _ = std::fs::remove_file(&path);
    }
}
