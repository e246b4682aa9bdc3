//! Page-aligned chunking of program requests

/// One page program transaction worth of a write request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
    /// Flash address of the first byte
    pub addr: u32,
    /// Index of the first byte in the caller's buffer
    pub start: usize,
    /// Number of bytes in this chunk
    pub len: usize,
}

impl PageChunk {
    /// Range of the caller's buffer covered by this chunk
    pub fn range(&self) -> core::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Iterator splitting `[offset, offset + len)` into chunks that never cross
/// a `chunk_size` boundary
///
/// Only the first chunk can start in the middle of a page, and only the
/// first and last chunk can be shorter than `chunk_size`. `chunk_size` must
/// divide the flash page size for the page constraint to hold.
#[derive(Debug, Clone)]
pub struct PageChunks {
    addr: u32,
    done: usize,
    len: usize,
    chunk_size: usize,
    byte_addr: usize,
}

impl PageChunks {
    /// Create a chunk iterator
    ///
    /// A `chunk_size` of zero is treated as one.
    pub fn new(offset: u32, len: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            addr: offset,
            done: 0,
            len,
            chunk_size,
            byte_addr: offset as usize % chunk_size,
        }
    }
}

impl Iterator for PageChunks {
    type Item = PageChunk;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done >= self.len {
            return None;
        }

        let chunk_len = core::cmp::min(self.len - self.done, self.chunk_size - self.byte_addr);
        let chunk = PageChunk {
            addr: self.addr,
            start: self.done,
            len: chunk_len,
        };

        self.addr = self.addr.wrapping_add(chunk_len as u32);
        self.done += chunk_len;
        self.byte_addr = 0;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done >= self.len {
            return (0, Some(0));
        }
        let first = core::cmp::min(self.len - self.done, self.chunk_size - self.byte_addr);
        let rest = self.len - self.done - first;
        let n = 1 + rest.div_ceil(self.chunk_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PageChunks {}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_boundary_property(offset: u32, len: usize, chunk_size: usize) {
        let chunks: heapless::Vec<PageChunk, 512> = PageChunks::new(offset, len, chunk_size).collect();
        assert_eq!(chunks.len(), PageChunks::new(offset, len, chunk_size).len());

        let total: usize = chunks.iter().map(|c| c.len).sum();
        assert_eq!(total, len, "offset {offset:#x} len {len}");

        let mut expected_addr = offset;
        let mut expected_start = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.addr, expected_addr);
            assert_eq!(chunk.start, expected_start);
            assert!(chunk.len > 0);

            // Never crosses a page boundary
            let first_page = chunk.addr as usize / chunk_size;
            let last_page = (chunk.addr as usize + chunk.len - 1) / chunk_size;
            assert_eq!(first_page, last_page, "chunk {i} crosses a page");

            // Every chunk after the first starts on a page boundary
            if i > 0 {
                assert_eq!(chunk.addr as usize % chunk_size, 0);
            }
            // Interior chunks are full
            if i > 0 && i + 1 < chunks.len() {
                assert_eq!(chunk.len, chunk_size);
            }

            expected_addr += chunk.len as u32;
            expected_start += chunk.len;
        }
    }

    #[test]
    fn test_chunks_boundary_property() {
        for chunk_size in [1usize, 4, 256] {
            for offset in [0u32, 1, 3, 4, 5, 255, 256, 257, 0x1000 - 2] {
                for len in [1usize, 2, 3, 4, 7, 8, 255, 256, 257, 600] {
                    if len / chunk_size + 2 > 512 {
                        continue;
                    }
                    check_boundary_property(offset, len, chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_unaligned_start() {
        let chunks: heapless::Vec<PageChunk, 8> = PageChunks::new(0x102, 9, 4).collect();
        let lens: heapless::Vec<usize, 8> = chunks.iter().map(|c| c.len).collect();
        assert_eq!(&lens[..], &[2, 4, 3]);
        assert_eq!(chunks[1].addr, 0x104);
        assert_eq!(chunks[2].range(), 6..9);
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(PageChunks::new(0x10, 0, 4).next(), None);
        assert_eq!(PageChunks::new(0x10, 0, 4).len(), 0);
    }

    #[test]
    fn test_aligned_request_is_all_full_chunks() {
        assert!(PageChunks::new(0x200, 256, 4).all(|c| c.len == 4));
    }
}
