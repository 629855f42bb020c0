use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded byte buffer that keeps only the most recent `cap` bytes.
/// Used to hold the tail of a subprocess stream.
#[derive(Clone)]
pub struct RingBytes {
    inner: Arc<Mutex<VecDeque<u8>>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(cap))),
            cap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, data: &[u8]) {
        if self.cap == 0 {
            return;
        }
        let mut g = self.lock();
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.lock();
        let mut vec = Vec::with_capacity(g.len());
        vec.extend(g.iter().copied());
        vec
    }

    /// Tail as text. A multi-byte character cut at the front is replaced
    /// rather than rejected.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).into_owned()
    }
}

/// Keep at most the last `max` bytes of `s`, on a char boundary.
pub fn tail_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    s[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_tail() {
        let ring = RingBytes::new(5);
        ring.push(b"hello");
        ring.push(b" world");
        assert_eq!(ring.to_bytes(), b"world");
    }

    #[test]
    fn oversized_chunk_is_truncated() {
        let ring = RingBytes::new(3);
        ring.push(b"abcdef");
        assert_eq!(ring.to_string_lossy(), "def");
    }

    #[test]
    fn tail_str_respects_char_boundaries() {
        assert_eq!(tail_str("abc", 10), "abc");
        assert_eq!(tail_str("héllo", 4), "llo");
    }
}
