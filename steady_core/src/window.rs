//! Fixed-capacity ring buffer used for the stability-flag window and the
//! position history.
//!
//! Storage is a single `Vec` allocated up front; `head` points at the slot
//! the next push writes to. Once full, each push overwrites the oldest entry.

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    cap: usize,
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Capacity is clamped to at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            buf: Vec::with_capacity(cap),
            cap,
            head: 0,
        }
    }

    /// Push a value, evicting and returning the oldest one when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() < self.cap {
            self.buf.push(value);
            None
        } else {
            Some(std::mem::replace(&mut self.buf[self.head], value))
        };
        self.head = (self.head + 1) % self.cap;
        evicted
    }

    /// Most recently pushed value.
    pub fn latest(&self) -> Option<T> {
        if self.buf.is_empty() {
            return None;
        }
        let idx = (self.head + self.cap - 1) % self.cap;
        self.buf.get(idx).copied()
    }

    /// Iterate most-recent-first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let len = self.buf.len();
        (0..len).map(move |i| {
            let idx = (self.head + self.cap - 1 - i) % self.cap;
            self.buf[idx]
        })
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.head = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.len() == self.cap
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }
}

impl RingBuffer<bool> {
    pub fn count_true(&self) -> usize {
        self.buf.iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::RingBuffer;

    #[test]
    fn iterates_most_recent_first() {
        let mut rb = RingBuffer::with_capacity(3);
        rb.push(1);
        rb.push(2);
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(rb.latest(), Some(2));
        assert!(!rb.is_full());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut rb = RingBuffer::with_capacity(3);
        assert_eq!(rb.push(1), None);
        assert_eq!(rb.push(2), None);
        assert_eq!(rb.push(3), None);
        assert_eq!(rb.push(4), Some(1));
        assert_eq!(rb.push(5), Some(2));
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec![5, 4, 3]);
        assert_eq!(rb.latest(), Some(5));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut rb = RingBuffer::with_capacity(0);
        assert_eq!(rb.capacity(), 1);
        rb.push('a');
        assert_eq!(rb.push('b'), Some('a'));
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec!['b']);
    }

    #[test]
    fn clear_resets_everything() {
        let mut rb = RingBuffer::with_capacity(2);
        rb.push(true);
        rb.push(false);
        rb.push(true);
        rb.clear();
        assert!(rb.is_empty());
        assert_eq!(rb.latest(), None);
        rb.push(false);
        assert_eq!(rb.iter().collect::<Vec<_>>(), vec![false]);
    }

    #[test]
    fn counts_flags() {
        let mut rb = RingBuffer::with_capacity(4);
        for f in [true, false, true, true, true] {
            rb.push(f);
        }
        // window now holds [false, true, true, true]
        assert_eq!(rb.count_true(), 3);
    }
}
