/// Default capacity substituted when a buffer is created with capacity `0`.
pub const DEFAULT_CAPACITY: usize = config::DEFAULT_BUFFER_SIZE;

/// Fixed-capacity accumulator for rows waiting to be flushed.
///
/// `register` always accepts the row and reports whether the buffer has
/// reached capacity; the owner is expected to flush and [`reset`] when it
/// does. Rows are kept in insertion order.
///
/// [`reset`]: InsertBuffer::reset
#[derive(Debug, Clone)]
pub struct InsertBuffer {
    rows: Vec<Vec<String>>,
    capacity: usize,
    full: bool,
}

impl InsertBuffer {
    /// Creates an empty buffer. A capacity of `0` means [`DEFAULT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            rows: Vec::with_capacity(capacity.min(1024)),
            capacity,
            full: false,
        }
    }

    /// Appends `row`. Returns `true` once the buffer holds `capacity` rows.
    pub fn register(&mut self, row: Vec<String>) -> bool {
        self.rows.push(row);
        if self.rows.len() >= self.capacity {
            self.full = true;
        }
        self.full
    }

    /// Drops every buffered row and clears the full flag.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.full = false;
    }

    /// Buffered rows in insertion order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Index of the last valid row, `-1` when empty.
    pub fn pos(&self) -> isize {
        self.rows.len() as isize - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InsertBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
