/// An ordered group of items with its index and whether it is the last group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<T> {
    pub index: usize,
    pub members: Vec<T>,
    pub is_last: bool,
}

impl<T> Chunk<T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Split `items` into consecutive groups of at most `chunk_size`, keeping order.
///
/// Every group is full except possibly the last. An empty slice yields no groups.
///
/// # Panics
///
/// Panics if `chunk_size` is 0.
pub fn partition<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Chunk<T>> {
    assert!(chunk_size > 0, "chunk size must be non-zero");

    let num_chunks = items.len().div_ceil(chunk_size);
    items
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, slice)| Chunk {
            index: i,
            members: slice.to_vec(),
            is_last: i + 1 == num_chunks,
        })
        .collect()
}
