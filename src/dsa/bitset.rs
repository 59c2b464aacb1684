// fixed-width bitmask, bit = true means the position is occupied
// packed into bytes, LSB first inside each byte

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct SlotMask {
    size: usize,
    bytes: Vec<u8>,
}

impl SlotMask {
    pub(crate) fn new(size: usize) -> Self {
        let byte_len = size.div_ceil(8);
        Self {
            size,
            bytes: vec![0u8; byte_len],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    pub(crate) fn get(&self, index: usize) -> Option<bool> {
        if index >= self.size {
            return None;
        }
        let byte = self.bytes[index / 8];
        let mask = 1u8 << (index % 8);
        Some(byte & mask > 0)
    }

    fn store(&mut self, index: usize, bit: bool) {
        debug_assert!(index < self.size);
        let byte = &mut self.bytes[index / 8];
        let mask = 1u8 << (index % 8);
        if bit {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    // whole of [start, start+width) is clear
    pub(crate) fn is_range_free(&self, start: usize, width: usize) -> bool {
        if start + width > self.size {
            return false;
        }
        (start..start + width).all(|i| !self.get(i).unwrap_or(true))
    }

    pub(crate) fn set_range(&mut self, start: usize, width: usize) {
        debug_assert!(start + width <= self.size);
        for i in start..start + width {
            // double occupation breaks the ledger invariant
            debug_assert!(!self.get(i).unwrap_or(true));
            self.store(i, true);
        }
    }

    pub(crate) fn clear_range(&mut self, start: usize, width: usize) {
        debug_assert!(start + width <= self.size);
        for i in start..start + width {
            debug_assert!(self.get(i).unwrap_or(false));
            self.store(i, false);
        }
    }

    pub(crate) fn count_free(&self) -> usize {
        (0..self.size).filter(|i| !self.get(*i).unwrap_or(true)).count()
    }

    // maximal runs of clear bits as (start, len), ascending
    pub(crate) fn free_runs(&self) -> Vec<(usize, usize)> {
        let mut runs = vec![];
        let mut run_start = None;
        for i in 0..self.size {
            let occupied = self.get(i).unwrap_or(true);
            match (occupied, run_start) {
                (false, None) => run_start = Some(i),
                (true, Some(start)) => {
                    runs.push((start, i - start));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            runs.push((start, self.size - start));
        }
        runs
    }
}
