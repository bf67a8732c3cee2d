//! Row scheduling for the filter engines.
//!
//! Every output row depends only on the (immutable) source image, so rows can
//! be computed in any order. With the `parallel` feature the rows are spread
//! over the rayon pool; the bytes produced are identical to the serial path.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How rows are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// One row after another on the calling thread.
    Serial,
    /// Rows distributed across the rayon global pool.
    #[cfg(feature = "parallel")]
    Parallel,
}

impl Default for Schedule {
    fn default() -> Self {
        #[cfg(feature = "parallel")]
        {
            Schedule::Parallel
        }
        #[cfg(not(feature = "parallel"))]
        {
            Schedule::Serial
        }
    }
}

/// Calls `f(y, row)` for every `row_len`-sized chunk of `dst`.
pub(crate) fn for_each_row<T, F>(dst: &mut [T], row_len: usize, schedule: Schedule, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    match schedule {
        Schedule::Serial => dst
            .chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row)),
        #[cfg(feature = "parallel")]
        Schedule::Parallel => dst
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_visited_once_with_index() {
        let mut buf = vec![0usize; 12];
        for_each_row(&mut buf, 4, Schedule::default(), |y, row| {
            for v in row.iter_mut() {
                *v += y + 1;
            }
        });
        assert_eq!(buf, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    }
}
