//! Process-wide cache holding one layout per precision.
use once_cell::race::OnceBox;
use tracing::trace;

use crate::{ExponentialLayout, LayoutError, MAX_PRECISION};

const SLOTS: usize = MAX_PRECISION as usize + 1;

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: OnceBox<ExponentialLayout> = OnceBox::new();

static INSTANCES: [OnceBox<ExponentialLayout>; SLOTS] = [EMPTY_SLOT; SLOTS];

/// Gets the published layout for `precision`, building and publishing it if necessary.
///
/// Callers racing on an empty slot may each build a candidate, but only the first one to be
/// published is ever handed out. The others are dropped.
pub(crate) fn get_or_create(precision: u8) -> Result<&'static ExponentialLayout, LayoutError> {
    let slot = INSTANCES
        .get(usize::from(precision))
        .ok_or(LayoutError::InvalidPrecision { precision })?;

    loop {
        if let Some(layout) = slot.get() {
            return Ok(layout);
        }

        // A failed publish means another caller won, so the next lookup succeeds.
        let candidate = Box::new(ExponentialLayout::build(precision));
        if slot.set(candidate).is_err() {
            trace!(precision, "Discarded exponential layout built concurrently.");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::get_or_create;
    use crate::{LayoutError, MAX_PRECISION};

    #[test]
    fn test_same_instance_per_precision() {
        for precision in 0..=MAX_PRECISION {
            let first = get_or_create(precision).unwrap();
            let second = get_or_create(precision).unwrap();
            assert!(std::ptr::eq(first, second));
            assert_eq!(first.precision(), precision);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(get_or_create(11), Err(LayoutError::InvalidPrecision { precision: 11 }));
    }

    #[test]
    fn test_concurrent_first_use_publishes_once() {
        const THREADS: usize = 16;
        let barrier = Barrier::new(THREADS);

        let addresses = std::thread::scope(|s| {
            let handles = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        get_or_create(9).unwrap() as *const _ as usize
                    })
                })
                .collect::<Vec<_>>();
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>()
        });

        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(addresses[0], get_or_create(9).unwrap() as *const _ as usize);
    }
}
