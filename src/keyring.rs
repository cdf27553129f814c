//! The 6612 console's keyboard ring buffer: a fixed-size, lock-free
//! single-producer/single-consumer FIFO. The windowing layer (producer) may
//! run on a separate host thread; `key_in` is written only by the producer,
//! `key_out` only by the consumer.

use std::array;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

/// One slot is always left empty to distinguish full from empty without an
/// extra counter, so the ring holds at most 49 live keys.
const RING_SIZE: usize = 50;

struct Inner {
    buf: [AtomicU8; RING_SIZE],
    key_in: AtomicUsize,
    key_out: AtomicUsize,
}

/// Producer endpoint: `push` is the only operation, matching `consoleQueueKey`.
pub struct KeyProducer(Arc<Inner>);

/// Consumer endpoint: `pop` and `is_empty`, matching `consoleGetKey`'s
/// underlying ring access.
pub struct KeyConsumer(Arc<Inner>);

pub fn key_ring() -> (KeyProducer, KeyConsumer) {
    let inner = Arc::new(Inner {
        buf: array::from_fn(|_| AtomicU8::new(0)),
        key_in: AtomicUsize::new(0),
        key_out: AtomicUsize::new(0),
    });
    (KeyProducer(Arc::clone(&inner)), KeyConsumer(inner))
}

impl KeyProducer {
    /// Clone a second producer handle, e.g. to hand to a windowing thread.
    pub fn clone_handle(&self) -> KeyProducer {
        KeyProducer(Arc::clone(&self.0))
    }

    /// On overflow the newest character is dropped, not the oldest.
    pub fn push(&self, ch: u8) {
        let cur_in = self.0.key_in.load(Ordering::Acquire);
        let next_in = (cur_in + 1) % RING_SIZE;
        let cur_out = self.0.key_out.load(Ordering::Acquire);
        if next_in == cur_out {
            return;
        }
        self.0.buf[cur_in].store(ch, Ordering::Relaxed);
        self.0.key_in.store(next_in, Ordering::Release);
    }
}

impl KeyConsumer {
    pub fn pop(&self) -> Option<u8> {
        let cur_out = self.0.key_out.load(Ordering::Acquire);
        let cur_in = self.0.key_in.load(Ordering::Acquire);
        if cur_out == cur_in {
            return None;
        }
        let v = self.0.buf[cur_out].load(Ordering::Relaxed);
        self.0.key_out.store((cur_out + 1) % RING_SIZE, Ordering::Release);
        Some(v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.key_in.load(Ordering::Acquire) == self.0.key_out.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring_pops_none() {
        let (_p, c) = key_ring();
        assert!(c.is_empty());
        assert_eq!(c.pop(), None);
    }

    #[test]
    fn fifo_order_preserved() {
        let (p, c) = key_ring();
        p.push(1);
        p.push(2);
        p.push(3);
        assert_eq!(c.pop(), Some(1));
        assert_eq!(c.pop(), Some(2));
        assert_eq!(c.pop(), Some(3));
        assert_eq!(c.pop(), None);
    }

    #[test]
    fn overflow_drops_newest_not_oldest() {
        let (p, c) = key_ring();
        for i in 0..(RING_SIZE as u8 + 10) {
            p.push(i);
        }
        // Ring holds RING_SIZE - 1 live entries; the oldest pushed values
        // (0, 1, ...) must still be the ones readable back out.
        assert_eq!(c.pop(), Some(0));
        assert_eq!(c.pop(), Some(1));
    }
}
