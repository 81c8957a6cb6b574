use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::sink::AudioSink;

/// Single-producer / single-consumer ring of stereo i16 frames.
///
/// The render thread (producer) feeds an audio callback thread (consumer)
/// without locks. Each frame is packed into one `AtomicU32`, so no slot is
/// ever observed half-written.
///
/// The queue is *lossy* when full: new frames are dropped and counted.
pub fn sample_queue(capacity_frames: usize) -> (SampleProducer, SampleConsumer) {
    // One spare slot so head == tail always means empty.
    let slots = capacity_frames.saturating_add(1).max(2);
    let shared = Arc::new(Shared {
        slots: (0..slots).map(|_| AtomicU32::new(0)).collect(),
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
        dropped: AtomicU64::new(0),
    });
    (
        SampleProducer {
            shared: Arc::clone(&shared),
        },
        SampleConsumer { shared },
    )
}

struct Shared {
    slots: Box<[AtomicU32]>,
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicU64,
}

impl Shared {
    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() { 0 } else { next }
    }

    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            head - tail
        } else {
            self.slots.len() - tail + head
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}

#[inline]
fn pack(left: i16, right: i16) -> u32 {
    (left as u16 as u32) << 16 | right as u16 as u32
}

#[inline]
fn unpack(frame: u32) -> (i16, i16) {
    ((frame >> 16) as u16 as i16, frame as u16 as i16)
}

pub struct SampleProducer {
    shared: Arc<Shared>,
}

impl SampleProducer {
    /// Queue one frame. Returns false (and counts a drop) when full.
    pub fn push(&self, left: i16, right: i16) -> bool {
        let head = self.shared.head.load(Ordering::Relaxed);
        let next = self.shared.advance(head);
        if next == self.shared.tail.load(Ordering::Acquire) {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        self.shared.slots[head].store(pack(left, right), Ordering::Relaxed);
        self.shared.head.store(next, Ordering::Release);
        true
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    /// Frames rejected because the consumer fell behind.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

impl AudioSink for SampleProducer {
    #[inline]
    fn audio_sample(&mut self, left: i16, right: i16) {
        self.push(left, right);
    }
}

pub struct SampleConsumer {
    shared: Arc<Shared>,
}

impl SampleConsumer {
    pub fn pop(&self) -> Option<(i16, i16)> {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        if tail == self.shared.head.load(Ordering::Acquire) {
            return None;
        }
        let frame = self.shared.slots[tail].load(Ordering::Relaxed);
        self.shared
            .tail
            .store(self.shared.advance(tail), Ordering::Release);
        Some(unpack(frame))
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
