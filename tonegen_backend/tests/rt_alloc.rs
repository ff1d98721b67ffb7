use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::Arc;

use tonegen_backend::audio_device::stream::render_into;
use tonegen_backend::{CallbackSlot, PerformanceMonitor, SourceProcessor, ToneOscillator};
use tonegen_core::{ControlEvent, ControlState, Waveform};

thread_local! {
    static ALLOC_COUNT: Cell<usize> = const { Cell::new(0) };
}

struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOC_COUNT.with(|c| c.set(c.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static A: CountingAllocator = CountingAllocator;

fn allocations() -> usize {
    ALLOC_COUNT.with(|c| c.get())
}

#[test]
fn render_path_does_not_allocate() {
    let controls = Arc::new(ControlState::default());
    let monitor = Arc::new(PerformanceMonitor::new(256, 96_000.0, 0.1));
    let slot = CallbackSlot::new(
        Box::new(SourceProcessor::new(ToneOscillator::new(Arc::clone(&controls)))),
        96_000.0,
        2,
        monitor,
    );
    let mut scratch = vec![0.0f32; 4096 * 2];
    let mut device_f32 = vec![0.0f32; 256 * 2];
    let mut device_i16 = vec![0i16; 256 * 2];

    let before = allocations();
    for i in 0..10_000 {
        // Control changes land between buffers, as they would from the key thread.
        match i % 4 {
            0 => controls.set_waveform(Waveform::Square),
            1 => controls.set_waveform(Waveform::Sawtooth),
            2 => {
                ControlEvent::IncreaseFrequency.apply(&controls);
            }
            _ => controls.set_waveform(Waveform::Sine),
        }
        render_into(&slot, &mut scratch, &mut device_f32);
        render_into(&slot, &mut scratch, &mut device_i16);
    }
    let after = allocations();

    assert_eq!(after, before, "render path should not allocate");
    assert_eq!(slot.frame_count(), 2 * 10_000 * 256);
}
