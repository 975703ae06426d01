use core::{
    alloc::{GlobalAlloc, Layout},
    ffi::c_void,
};

extern "C" {
    fn rust_helper_kmalloc(size: usize, align: usize) -> *mut c_void;
    fn kfree(ptr: *const c_void);
}

pub struct KernelAllocator;

unsafe impl GlobalAlloc for KernelAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // kmalloc is an inline function and can't be bound to directly.
        rust_helper_kmalloc(layout.size(), layout.align()) as *mut u8
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        kfree(ptr as *const c_void);
    }
}

#[global_allocator]
static ALLOCATOR: KernelAllocator = KernelAllocator;
