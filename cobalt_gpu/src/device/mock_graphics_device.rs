/// Mock graphics device for unit tests (no GPU required)
///
/// Every submission, presentation, acquisition and idle wait is appended to a
/// shared journal so tests can assert on the exact synchronization wiring.
/// Fences are signaled by the queue on submit unless auto-signal is turned
/// off, which simulates a GPU that never finishes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::device::{
    Buffer, BufferImageCopy, CommandAllocator, CommandBufferLevel, CommandBufferUsage,
    CommandRecorder, DependencyInfo, Extent2D, Extent3D, Fence, GraphicsDevice, Image,
    ImageLayout, IndexType, Pipeline, PipelineStages, PresentInfo, PresentStatus, Queue,
    Rect2D, RenderingInfo, Semaphore, ShaderStages, SubmitInfo, Swapchain, Viewport,
};
use crate::error::{Error, Result};
use crate::resource::{AsAny, Resource};

// ============================================================================
// Journal
// ============================================================================

/// Something the mock backend observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Acquire {
        semaphore: u64,
        image: Option<u32>,
    },
    Submit {
        waits: Vec<(u64, PipelineStages)>,
        command_buffers: usize,
        signals: Vec<(u64, PipelineStages)>,
        fence: Option<u64>,
    },
    Present {
        waits: Vec<u64>,
        images: Vec<u32>,
    },
    WaitIdle,
}

pub type Journal = Arc<Mutex<Vec<MockEvent>>>;

/// Id recorded for objects not created by the mock backend
pub const FOREIGN_ID: u64 = u64::MAX;

fn semaphore_id(semaphore: &dyn Semaphore) -> u64 {
    semaphore
        .as_any()
        .downcast_ref::<MockSemaphore>()
        .map_or(FOREIGN_ID, |s| s.id)
}

// ============================================================================
// Mock Fence / Semaphore
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFenceState {
    pub id: u64,
    pub signaled: bool,
    pub reset_count: u32,
    pub wait_count: u32,
}

pub struct MockFence {
    state: Arc<Mutex<MockFenceState>>,
}

impl MockFence {
    pub fn id(&self) -> u64 {
        self.state.lock().unwrap().id
    }

    /// Simulate GPU completion
    pub fn signal(&self) {
        self.state.lock().unwrap().signaled = true;
    }
}

impl Fence for MockFence {
    fn wait(&self, timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.wait_count += 1;
        if state.signaled {
            Ok(())
        } else {
            Err(Error::Timeout(timeout))
        }
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.signaled = false;
        state.reset_count += 1;
        Ok(())
    }

    fn is_signaled(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().signaled)
    }
}

#[derive(Debug)]
pub struct MockSemaphore {
    pub id: u64,
}

impl Semaphore for MockSemaphore {}

// ============================================================================
// Mock Queue
// ============================================================================

pub struct MockQueue {
    journal: Journal,
    auto_signal: AtomicBool,
    present_results: Mutex<VecDeque<Result<PresentStatus>>>,
    fail_next_submit: AtomicBool,
}

impl MockQueue {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            auto_signal: AtomicBool::new(true),
            present_results: Mutex::new(VecDeque::new()),
            fail_next_submit: AtomicBool::new(false),
        }
    }

    /// Whether submit signals its fence immediately (default: true)
    pub fn set_auto_signal(&self, enabled: bool) {
        self.auto_signal.store(enabled, Ordering::SeqCst);
    }

    /// Queue the result of a future `present` call
    pub fn script_present(&self, result: Result<PresentStatus>) {
        self.present_results.lock().unwrap().push_back(result);
    }

    /// Make the next submit fail with a backend error
    pub fn fail_next_submit(&self) {
        self.fail_next_submit.store(true, Ordering::SeqCst);
    }
}

impl Queue for MockQueue {
    fn submit(&self, info: &SubmitInfo<'_>, fence: Option<&dyn Fence>) -> Result<()> {
        if self.fail_next_submit.swap(false, Ordering::SeqCst) {
            return Err(Error::BackendError("mock submit failure".to_string()));
        }

        let mock_fence = fence.and_then(|f| f.as_any().downcast_ref::<MockFence>());
        if let Some(f) = mock_fence {
            if self.auto_signal.load(Ordering::SeqCst) {
                f.signal();
            }
        }

        self.journal.lock().unwrap().push(MockEvent::Submit {
            waits: info.waits().iter().map(|w| (semaphore_id(w.semaphore), w.stages)).collect(),
            command_buffers: info.command_buffers().len(),
            signals: info.signals().iter().map(|s| (semaphore_id(s.semaphore), s.stages)).collect(),
            fence: mock_fence.map(|f| f.id()),
        });
        Ok(())
    }

    fn present(&self, info: &PresentInfo<'_>) -> Result<PresentStatus> {
        self.journal.lock().unwrap().push(MockEvent::Present {
            waits: info.waits().iter().map(|s| semaphore_id(*s)).collect(),
            images: info.images().iter().map(|(_, index)| *index).collect(),
        });
        self.present_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PresentStatus::Optimal))
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

pub struct MockGraphicsDevice {
    journal: Journal,
    queue: MockQueue,
    fences: Mutex<Vec<Arc<Mutex<MockFenceState>>>>,
    next_id: AtomicU64,
    fail_wait_idle: AtomicBool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        Self {
            queue: MockQueue::new(journal.clone()),
            journal,
            fences: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_wait_idle: AtomicBool::new(false),
        }
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// Snapshot of the journal
    pub fn events(&self) -> Vec<MockEvent> {
        self.journal.lock().unwrap().clone()
    }

    /// Snapshot of every fence, in creation order
    pub fn fence_states(&self) -> Vec<MockFenceState> {
        self.fences
            .lock()
            .unwrap()
            .iter()
            .map(|state| state.lock().unwrap().clone())
            .collect()
    }

    pub fn queue(&self) -> &MockQueue {
        &self.queue
    }

    /// Make the next `wait_idle` report a lost device
    pub fn fail_next_wait_idle(&self) {
        self.fail_wait_idle.store(true, Ordering::SeqCst);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        let state = Arc::new(Mutex::new(MockFenceState {
            id: self.next_id(),
            signaled,
            reset_count: 0,
            wait_count: 0,
        }));
        self.fences.lock().unwrap().push(state.clone());
        Ok(Box::new(MockFence { state }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(MockSemaphore { id: self.next_id() }))
    }

    fn create_command_allocator(&self) -> Result<Box<dyn CommandAllocator>> {
        Ok(Box::new(MockCommandAllocator::new()))
    }

    fn graphics_queue(&self) -> &dyn Queue {
        &self.queue
    }

    fn wait_idle(&self) -> Result<()> {
        self.journal.lock().unwrap().push(MockEvent::WaitIdle);
        if self.fail_wait_idle.swap(false, Ordering::SeqCst) {
            return Err(Error::BackendError("device lost".to_string()));
        }
        Ok(())
    }
}

impl Resource for MockGraphicsDevice {}

// ============================================================================
// Mock Command Allocator / Recorder
// ============================================================================

pub struct MockCommandAllocator {
    allocated: Arc<AtomicU32>,
    fail: bool,
}

impl MockCommandAllocator {
    pub fn new() -> Self {
        Self { allocated: Arc::new(AtomicU32::new(0)), fail: false }
    }

    /// Allocator whose every allocation fails
    pub fn failing() -> Self {
        Self { allocated: Arc::new(AtomicU32::new(0)), fail: true }
    }

    /// Live recorder counter, decremented when a recorder is dropped
    pub fn allocated(&self) -> Arc<AtomicU32> {
        self.allocated.clone()
    }
}

impl CommandAllocator for MockCommandAllocator {
    fn allocate(&mut self, level: CommandBufferLevel) -> Result<Box<dyn CommandRecorder>> {
        if self.fail {
            return Err(Error::OutOfMemory);
        }
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandRecorder {
            level,
            commands: Vec::new(),
            allocated: self.allocated.clone(),
        }))
    }
}

/// Records every emitted command as a string
pub struct MockCommandRecorder {
    pub level: CommandBufferLevel,
    commands: Vec<String>,
    allocated: Arc<AtomicU32>,
}

impl MockCommandRecorder {
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    fn push(&mut self, command: String) {
        self.commands.push(command);
    }
}

impl Drop for MockCommandRecorder {
    fn drop(&mut self) {
        self.allocated.fetch_sub(1, Ordering::SeqCst);
    }
}

impl CommandRecorder for MockCommandRecorder {
    fn begin(&mut self, usage: CommandBufferUsage) -> Result<()> {
        self.push(format!("begin {:#x}", usage.bits()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.push("end".to_string());
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.commands.clear();
        self.push("reset".to_string());
        Ok(())
    }

    fn begin_rendering(&mut self, info: &RenderingInfo<'_>) {
        let area = info.render_area;
        self.push(format!(
            "begin_rendering {},{} {}x{} colors={} depth={}",
            area.x,
            area.y,
            area.width,
            area.height,
            info.color_attachments.len(),
            info.depth_attachment.is_some()
        ));
    }

    fn end_rendering(&mut self) {
        self.push("end_rendering".to_string());
    }

    fn pipeline_barrier(&mut self, dependency: &DependencyInfo<'_>) {
        self.push(format!(
            "barrier memory={} images={}",
            dependency.memory_barriers.len(),
            dependency.image_barriers.len()
        ));
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.push(format!("set_viewport {}x{}", viewport.width, viewport.height));
    }

    fn set_scissor(&mut self, scissor: &Rect2D) {
        self.push(format!(
            "set_scissor {},{} {}x{}",
            scissor.x, scissor.y, scissor.width, scissor.height
        ));
    }

    fn bind_pipeline(&mut self, pipeline: &dyn Pipeline, frame_index: u32) {
        let name = pipeline
            .as_any()
            .downcast_ref::<MockPipeline>()
            .map_or("?", |p| p.name.as_str())
            .to_string();
        self.push(format!("bind_pipeline {} frame={}", name, frame_index));
    }

    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&dyn Buffer], offsets: &[u64]) {
        self.push(format!(
            "bind_vertex_buffers first={} count={} offsets={:?}",
            first_binding,
            buffers.len(),
            offsets
        ));
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) {
        self.push(format!("bind_index_buffer size={} offset={} {:?}", buffer.size(), offset, index_type));
    }

    fn push_constants(&mut self, _pipeline: &dyn Pipeline, stages: ShaderStages, offset: u32, data: &[u8]) {
        self.push(format!("push_constants stages={:#x} offset={} len={}", stages.bits(), offset, data.len()));
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.push(format!("draw {} {} {} {}", vertex_count, instance_count, first_vertex, first_instance));
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.push(format!(
            "draw_indexed {} {} {} {} {}",
            index_count, instance_count, first_index, vertex_offset, first_instance
        ));
    }

    fn copy_buffer_to_image(
        &mut self,
        src: &dyn Buffer,
        dst: &dyn Image,
        dst_layout: ImageLayout,
        regions: &[BufferImageCopy],
    ) {
        let extent = dst.extent();
        self.push(format!(
            "copy_buffer_to_image size={} {}x{} {:?} regions={}",
            src.size(),
            extent.width,
            extent.height,
            dst_layout,
            regions.len()
        ));
    }

    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) {
        self.push(format!("copy_buffer {}->{} size={}", src.size(), dst.size(), size));
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchain {
    journal: Journal,
    script: Mutex<VecDeque<Result<Option<u32>>>>,
    next_image: AtomicU32,
    images: Vec<MockImage>,
    extent: Extent2D,
    recreate_image_count: Option<u32>,
    pub recreate_count: u32,
}

impl MockSwapchain {
    /// Swapchain sharing `device`'s journal
    pub fn new(device: &MockGraphicsDevice, image_count: u32, extent: Extent2D) -> Self {
        Self {
            journal: device.journal(),
            script: Mutex::new(VecDeque::new()),
            next_image: AtomicU32::new(0),
            images: Self::make_images(image_count, extent),
            extent,
            recreate_image_count: None,
            recreate_count: 0,
        }
    }

    /// Queue the result of a future acquire; unscripted acquires go round-robin
    pub fn script_acquire(&self, result: Result<Option<u32>>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Image count used by the next `recreate`
    pub fn set_recreate_image_count(&mut self, count: u32) {
        self.recreate_image_count = Some(count);
    }

    pub fn image(&self, index: u32) -> &MockImage {
        &self.images[index as usize]
    }

    fn make_images(count: u32, extent: Extent2D) -> Vec<MockImage> {
        (0..count).map(|_| MockImage::new(extent.into())).collect()
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&self, signal: &dyn Semaphore) -> Result<Option<u32>> {
        let scripted = self.script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(result) => result,
            None => {
                let next = self.next_image.fetch_add(1, Ordering::SeqCst);
                Ok(Some(next % self.images.len() as u32))
            }
        };
        if let Ok(image) = &result {
            self.journal.lock().unwrap().push(MockEvent::Acquire {
                semaphore: semaphore_id(signal),
                image: *image,
            });
        }
        result
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.extent = Extent2D::new(width, height);
        let count = self.recreate_image_count.take().unwrap_or(self.images.len() as u32);
        self.images = Self::make_images(count, self.extent);
        self.next_image.store(0, Ordering::SeqCst);
        self.recreate_count += 1;
        Ok(())
    }
}

impl Resource for MockSwapchain {}

// ============================================================================
// Mock Buffer / Image / Pipeline
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
}

impl MockBuffer {
    pub fn new(size: u64) -> Self {
        Self { size }
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }
}

impl Resource for MockBuffer {}

#[derive(Debug)]
pub struct MockImage {
    pub extent: Extent3D,
}

impl MockImage {
    pub fn new(extent: Extent3D) -> Self {
        Self { extent }
    }
}

impl Image for MockImage {
    fn extent(&self) -> Extent3D {
        self.extent
    }
}

impl Resource for MockImage {}

#[derive(Debug)]
pub struct MockPipeline {
    pub name: String,
}

impl MockPipeline {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Pipeline for MockPipeline {}

impl Resource for MockPipeline {}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
