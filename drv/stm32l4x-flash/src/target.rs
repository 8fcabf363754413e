//! The boundary this crate consumes from the host debugging/programming
//! framework. Everything here is a collaborator interface, not something
//! this crate implements — the host target abstraction, working-area
//! allocator, and asynchronous flash-algorithm runner all live on the other
//! side of it (see spec §6, "Consumed from the host target interface").

use crate::error::Error;

/// Coarse state of the attached target, as last observed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Halted,
    Running,
    Reset,
    Unknown,
}

/// A scratch RAM or code region the host's working-area allocator has
/// reserved on the target. Freed through [`Target::free_working_area`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingArea {
    pub address: u32,
    pub size: u32,
}

/// Severity levels the host framework's logger accepts. Distinct from the
/// `log` crate macros this crate also emits internally (see
/// [`crate::Error`] docs and SPEC_FULL.md §4.L) — this is the channel the
/// host's own scripting console reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Debug,
}

pub trait Logger {
    fn log(&self, level: LogLevel, message: &str);
}

/// A register parameter passed to the asynchronous flash-algorithm runner.
/// Corresponds to one of the five 32-bit stub argument slots in
/// [`crate::stub::StubParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegParam {
    pub register: u8,
    pub value: u32,
}

/// Parameters for [`Target::run_flash_async`], gathering the arguments the
/// host's asynchronous streaming primitive needs: the stub entry point, the
/// ring buffer region it drains from, the register values the stub expects
/// on entry, and the payload the host producer streams into the ring.
pub struct FlashAsyncParams<'a> {
    pub entry: u32,
    pub exit_breakpoint: u32,
    pub ring_start: u32,
    pub ring_size: u32,
    pub block_bytes: u32,
    pub reg_params: &'a [RegParam],
    pub payload: &'a [u8],
}

/// What the asynchronous flash-algorithm runner reported once it stopped
/// streaming. `FlashOpFailed` means the stub itself halted with an error
/// latched in its outbound `r0` slot (spec §4.G step 6) — distinct from a
/// transport-level `Error` from the runner invocation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashAsyncOutcome {
    Done,
    FlashOpFailed,
}

/// The opaque, fallible operations this crate treats as out of scope: memory
/// access over the debug transport, target state queries, the working-area
/// allocator, and the asynchronous flash-algorithm runner.
pub trait Target {
    fn read_u16(&mut self, addr: u32) -> Result<u16, Error>;
    fn read_u32(&mut self, addr: u32) -> Result<u32, Error>;
    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), Error>;

    fn target_state(&mut self) -> Result<TargetState, Error>;

    fn alloc_working_area(&mut self, size: u32) -> Result<WorkingArea, Error>;
    /// Like [`Target::alloc_working_area`], but allowed to return `None`
    /// instead of an error when the allocator simply has nothing that big
    /// left — used by the streaming writer's ring-buffer backoff.
    fn alloc_working_area_try(&mut self, size: u32) -> Option<WorkingArea>;
    fn free_working_area(&mut self, area: WorkingArea) -> Result<(), Error>;

    fn write_buffer(&mut self, addr: u32, bytes: &[u8]) -> Result<(), Error>;

    /// Runs the uploaded stub asynchronously: streams `payload` into the
    /// ring at `ring_start..ring_start+ring_size` in `block_bytes` chunks
    /// while the stub (already running at `entry`) drains it, until
    /// `words_remaining` reaches zero or the stub halts at
    /// `exit_breakpoint` with an error latched.
    fn run_flash_async(
        &mut self,
        params: FlashAsyncParams<'_>,
    ) -> Result<FlashAsyncOutcome, Error>;

    /// One millisecond of yield between successive status polls, so a
    /// caller's sleep granularity never inflates the wall-clock deadline
    /// (spec §9, "Timeouts").
    fn poll_delay(&mut self);

    /// Monotonic milliseconds since an arbitrary epoch, used to build
    /// deadlines instead of counting loop iterations.
    fn now_ms(&mut self) -> u64;
}
