//! Rasterization of the grid into pixel buffers.
//!
//! The coordinator ([`frame::Renderer`]) owns a long-lived worker pool
//! and a glyph cache; each frame it repairs the incoming buffer from
//! its age, turns queued scroll damage into blits, composites sixels,
//! fans per-row jobs out to the pool and finishes with the
//! single-threaded overlay pass. See `frame` for the exact ordering
//! contract and `rowpaint` for the worker-side invariants.
//!
//! Concurrency model: the semantics layer
//! never runs concurrently with rendering; workers read the grid and
//! write disjoint pixel bands plus their own row's `clean` bits; the
//! coordinator waits for a completion acknowledgment per posted row
//! before the frame ends, so the barrier bounds every worker write.

pub mod frame;
pub mod glyph_cache;
pub mod overlays;
pub mod paint;
pub mod rowpaint;
pub mod timing;
pub mod workers;

pub use frame::{RenderConfig, Renderer};
pub use overlays::OverlayState;
pub use rowpaint::BoldInBright;
