//! Index-of-refraction stack for nested transparent media.
//!
//! The stack is a small `Copy` value: entering or leaving a medium returns a
//! new stack and leaves the caller's untouched, so reflection branches keep
//! sharing their parent's view while refraction branches get their own.

/// IORs closer than this are considered the same medium.
const IOR_TOLERANCE: f32 = 1e-5;

/// Media nested deeper than this are not tracked.
const CAPACITY: usize = 24;

/// Stack of the media a ray is currently inside, innermost on top.
///
/// The scene medium is implicit below the bottom entry.
#[derive(Debug, Clone, Copy)]
pub struct IorStack {
    media: [f32; CAPACITY],
    len: usize,
    scene_ior: f32,
}

impl IorStack {
    /// Empty stack: the ray is in the scene medium.
    pub fn new(scene_ior: f32) -> Self {
        Self {
            media: [0.0; CAPACITY],
            len: 0,
            scene_ior,
        }
    }

    /// IOR of the medium the ray is travelling through.
    pub fn current(&self) -> f32 {
        self.media[..self.len].last().copied().unwrap_or(self.scene_ior)
    }

    pub fn scene_ior(&self) -> f32 {
        self.scene_ior
    }

    pub fn depth(&self) -> usize {
        self.len
    }

    /// Stack after entering a medium of index `ior`.
    pub fn enter(&self, ior: f32) -> Self {
        let mut next = *self;
        if next.len < CAPACITY {
            next.media[next.len] = ior;
            next.len += 1;
        } else {
            log::debug!("IOR stack full, medium {ior} not tracked");
        }
        next
    }

    /// Stack after leaving the innermost medium of index `ior`.
    ///
    /// Unknown media leave the stack unchanged.
    pub fn exit(&self, ior: f32) -> Self {
        let mut next = *self;
        if let Some(i) = self.find(ior) {
            next.media.copy_within(i + 1..self.len, i);
            next.len -= 1;
        }
        next
    }

    /// IOR on the far side when leaving a medium of index `ior`.
    ///
    /// This is the medium enclosing the innermost matching entry, or the scene
    /// medium if there is none.
    pub fn outside_of(&self, ior: f32) -> f32 {
        match self.find(ior) {
            Some(i) if i > 0 => self.media[i - 1],
            _ => self.scene_ior,
        }
    }

    fn find(&self, ior: f32) -> Option<usize> {
        self.media[..self.len]
            .iter()
            .rposition(|&m| (m - ior).abs() < IOR_TOLERANCE)
    }
}

impl PartialEq for IorStack {
    fn eq(&self, other: &Self) -> bool {
        self.scene_ior == other.scene_ior && self.media[..self.len] == other.media[..other.len]
    }
}

impl Default for IorStack {
    fn default() -> Self {
        Self::new(1.0)
    }
}
