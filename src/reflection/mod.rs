//! Planar reflection of the sea surface.

mod mirror;
mod pass;

pub use mirror::{oblique_clip, reflect, MirrorPlane, ReflectionFrame, TEXTURE_BIAS};
pub use pass::{MirrorBackend, ReflectionOutcome, ReflectionPhase, ReflectionRenderer};
