pub mod stage0_segment;
pub mod stage1_extract;
pub mod stage2_merge;
pub mod stage3_group;
pub mod stage4_render;

pub use stage0_segment::*;
pub use stage1_extract::*;
pub use stage2_merge::*;
pub use stage3_group::*;
pub use stage4_render::*;
