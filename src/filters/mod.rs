pub mod position_kf;

pub use position_kf::{FilterSnapshot, PositionFilter};
