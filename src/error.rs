//! Errors surfaced by the scanning pipeline.
//! Only genuinely exceptional conditions end up here; an empty cell or a missing template is not an error.

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("degenerate image {width}x{height}: cannot map the board layout")]
    DegenerateImage { width: u32, height: u32 },
    #[error("invalid scan config: {0}")]
    InvalidConfig(String),
}
