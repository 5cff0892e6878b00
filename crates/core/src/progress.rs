#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Files whose size has been read.
    pub files: u64,
    /// Files seen by the walker, sized or not.
    pub discovered: u64,
    pub bytes: u64,
}
