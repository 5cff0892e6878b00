use bytesize::ByteSize;

/// Binary-unit size string, e.g. `1.5 KiB`.
pub fn human_bytes(b: u64) -> String {
    ByteSize(b).to_string_as(true)
}
