//! Fixed-width manifest prefix shown in front of lines from many sources.

/// Width of the manifest name field, in characters.
pub const PREFIX_WIDTH: usize = 12;

const SEPARATOR: &str = "┊ ";

/// Render `name` into a [`PREFIX_WIDTH`] column field followed by `┊ `.
///
/// Shorter names are right-padded with spaces; longer names are cut to
/// `PREFIX_WIDTH - 1` characters and end in `…`.
pub fn source_prefix(name: &str) -> String {
    if name.chars().count() > PREFIX_WIDTH {
        let cut: String = name.chars().take(PREFIX_WIDTH - 1).collect();
        format!("{cut}…{SEPARATOR}")
    } else {
        format!("{name:<width$}{SEPARATOR}", width = PREFIX_WIDTH)
    }
}
