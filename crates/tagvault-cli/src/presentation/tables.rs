//! Table formatting utilities for CLI output.

/// Truncates a string to a maximum number of characters, adding "..." if needed.
///
/// # Examples
///
/// ```rust
/// use tagvault_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("KXYZ", 10), "KXYZ");
/// assert_eq!(truncate_string("Evening Drive", 8), "Eveni...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_string("Café Müller", 8), "Café ...");
        assert_eq!(truncate_string("short", 5), "short");
        assert_eq!(truncate_string("abcdef", 2), "...");
    }
}
