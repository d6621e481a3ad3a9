/// Format a number for display.
///
/// Uses the shortest decimal form that reads back to the same value, so
/// whole numbers print without a fractional part (`3`, not `3.0`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Avoid printing "-0".
        "0".to_string()
    } else {
        n.to_string()
    }
}
