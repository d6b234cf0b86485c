use std::io::Write;

/* stdout belongs to the action being run; all diagnostics go through the logger on stderr */
pub fn print_output(printed_output: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", printed_output);
}

#[macro_export]
macro_rules! outln {
    ( $fmt:expr $(, $args:expr)*) => {
        $crate::util::print_output(&format!($fmt $(, $args)*))
    };
}
