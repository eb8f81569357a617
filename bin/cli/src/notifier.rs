//! Terminal notice sink.

use std::io::Write;
use taskdesk_platform_access::{Notice, NoticeLevel, Notifier};

/// Writes notices to stderr, one line each.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn format(notice: &Notice) -> String {
        let marker = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "--",
            NoticeLevel::Error => "!!",
        };
        format!("[{marker}] {}", notice.message)
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let line = Self::format(&notice);
        // A closed stderr is not worth failing over.
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_marked_by_level() {
        assert_eq!(
            TerminalNotifier::format(&Notice::success("Welcome, Alice")),
            "[ok] Welcome, Alice"
        );
        assert_eq!(
            TerminalNotifier::format(&Notice::error("invalid email or password")),
            "[!!] invalid email or password"
        );
    }
}
