//! Error handling foundation for the taskdesk client.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enums and wraps infrastructure failures in a rootcause `Report`
//! typed by that enum.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_alias_carries_values() {
        let ok: Result<&str> = Ok("session");
        assert_eq!(ok.expect("should be ok"), "session");
    }
}
