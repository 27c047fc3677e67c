//! Conversion of libspim's HTML-flavoured dumps into terminal text.
//!
//! Register and memory dumps come back as a run of `<pre>` elements, one per
//! line, with changed values wrapped in a highlighted `<pre style=...>`.

use regex::Regex;
use std::sync::OnceLock;

fn pre_element() -> Option<&'static Regex> {
    static PRE: OnceLock<Option<Regex>> = OnceLock::new();
    PRE.get_or_init(|| Regex::new(r"(?s)<pre[^>]*>(.*?)</pre>").ok())
        .as_ref()
}

/// One line per `<pre>` element. Text without any is returned as is.
pub fn strip_pre(dump: &str) -> String {
    let Some(pre) = pre_element().filter(|pre| pre.is_match(dump)) else {
        return dump.to_string();
    };

    let mut text = String::with_capacity(dump.len());
    for captures in pre.captures_iter(dump) {
        text.push_str(&captures[1]);
        text.push('\n');
    }
    text
}

/// Value of general register `index` in a `R<n>  (<name>) = <hex>` dump.
pub fn register_value(dump: &str, index: i32) -> Option<i32> {
    dump.lines().find_map(|line| {
        let rest = line.trim().strip_prefix('R')?;
        let (number, rest) = rest.split_once(char::is_whitespace)?;
        if number.parse::<i32>().ok()? != index {
            return None;
        }
        let (_, hex) = rest.split_once('=')?;
        u32::from_str_radix(hex.trim(), 16).ok().map(|value| value as i32)
    })
}
