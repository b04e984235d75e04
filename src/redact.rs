use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref KV_PASSWORD: Regex =
        Regex::new(r"(?i)(\bpassword\s*=\s*)('(?:[^'\\]|\\.)*'|\S*)").expect("valid regex");
    static ref URL_PASSWORD: Regex =
        Regex::new(r"(://[^:/@\s]*:)[^@\s]*@").expect("valid regex");
}

/// Hide passwords in key/value and URL connection strings.
///
/// ```rust
/// use pgsession::redact_conninfo;
///
/// assert_eq!(redact_conninfo("host=db password=s3cret"), "host=db password=***");
/// ```
#[must_use]
pub fn redact_conninfo(info: &str) -> Cow<'_, str> {
    let info = KV_PASSWORD.replace_all(info, "${1}***");
    if URL_PASSWORD.is_match(&info) {
        Cow::Owned(URL_PASSWORD.replace_all(&info, "${1}***@").into_owned())
    } else {
        info
    }
}
