//! # String Formats
//!
//! Checks behind `+k8s:format`. Each check returns the failure messages
//! for a value; an empty list means the value is well formed.
//!
//! | Format            | Accepts                                             |
//! |-------------------|-----------------------------------------------------|
//! | `k8s-ip`          | IPv4 or IPv6 address                                |
//! | `k8s-uuid`        | lowercase 8-4-4-4-12 UUID                           |
//! | `k8s-short-name`  | RFC 1123 label, at most 63 bytes                    |
//! | `k8s-long-name`   | RFC 1123 subdomain, at most 253 bytes               |
//! | `k8s-label-key`   | optional subdomain prefix, `/`, qualified name      |
//! | `k8s-label-value` | empty, or a qualified name of at most 63 bytes      |

use std::net::IpAddr;
use std::sync::OnceLock;

use regex::Regex;

use dvgen_rules::Format;

const LABEL_MAX: usize = 63;
const SUBDOMAIN_MAX: usize = 253;

const LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{LABEL_FMT}$")).expect("label pattern compiles"))
}

fn subdomain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^{LABEL_FMT}(\.{LABEL_FMT})*$")).expect("subdomain pattern compiles")
    })
}

fn qualified_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{QUALIFIED_NAME_FMT}$")).expect("qualified name pattern compiles")
    })
}

/// Failure messages for `value` under `format`.
pub fn check(format: Format, value: &str) -> Vec<String> {
    match format {
        Format::Ip => ip(value),
        Format::Uuid => uuid(value),
        Format::ShortName => dns_label(value),
        Format::LongName => dns_subdomain(value),
        Format::LabelKey => qualified_name(value),
        Format::LabelValue => label_value(value),
    }
}

fn ip(value: &str) -> Vec<String> {
    match value.parse::<IpAddr>() {
        Ok(_) => Vec::new(),
        Err(_) => vec!["must be a valid IP address, (e.g. 10.9.8.7 or 2001:db8::ffff)".into()],
    }
}

fn uuid(value: &str) -> Vec<String> {
    let canonical = value.len() == 36
        && value == value.to_ascii_lowercase()
        && uuid::Uuid::try_parse(value).is_ok();
    if canonical {
        Vec::new()
    } else {
        vec!["must be a lowercase UUID in 8-4-4-4-12 format".into()]
    }
}

fn dns_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > LABEL_MAX {
        errs.push(max_len_msg(LABEL_MAX));
    }
    if !label_regex().is_match(value) {
        errs.push(format!(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character (e.g. 'my-name', or '123-abc', \
             regex used for validation is '{LABEL_FMT}')"
        ));
    }
    errs
}

fn dns_subdomain(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > SUBDOMAIN_MAX {
        errs.push(max_len_msg(SUBDOMAIN_MAX));
    }
    if !subdomain_regex().is_match(value) {
        errs.push(format!(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character (e.g. \
             'example.com', regex used for validation is '{LABEL_FMT}(\\.{LABEL_FMT})*')"
        ));
    }
    errs
}

fn qualified_name(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    let (prefix, name) = match value.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, value),
    };
    if name.contains('/') {
        errs.push(
            "a qualified name must consist of alphanumeric characters, '-', '_' or '.', with an \
             optional DNS subdomain prefix and '/' (e.g. 'example.com/MyName')"
                .to_string(),
        );
        return errs;
    }
    if let Some(prefix) = prefix {
        if prefix.is_empty() {
            errs.push("prefix part must be non-empty".into());
        } else {
            errs.extend(dns_subdomain(prefix).into_iter().map(|m| format!("prefix part {m}")));
        }
    }
    if name.is_empty() {
        errs.push("name part must be non-empty".into());
    } else {
        if name.len() > LABEL_MAX {
            errs.push(format!("name part {}", max_len_msg(LABEL_MAX)));
        }
        if !qualified_name_regex().is_match(name) {
            errs.push(format!(
                "name part must consist of alphanumeric characters, '-', '_' or '.', and must \
                 start and end with an alphanumeric character (e.g. 'MyName', or 'my.name', or \
                 '123-abc', regex used for validation is '{QUALIFIED_NAME_FMT}')"
            ));
        }
    }
    errs
}

fn label_value(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    let mut errs = Vec::new();
    if value.len() > LABEL_MAX {
        errs.push(max_len_msg(LABEL_MAX));
    }
    if !qualified_name_regex().is_match(value) {
        errs.push(format!(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', \
             '_' or '.', and must start and end with an alphanumeric character (e.g. 'MyValue', \
             or 'my_value', or '12345', regex used for validation is '({QUALIFIED_NAME_FMT})?')"
        ));
    }
    errs
}

fn max_len_msg(max: usize) -> String {
    format!("must be no more than {max} characters")
}
