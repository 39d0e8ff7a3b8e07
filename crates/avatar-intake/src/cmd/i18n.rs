use std::collections::BTreeMap;

use once_cell::sync::Lazy;

static EN_MESSAGES: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    let raw = include_str!("../../../../i18n/en.json");
    serde_json::from_str(raw).unwrap_or_default()
});

/// Message for `key`, or the key itself when the catalog has no entry.
pub fn tr(key: &str) -> String {
    EN_MESSAGES
        .get(key)
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Like [`tr`], filling each `{}` placeholder in order.
pub fn trf(key: &str, args: &[&str]) -> String {
    let mut msg = tr(key);
    for arg in args {
        msg = msg.replacen("{}", arg, 1);
    }
    msg
}
