//! Friendly display names derived from an email address

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `jane.doe@x.com` -> `Jane Doe`, `jane@x.com` -> `Jane`.
///
/// Whitespace in the local part is dropped; only the first two dot-separated
/// parts are used.
pub(crate) fn admin_display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let local = if local.is_empty() { "User" } else { local };
    let local: String = local.chars().filter(|c| !c.is_whitespace()).collect();

    let parts: Vec<&str> = local.split('.').collect();
    if parts.len() >= 2 {
        format!("{} {}", capitalize(parts[0]), capitalize(parts[1]))
    } else {
        capitalize(parts[0])
    }
}

/// `jane@x.com` -> `Jane`; an empty address reads as `Member`.
pub(crate) fn member_display_name(email: &str) -> String {
    if email.is_empty() {
        return "Member".to_string();
    }
    capitalize(email.split('@').next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_names() {
        assert_eq!(admin_display_name("jane.doe@fitcheck.io"), "Jane Doe");
        assert_eq!(admin_display_name("jane.m.doe@fitcheck.io"), "Jane M");
        assert_eq!(admin_display_name("root@fitcheck.io"), "Root");
        assert_eq!(admin_display_name("an na@x"), "Anna");
        assert_eq!(admin_display_name("@x"), "User");
        assert_eq!(admin_display_name(""), "User");
    }

    #[test]
    fn member_names() {
        assert_eq!(member_display_name("sam@x.com"), "Sam");
        assert_eq!(member_display_name("sam.lee@x.com"), "Sam.lee");
        assert_eq!(member_display_name(""), "Member");
        assert_eq!(member_display_name("émile@x"), "Émile");
    }
}
