//! Mapping from a requested Connect version to the image tag that ships it.

/// Base-OS label for current images.
pub const NEWEST_PLATFORM: &str = "jammy";
/// Base-OS label for images published between the two cutovers.
pub const INTERMEDIATE_PLATFORM: &str = "bionic";

/// Versions after this (year, month) are built on [`NEWEST_PLATFORM`].
const NEWER_CUTOVER: (u32, u32) = (2023, 6);
/// Versions from this (year, month) onward are built on [`INTERMEDIATE_PLATFORM`].
const OLDER_CUTOVER: (u32, u32) = (2022, 9);

/// Whether `version` names a floating release rather than a pinned one.
pub fn is_floating(version: &str) -> bool {
    matches!(version, "latest" | "release")
}

/// Resolve the image tag for `version`.
///
/// Unparseable input is returned unchanged so custom tags pass through.
pub fn resolve_tag(version: &str) -> String {
    if is_floating(version) {
        return NEWEST_PLATFORM.to_string();
    }

    let mut parts = version.split('.');
    let (Some(year), Some(month)) = (parts.next(), parts.next()) else {
        return version.to_string();
    };
    let (Ok(year), Ok(month)) = (year.parse::<u32>(), month.parse::<u32>()) else {
        return version.to_string();
    };

    let release = (year, month);
    if release > NEWER_CUTOVER {
        format!("{NEWEST_PLATFORM}-{version}")
    } else if release >= OLDER_CUTOVER {
        format!("{INTERMEDIATE_PLATFORM}-{version}")
    } else {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve_to_newest_platform() {
        assert_eq!(resolve_tag("latest"), NEWEST_PLATFORM);
        assert_eq!(resolve_tag("release"), NEWEST_PLATFORM);
        assert_eq!(resolve_tag("latest"), resolve_tag("release"));
    }

    #[test]
    fn versions_after_newer_cutover_get_newest_prefix() {
        assert_eq!(resolve_tag("2023.07.0"), "jammy-2023.07.0");
        assert_eq!(resolve_tag("2025.09.0"), "jammy-2025.09.0");
        assert_eq!(resolve_tag("2024.01"), "jammy-2024.01");
    }

    #[test]
    fn versions_between_cutovers_get_intermediate_prefix() {
        assert_eq!(resolve_tag("2023.06.0"), "bionic-2023.06.0");
        assert_eq!(resolve_tag("2022.09.0"), "bionic-2022.09.0");
        assert_eq!(resolve_tag("2022.12.1"), "bionic-2022.12.1");
    }

    #[test]
    fn versions_before_older_cutover_pass_through() {
        assert_eq!(resolve_tag("2022.08.0"), "2022.08.0");
        assert_eq!(resolve_tag("2021.12.1"), "2021.12.1");
    }

    #[test]
    fn unparseable_versions_pass_through() {
        for input in ["custom", "", "2023", "v2023.07.0", "2023.x.0", "abc.def", "-1.5"] {
            assert_eq!(resolve_tag(input), input, "input {input:?}");
        }
    }

    #[test]
    fn month_is_compared_numerically() {
        // "2023.7" and "2023.07" are the same release month.
        assert_eq!(resolve_tag("2023.7.0"), "jammy-2023.7.0");
        assert_eq!(resolve_tag("2023.6.0"), "bionic-2023.6.0");
    }

    #[test]
    fn floating_detection() {
        assert!(is_floating("latest"));
        assert!(is_floating("release"));
        assert!(!is_floating("2025.09.0"));
        assert!(!is_floating("Latest"));
    }
}
