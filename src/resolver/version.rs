//! Version handling for PubGrub.

use pubgrub::Range;
use semver::Version;

use crate::core::Requirement;

/// Convert a requirement into the set of versions PubGrub may choose from.
///
/// Branch, revision and local requirements do not select by version and
/// have no range.
pub fn requirement_to_range(req: &Requirement) -> Option<Range<Version>> {
    let range = match req {
        Requirement::UpToNextMajor(v) | Requirement::UpToNextMinor(v) => {
            match req.next_bound() {
                Some(bound) => Range::between(v.clone(), bound),
                None => Range::higher_than(v.clone()),
            }
        }
        Requirement::Exact(v) => Range::singleton(v.clone()),
        Requirement::Range { lower, upper } => {
            if lower >= upper {
                Range::empty()
            } else {
                Range::between(lower.clone(), upper.clone())
            }
        }
        Requirement::Branch(_) | Requirement::Revision(_) | Requirement::Local => return None,
    };

    Some(range)
}

/// Parse a version string, filling in missing minor/patch components and
/// accepting a leading `v` as used in release tags (`v1.2`).
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = s.trim();
    let s = s.strip_prefix('v').unwrap_or(s);

    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }

    let mut parts = s.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        // three components that failed strict parsing are malformed
        return None;
    }

    Some(Version::new(major, minor, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_to_next_major_range() {
        let range = requirement_to_range(&Requirement::UpToNextMajor(Version::new(2, 2, 0))).unwrap();

        assert!(range.contains(&Version::new(2, 2, 0)));
        assert!(range.contains(&Version::new(2, 9, 9)));
        assert!(!range.contains(&Version::new(3, 0, 0)));
        assert!(!range.contains(&Version::new(2, 1, 9)));
    }

    #[test]
    fn test_up_to_next_major_at_largest_major() {
        let top = Version::new(u64::MAX, 0, 0);
        let range = requirement_to_range(&Requirement::UpToNextMajor(top.clone())).unwrap();

        assert!(range.contains(&top));
        assert!(range.contains(&Version::new(u64::MAX, 3, 0)));
        assert!(!range.contains(&Version::new(u64::MAX - 1, 9, 9)));

        let range =
            requirement_to_range(&Requirement::UpToNextMinor(Version::new(1, u64::MAX, 0))).unwrap();
        assert!(range.contains(&Version::new(1, u64::MAX, 7)));
        assert!(!range.contains(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_up_to_next_major_from_zero() {
        // unlike a caret requirement, 0.x does not narrow to the minor
        let range = requirement_to_range(&Requirement::UpToNextMajor(Version::new(0, 0, 1))).unwrap();

        assert!(range.contains(&Version::new(0, 0, 6)));
        assert!(range.contains(&Version::new(0, 5, 0)));
        assert!(!range.contains(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_up_to_next_minor_range() {
        let range = requirement_to_range(&Requirement::UpToNextMinor(Version::new(8, 0, 0))).unwrap();

        assert!(range.contains(&Version::new(8, 0, 9)));
        assert!(!range.contains(&Version::new(8, 1, 0)));
    }

    #[test]
    fn test_exact_and_range() {
        let exact = requirement_to_range(&Requirement::Exact(Version::new(1, 2, 3))).unwrap();
        assert!(exact.contains(&Version::new(1, 2, 3)));
        assert!(!exact.contains(&Version::new(1, 2, 4)));

        let range = requirement_to_range(&Requirement::Range {
            lower: Version::new(1, 0, 0),
            upper: Version::new(1, 5, 0),
        })
        .unwrap();
        assert!(range.contains(&Version::new(1, 4, 9)));
        assert!(!range.contains(&Version::new(1, 5, 0)));

        let inverted = requirement_to_range(&Requirement::Range {
            lower: Version::new(2, 0, 0),
            upper: Version::new(1, 0, 0),
        })
        .unwrap();
        assert!(!inverted.contains(&Version::new(1, 5, 0)));
    }

    #[test]
    fn test_non_version_requirements() {
        assert!(requirement_to_range(&Requirement::Branch("main".into())).is_none());
        assert!(requirement_to_range(&Requirement::Local).is_none());
    }

    #[test]
    fn test_parse_version_lenient() {
        assert_eq!(parse_version_lenient("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version_lenient("1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version_lenient("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(
            parse_version_lenient("1.0.0-beta.1").map(|v| v.pre.to_string()),
            Some("beta.1".to_string())
        );
        assert_eq!(parse_version_lenient("1.2.x"), None);
        assert_eq!(parse_version_lenient(""), None);
    }
}
