//! Merges the requirements of every loaded module into one set.

use std::collections::BTreeMap;

use tracing::debug;

use super::requirement::VersionedPackage;

/// Keeps one requirement per package: the one naming the greatest version.
///
/// Packages are grouped by [`VersionedPackage::key`], so only spellings of
/// the same name are ever compared. The first spelling seen is the one
/// reported. A requirement without a version loses to any versioned one,
/// and ties keep the first seen. The result is sorted by grouping key.
pub fn consolidate<'a, I>(packages: I) -> Vec<VersionedPackage>
where
    I: IntoIterator<Item = &'a VersionedPackage>,
{
    let mut chosen: BTreeMap<String, VersionedPackage> = BTreeMap::new();

    for package in packages {
        let Some(current) = chosen.get_mut(&package.key()) else {
            chosen.insert(package.key(), package.clone());
            continue;
        };

        if package.version() > current.version() {
            debug!(
                package = %current.name,
                kept = %package.constraint,
                dropped = %current.constraint,
                "Requirement superseded"
            );
            current.constraint = package.constraint.clone();
        } else {
            debug!(
                package = %current.name,
                kept = %current.constraint,
                ignored = %package.constraint,
                "Requirement kept"
            );
        }
    }

    chosen.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(name: &str, constraint: &str) -> VersionedPackage {
        VersionedPackage::new(name, constraint)
    }

    #[test]
    fn test_keeps_greatest_per_name() {
        let input = vec![
            pkg("pkgA", ">=1.2.0"),
            pkg("pkgB", "~2.0.0"),
            pkg("pkgA", ">=1.5.0"),
        ];
        let merged = consolidate(&input);
        assert_eq!(merged, vec![pkg("pkgA", ">=1.5.0"), pkg("pkgB", "~2.0.0")]);
    }

    #[test]
    fn test_names_never_compared_across_groups() {
        // Adjacent after sorting, but different packages: both survive.
        let input = vec![pkg("numpy", "==2.0.0"), pkg("numpy-financial", "==1.0.0")];
        let merged = consolidate(&input);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let input = vec![pkg("pillow", ">=10.0.0"), pkg("pillow", ">=9.5.0")];
        assert_eq!(consolidate(&input), vec![pkg("pillow", ">=10.0.0")]);
    }

    #[test]
    fn test_versioned_beats_bare_and_tie_keeps_first() {
        let input = vec![
            pkg("pygame", ""),
            pkg("PyGame", "==2.5.2"),
            pkg("pygame", ">=2.5.2"),
        ];
        assert_eq!(consolidate(&input), vec![pkg("pygame", "==2.5.2")]);
    }

    #[test]
    fn test_spelling_variants_grouped() {
        let input = vec![pkg("openai_whisper", ">=1.0"), pkg("openai-whisper", ">=1.1")];
        assert_eq!(consolidate(&input), vec![pkg("openai_whisper", ">=1.1")]);
    }

    #[test]
    fn test_post_release_beats_release() {
        let input = vec![pkg("numpy", ">=1.0"), pkg("numpy", ">=1.0.post1")];
        assert_eq!(consolidate(&input), vec![pkg("numpy", ">=1.0.post1")]);

        let input = vec![pkg("numpy", ">=1.0-1"), pkg("numpy", ">=1.0")];
        assert_eq!(consolidate(&input), vec![pkg("numpy", ">=1.0-1")]);
    }

    #[test]
    fn test_post_release_beats_release_candidate() {
        let input = vec![pkg("torch", "==2.1.0.post1"), pkg("torch", "==2.1.0rc1")];
        assert_eq!(consolidate(&input), vec![pkg("torch", "==2.1.0.post1")]);

        let input = vec![pkg("torch", "==2.1.0.dev3"), pkg("torch", "==2.1.0a1")];
        assert_eq!(consolidate(&input), vec![pkg("torch", "==2.1.0a1")]);
    }

    #[test]
    fn test_padded_versions_tie_keeps_first() {
        let input = vec![pkg("scipy", ">=1.2"), pkg("scipy", ">=1.2.0")];
        assert_eq!(consolidate(&input), vec![pkg("scipy", ">=1.2")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(&Vec::new()).is_empty());
    }
}
