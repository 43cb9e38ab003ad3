//! Requirement lines and lenient version ordering.
//!
//! Versions are compared component-wise as numbers, missing components
//! counting as zero. For one release, `dev` sorts lowest, then `a`, `b`
//! and `rc` pre-releases, then the release itself, then `post` releases.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters that start a version constraint.
const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '!'];

/// Errors raised while reading a requirements manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    /// A line has a constraint but no package name.
    #[error("line {line}: requirement '{text}' has no package name")]
    MissingName {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },

    /// Installer options (`-r`, `--index-url`, ...) are not supported.
    #[error("line {line}: installer option '{text}' is not supported")]
    UnsupportedOption {
        /// 1-based line number.
        line: usize,
        /// Offending text.
        text: String,
    },
}

/// A package name with an optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedPackage {
    /// Package name as written.
    pub name: String,
    /// Operator and version, e.g. `>=1.5.0`. Empty for a bare name.
    pub constraint: String,
}

impl VersionedPackage {
    /// Creates a requirement from its parts.
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }

    /// Parses one requirement. Returns `Ok(None)` for blank and comment lines.
    pub fn parse(text: &str) -> Result<Option<Self>, RequirementError> {
        Self::parse_line(text, 0)
    }

    fn parse_line(text: &str, line: usize) -> Result<Option<Self>, RequirementError> {
        let text = text.split('#').next().unwrap_or_default();
        let text = text.split(';').next().unwrap_or_default().trim();
        if text.is_empty() {
            return Ok(None);
        }
        if text.starts_with('-') {
            return Err(RequirementError::UnsupportedOption {
                line,
                text: text.to_string(),
            });
        }

        let (name, constraint) = match text.find(OPERATOR_CHARS) {
            Some(i) => (text[..i].trim(), text[i..].trim()),
            None => (text, ""),
        };
        if name.is_empty() {
            return Err(RequirementError::MissingName {
                line,
                text: text.to_string(),
            });
        }

        let constraint: String = constraint.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(Some(Self::new(name, constraint)))
    }

    /// Grouping key: lowercase, `_` and `.` folded to `-`, extras removed.
    pub fn key(&self) -> String {
        let base = self.name.split('[').next().unwrap_or_default();
        base.trim()
            .chars()
            .map(|c| match c {
                '_' | '.' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect()
    }

    /// Version named by the constraint; for `>=1.0,<2.0` this is the first clause.
    pub fn version(&self) -> Option<Version> {
        let first = self.constraint.split(',').next().unwrap_or_default();
        Version::parse(first.trim_start_matches(OPERATOR_CHARS))
    }
}

impl fmt::Display for VersionedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.constraint)
    }
}

/// Parses a whole `requirements.txt`.
pub fn parse_requirements(text: &str) -> Result<Vec<VersionedPackage>, RequirementError> {
    let mut packages = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(package) = VersionedPackage::parse_line(line, i + 1)? {
            packages.push(package);
        }
    }
    Ok(packages)
}

/// Pre-release phase, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PreTag {
    Alpha,
    Beta,
    Rc,
}

/// Numeric release components plus optional pre, post and dev tags.
#[derive(Debug, Clone)]
pub struct Version {
    release: Vec<u64>,
    pre: Option<(PreTag, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
}

impl Version {
    /// Parses leniently. Returns `None` if the text does not start with a digit.
    ///
    /// Local labels (`+cpu`) are dropped and unrecognised trailing tags are
    /// ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_start_matches(['v', 'V']);
        let text = text.split('+').next().unwrap_or_default().to_ascii_lowercase();
        if !text.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }

        let mut release = Vec::new();
        let mut rest = text.as_str();
        loop {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            release.push(rest[..digits].parse().unwrap_or(u64::MAX));
            rest = &rest[digits..];
            match rest.strip_prefix('.') {
                Some(next) if next.starts_with(|c: char| c.is_ascii_digit()) => rest = next,
                _ => break,
            }
        }

        let mut version = Self {
            release,
            pre: None,
            post: None,
            dev: None,
        };
        loop {
            rest = rest.trim_start_matches(['.', '-', '_']);
            let letters = rest.chars().take_while(char::is_ascii_alphabetic).count();
            let (word, tail) = rest.split_at(letters);
            let digits = tail.chars().take_while(char::is_ascii_digit).count();
            if letters == 0 && digits == 0 {
                break;
            }
            let number = tail[..digits].parse().unwrap_or(0);
            rest = &tail[digits..];

            match word {
                "a" | "alpha" => version.pre = Some((PreTag::Alpha, number)),
                "b" | "beta" => version.pre = Some((PreTag::Beta, number)),
                "c" | "rc" | "pre" | "preview" => version.pre = Some((PreTag::Rc, number)),
                // `1.0-1` is an implicit post-release.
                "" | "post" | "rev" | "r" => version.post = Some(number),
                "dev" => version.dev = Some(number),
                _ => break,
            }
        }

        Some(version)
    }

    /// Release components.
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Whether this is a pre-release or development release.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// `dev` < `a` < `b` < `rc` < release, for one release number.
    fn pre_rank(&self) -> (u8, u64) {
        match (self.pre, self.post, self.dev) {
            (Some((tag, n)), _, _) => (tag as u8 + 1, n),
            (None, None, Some(_)) => (0, 0),
            _ => (4, 0),
        }
    }

    fn post_rank(&self) -> (u8, u64) {
        self.post.map_or((0, 0), |n| (1, n))
    }

    fn dev_rank(&self) -> (u8, u64) {
        self.dev.map_or((1, 0), |n| (0, n))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        for i in 0..len {
            let a = self.release.get(i).copied().unwrap_or(0);
            let b = other.release.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        self.pre_rank()
            .cmp(&other.pre_rank())
            .then_with(|| self.post_rank().cmp(&other.post_rank()))
            .then_with(|| self.dev_rank().cmp(&other.dev_rank()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_splits_at_first_operator() {
        let p = VersionedPackage::parse("pvporcupine >= 3.0.2").unwrap().unwrap();
        assert_eq!(p.name, "pvporcupine");
        assert_eq!(p.constraint, ">=3.0.2");

        let p = VersionedPackage::parse("numpy~=1.26").unwrap().unwrap();
        assert_eq!(p.constraint, "~=1.26");

        let p = VersionedPackage::parse("pygame").unwrap().unwrap();
        assert_eq!(p.constraint, "");
        assert!(p.version().is_none());
    }

    #[test]
    fn test_comments_markers_and_blanks() {
        assert_eq!(VersionedPackage::parse("   ").unwrap(), None);
        assert_eq!(VersionedPackage::parse("# pinned below").unwrap(), None);
        let p = VersionedPackage::parse("openai==1.3.0 ; python_version >= '3.9'  # api")
            .unwrap()
            .unwrap();
        assert_eq!(p.to_string(), "openai==1.3.0");
    }

    #[test]
    fn test_manifest_errors_carry_line_numbers() {
        let err = parse_requirements("pillow\n>=1.0\n").unwrap_err();
        assert_eq!(
            err,
            RequirementError::MissingName {
                line: 2,
                text: ">=1.0".to_string()
            }
        );
        assert!(matches!(
            parse_requirements("-r base.txt").unwrap_err(),
            RequirementError::UnsupportedOption { line: 1, .. }
        ));
    }

    #[test]
    fn test_key_normalizes_spelling() {
        let a = VersionedPackage::new("Pillow_SIMD", ">=9");
        let b = VersionedPackage::new("pillow.simd", "");
        let c = VersionedPackage::new("pillow-simd[avx]", "");
        assert_eq!(a.key(), "pillow-simd");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), c.key());
    }

    #[test]
    fn test_numeric_component_ordering() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert_eq!(v("1.2").cmp(&v("1.2.0")), Ordering::Equal);
        assert!(v("2.0.0rc1") < v("2.0.0"));
        assert!(v("2.0.0rc1") > v("1.99"));
        assert!(v("2.0.0a1") < v("2.0.0rc1"));
        assert!(v("1.0.0+local") == v("1.0.0"));
    }

    #[test]
    fn test_equal_ordering_means_equal() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("2.0rc1"), v("2.0.0-rc1"));
        assert_ne!(v("1.2"), v("1.2.1"));
    }

    #[test]
    fn test_phase_ordering_within_release() {
        let ordered = [
            "1.0.dev0",
            "1.0a1",
            "1.0b2",
            "1.0rc1.dev1",
            "1.0rc1",
            "1.0",
            "1.0.post1.dev0",
            "1.0.post1",
            "1.0-2",
            "1.1.dev0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
        assert!(v("1.0.post1") > v("1.0rc1"));
        assert!(v("1.0rc1").is_prerelease());
        assert!(!v("1.0.post1").is_prerelease());
    }

    #[test]
    fn test_version_from_compound_constraint() {
        let p = VersionedPackage::new("torch", ">=2.1,<3");
        assert_eq!(p.version().unwrap().release(), &[2, 1]);
        assert!(Version::parse("latest").is_none());
    }
}
