use std::cmp::Ordering;
use std::fmt;

/// Version representation supporting the formats CDNs publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub original: String,
    pub parsed: VersionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionType {
    Semantic(semver::Version),
    Numeric(Vec<u64>),
    Unknown(String),
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let trimmed = version.trim_start_matches('v');
        let parsed = if let Ok(v) = semver::Version::parse(trimmed) {
            VersionType::Semantic(v)
        } else if let Some(numeric) = Self::parse_numeric(trimmed) {
            VersionType::Numeric(numeric)
        } else {
            VersionType::Unknown(version.to_string())
        };

        Version {
            original: version.to_string(),
            parsed,
        }
    }

    fn parse_numeric(version: &str) -> Option<Vec<u64>> {
        let numbers = version
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        if numbers.is_empty() {
            None
        } else {
            Some(numbers)
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.parsed, &other.parsed) {
            (VersionType::Semantic(a), VersionType::Semantic(b)) => a.cmp(b),
            (VersionType::Numeric(a), VersionType::Numeric(b)) => compare_components(a, b),
            (VersionType::Semantic(a), VersionType::Numeric(b)) => {
                compare_components(&[a.major, a.minor, a.patch], b)
            }
            (VersionType::Numeric(a), VersionType::Semantic(b)) => {
                compare_components(a, &[b.major, b.minor, b.patch])
            }
            _ => self.original.cmp(&other.original),
        }
    }
}

fn compare_components(a: &[u64], b: &[u64]) -> Ordering {
    for (av, bv) in a.iter().zip(b.iter()) {
        match av.cmp(bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Size of a version bump, as reported in commit trailers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Major,
    Minor,
    Patch,
}

impl UpdateKind {
    /// Classify the move from `old` to `new` by the first differing of the
    /// major and minor components; anything else is a patch.
    pub fn between(old: &str, new: &str) -> Self {
        let old = leading_components(old);
        let new = leading_components(new);

        if old[0] != new[0] {
            UpdateKind::Major
        } else if old[1] != new[1] {
            UpdateKind::Minor
        } else {
            UpdateKind::Patch
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpdateKind::Major => "major",
            UpdateKind::Minor => "minor",
            UpdateKind::Patch => "patch",
        };
        f.write_str(label)
    }
}

/// Major and minor as integers; missing or non-numeric parts count as 0
fn leading_components(version: &str) -> [u64; 2] {
    let mut components = [0; 2];
    let parts = version.trim_start_matches('v').split('.');

    for (slot, part) in components.iter_mut().zip(parts) {
        let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
        *slot = digits.parse().unwrap_or(0);
    }

    components
}

pub struct VersionComparator;

impl VersionComparator {
    /// Lowest of two versions under the ordering of [`Version`]
    pub fn lowest<'a>(a: &'a str, b: &'a str) -> &'a str {
        if Version::parse(b) < Version::parse(a) {
            b
        } else {
            a
        }
    }
}
