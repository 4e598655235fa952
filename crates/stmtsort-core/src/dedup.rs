//! Byte-identical duplicate detection.
//!
//! Files are grouped by the SHA-256 of their content. Only bytes feed the
//! hash, so copies with different names, timestamps or permissions still
//! group together.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::statement::StatementFile;

/// SHA-256 digest of a file's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash a file by streaming its content.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", &self.to_hex()[..16])
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// How the canonical member of a duplicate group is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRule {
    /// Smallest path, compared component by component rather than as raw
    /// bytes: `a/b.pdf` sorts before `a-b.pdf`.
    #[default]
    LexicographicPath,
    /// Shortest path, ties broken lexicographically.
    ShortestPath,
}

impl CanonicalRule {
    fn pick<'a>(&self, paths: &'a [PathBuf]) -> Option<&'a PathBuf> {
        match self {
            CanonicalRule::LexicographicPath => paths.iter().min(),
            CanonicalRule::ShortestPath => paths
                .iter()
                .min_by(|a, b| {
                    let (la, lb) = (a.as_os_str().len(), b.as_os_str().len());
                    la.cmp(&lb).then_with(|| a.cmp(b))
                }),
        }
    }
}

/// Whether a file is the kept copy of its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Original,
    DuplicateOf(PathBuf),
}

impl Classification {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Classification::DuplicateOf(_))
    }
}

/// Files sharing one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub digest: ContentDigest,
    pub canonical: PathBuf,
    /// All members, canonical included, sorted by path.
    pub files: Vec<PathBuf>,
}

/// Result of classifying a batch of files.
#[derive(Debug, Clone, Default)]
pub struct DuplicateReport {
    pub classifications: BTreeMap<PathBuf, Classification>,
    pub digests: BTreeMap<PathBuf, ContentDigest>,
    /// Groups with more than one member, ordered by canonical path.
    pub groups: Vec<DuplicateGroup>,
    /// Files that could not be read, with the reason.
    pub unreadable: BTreeMap<PathBuf, String>,
}

impl DuplicateReport {
    pub fn classification(&self, path: &Path) -> Option<&Classification> {
        self.classifications.get(path)
    }

    pub fn digest(&self, path: &Path) -> Option<&ContentDigest> {
        self.digests.get(path)
    }

    pub fn duplicate_count(&self) -> usize {
        self.classifications.values().filter(|c| c.is_duplicate()).count()
    }
}

/// Groups byte-identical files and picks one canonical member per group.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateDetector {
    rule: CanonicalRule,
}

impl DuplicateDetector {
    pub fn new(rule: CanonicalRule) -> Self {
        Self { rule }
    }

    /// Classify a whole batch. The result does not depend on input order.
    pub fn classify(&self, files: &[StatementFile]) -> DuplicateReport {
        let mut report = DuplicateReport::default();
        let mut by_digest: HashMap<ContentDigest, Vec<PathBuf>> = HashMap::new();

        for file in files {
            match file.digest() {
                Ok(digest) => {
                    report.digests.insert(file.path().to_path_buf(), *digest);
                    by_digest
                        .entry(*digest)
                        .or_default()
                        .push(file.path().to_path_buf());
                }
                Err(e) => {
                    warn!("Cannot hash {}: {}", file.path().display(), e);
                    report
                        .unreadable
                        .insert(file.path().to_path_buf(), e.to_string());
                }
            }
        }

        for (digest, mut paths) in by_digest {
            paths.sort();
            paths.dedup();

            let Some(canonical) = self.rule.pick(&paths).cloned() else {
                continue;
            };

            for path in &paths {
                let class = if *path == canonical {
                    Classification::Original
                } else {
                    Classification::DuplicateOf(canonical.clone())
                };
                report.classifications.insert(path.clone(), class);
            }

            if paths.len() > 1 {
                debug!(
                    "{} copies of {} (canonical {})",
                    paths.len(),
                    digest,
                    canonical.display()
                );
                report.groups.push(DuplicateGroup {
                    digest,
                    canonical,
                    files: paths,
                });
            }
        }

        report.groups.sort_by(|a, b| a.canonical.cmp(&b.canonical));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write(dir: &Path, name: &str, data: &[u8]) -> StatementFile {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
        StatementFile::new(path)
    }

    #[test]
    fn test_identical_pair_smaller_path_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "stmt_a.pdf", b"%PDF same bytes");
        let b = write(dir.path(), "stmt_b.pdf", b"%PDF same bytes");

        let report = DuplicateDetector::default().classify(&[b.clone(), a.clone()]);

        assert_eq!(report.classification(a.path()), Some(&Classification::Original));
        assert_eq!(
            report.classification(b.path()),
            Some(&Classification::DuplicateOf(a.path().to_path_buf()))
        );
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.duplicate_count(), 1);
    }

    #[test]
    fn test_order_does_not_matter() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write(dir.path(), "c.pdf", b"x"),
            write(dir.path(), "a.pdf", b"x"),
            write(dir.path(), "b.pdf", b"x"),
            write(dir.path(), "d.pdf", b"y"),
        ];
        let mut reversed = files.clone();
        reversed.reverse();

        let detector = DuplicateDetector::default();
        let forward = detector.classify(&files);
        let backward = detector.classify(&reversed);

        assert_eq!(forward.classifications, backward.classifications);
        assert_eq!(forward.groups, backward.groups);

        let canonical = dir.path().join("a.pdf");
        let originals: Vec<_> = forward
            .classifications
            .iter()
            .filter(|(_, c)| !c.is_duplicate())
            .map(|(p, _)| p.clone())
            .collect();
        assert_eq!(originals, vec![canonical.clone(), dir.path().join("d.pdf")]);
        assert_eq!(forward.groups[0].files.len(), 3);
        assert_eq!(forward.groups[0].canonical, canonical);
    }

    #[test]
    fn test_one_byte_difference_is_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.pdf", b"statement 1");
        let b = write(dir.path(), "b.pdf", b"statement 2");

        let report = DuplicateDetector::default().classify(&[a, b]);
        assert_eq!(report.duplicate_count(), 0);
        assert!(report.groups.is_empty());
    }

    #[test]
    fn test_lexicographic_rule_compares_components() {
        let dir = tempfile::tempdir().unwrap();
        let flat = write(dir.path(), "a-b.pdf", b"same");
        let nested = write(dir.path(), "a/b.pdf", b"same");

        let report = DuplicateDetector::default().classify(&[flat.clone(), nested.clone()]);
        assert_eq!(report.classification(nested.path()), Some(&Classification::Original));
        assert_eq!(
            report.classification(flat.path()),
            Some(&Classification::DuplicateOf(nested.path().to_path_buf()))
        );
    }

    #[test]
    fn test_shortest_path_rule() {
        let dir = tempfile::tempdir().unwrap();
        let deep = write(dir.path(), "aaa/nested/copy.pdf", b"same");
        let shallow = write(dir.path(), "z.pdf", b"same");

        let report = DuplicateDetector::new(CanonicalRule::ShortestPath).classify(&[deep.clone(), shallow.clone()]);
        assert_eq!(report.classification(shallow.path()), Some(&Classification::Original));

        let report = DuplicateDetector::new(CanonicalRule::LexicographicPath).classify(&[deep.clone(), shallow]);
        assert_eq!(report.classification(deep.path()), Some(&Classification::Original));
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = StatementFile::new(dir.path().join("gone.pdf"));

        let report = DuplicateDetector::default().classify(&[missing]);
        assert!(report.classifications.is_empty());
        assert_eq!(report.unreadable.len(), 1);
    }

    #[test]
    fn test_digest_hex() {
        let digest = ContentDigest::of_bytes(b"abc");
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
