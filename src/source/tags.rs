//! Version tags and ref-name helpers.

use std::cmp::Ordering;

use super::git::RemoteRef;

const TAG_PREFIX: &str = "refs/tags/";
const HEAD_PREFIX: &str = "refs/heads/";
const PEELED_SUFFIX: &str = "^{}";

/// A numeric `major.minor[.patch]` version parsed from a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TagVersion([u64; 3]);

impl TagVersion {
    /// Parse `v1.2`, `1.2.3` and friends. Anything with a non-numeric
    /// component (pre-release suffixes included) or with other than 2 or 3
    /// components is not a version.
    pub fn parse(tag: &str) -> Option<Self> {
        let body = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        let parts: Vec<&str> = body.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return None;
        }
        let mut version = [0u64; 3];
        for (slot, part) in version.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            *slot = part.parse().ok()?;
        }
        Some(Self(version))
    }
}

/// A tag with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit: String,
}

/// Tags from `ls-remote` output, in listing order. Annotated tags report the
/// peeled commit rather than the tag object.
pub fn tags(refs: &[RemoteRef]) -> Vec<Tag> {
    let mut out: Vec<Tag> = Vec::new();
    for r in refs {
        let Some(name) = r.name.strip_prefix(TAG_PREFIX) else {
            continue;
        };
        match name.strip_suffix(PEELED_SUFFIX) {
            Some(base) => {
                if let Some(tag) = out.iter_mut().find(|t| t.name == base) {
                    tag.commit = r.hash.clone();
                } else {
                    out.push(Tag {
                        name: base.to_string(),
                        commit: r.hash.clone(),
                    });
                }
            }
            None => {
                if !out.iter().any(|t| t.name == name) {
                    out.push(Tag {
                        name: name.to_string(),
                        commit: r.hash.clone(),
                    });
                }
            }
        }
    }
    out
}

/// The tag with the greatest version. Ties keep the first listed tag.
pub fn latest(tags: &[Tag]) -> Option<&Tag> {
    let mut best: Option<(TagVersion, &Tag)> = None;
    for tag in tags {
        let Some(version) = TagVersion::parse(&tag.name) else {
            continue;
        };
        let better = match &best {
            Some((current, _)) => version.cmp(current) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some((version, tag));
        }
    }
    best.map(|(_, tag)| tag)
}

/// Find the commit for `refs/heads/<name>` in `ls-remote` output.
pub fn branch<'a>(refs: &'a [RemoteRef], name: &str) -> Option<&'a RemoteRef> {
    refs.iter()
        .find(|r| r.name.strip_prefix(HEAD_PREFIX) == Some(name))
}

/// True when `s` could be an abbreviated or full commit hash.
pub fn looks_like_commit(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_hexdigit())
}
