pub mod builtin;
pub mod loader;

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::warn;

const SKIPPABLE_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".psd", ".xcf"];
const SKIPPABLE_PATH_INDICATORS: &[&str] = &["node_modules/", "vendor/bundle", "vendor/cache"];

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid pattern for signature '{description}': {source}")]
    InvalidPattern {
        description: String,
        #[source]
        source: regex::Error,
    },

    #[error("path signature '{0}' cannot match on file content")]
    ContentPartInPathTier(String),

    #[error("content signature '{0}' must match on file content")]
    PathPartInContentTier(String),
}

/// Which attribute of a changed file a signature inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchPart {
    Path,
    Filename,
    Extension,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchKind {
    Simple,
    Pattern,
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Simple(String),
    Pattern(Regex),
}

impl Matcher {
    pub fn kind(&self) -> MatchKind {
        match self {
            Matcher::Simple(_) => MatchKind::Simple,
            Matcher::Pattern(_) => MatchKind::Pattern,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Matcher::Simple(s) => s,
            Matcher::Pattern(re) => re.as_str(),
        }
    }
}

/// Serialized form of a [`Signature`], as found in signature files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSpec {
    part: MatchPart,
    #[serde(default = "default_kind")]
    kind: MatchKind,
    #[serde(rename = "match")]
    pattern: String,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

fn default_kind() -> MatchKind {
    MatchKind::Pattern
}

/// A single sensitive-data signature.
///
/// A `Simple` matcher compares the inspected attribute for equality; on file content it tests
/// for a substring instead. A `Pattern` matcher runs a regular expression against the attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SignatureSpec", into = "SignatureSpec")]
pub struct Signature {
    pub part: MatchPart,
    pub matcher: Matcher,
    pub description: String,
    pub comment: Option<String>,
}

impl Signature {
    pub fn simple(part: MatchPart, text: &str, description: &str, comment: Option<&str>) -> Self {
        Self {
            part,
            matcher: Matcher::Simple(text.to_string()),
            description: description.to_string(),
            comment: comment.map(str::to_string),
        }
    }

    pub fn pattern(
        part: MatchPart,
        pattern: &str,
        description: &str,
        comment: Option<&str>,
    ) -> Result<Self, SignatureError> {
        let re = Regex::new(pattern).map_err(|source| SignatureError::InvalidPattern {
            description: description.to_string(),
            source,
        })?;
        Ok(Self {
            part,
            matcher: Matcher::Pattern(re),
            description: description.to_string(),
            comment: comment.map(str::to_string),
        })
    }

    /// Evaluate this signature against a candidate file.
    ///
    /// `content` is only consulted by content-part signatures; when it is `None` they never match.
    pub fn is_match(&self, candidate: &MatchCandidate, content: Option<&str>) -> bool {
        let haystack = match self.part {
            MatchPart::Path => candidate.path.as_str(),
            MatchPart::Filename => candidate.filename.as_str(),
            MatchPart::Extension => candidate.extension.as_str(),
            MatchPart::Content => match content {
                Some(content) => content,
                None => return false,
            },
        };
        match (&self.matcher, self.part) {
            (Matcher::Simple(text), MatchPart::Content) => haystack.contains(text.as_str()),
            (Matcher::Simple(text), _) => haystack == text.as_str(),
            (Matcher::Pattern(re), _) => re.is_match(haystack),
        }
    }
}

impl TryFrom<SignatureSpec> for Signature {
    type Error = SignatureError;

    fn try_from(spec: SignatureSpec) -> Result<Self, Self::Error> {
        match spec.kind {
            MatchKind::Simple => Ok(Signature::simple(
                spec.part,
                &spec.pattern,
                &spec.description,
                spec.comment.as_deref(),
            )),
            MatchKind::Pattern => Signature::pattern(
                spec.part,
                &spec.pattern,
                &spec.description,
                spec.comment.as_deref(),
            ),
        }
    }
}

impl From<Signature> for SignatureSpec {
    fn from(sig: Signature) -> Self {
        SignatureSpec {
            part: sig.part,
            kind: sig.matcher.kind(),
            pattern: sig.matcher.as_str().to_string(),
            description: sig.description,
            comment: sig.comment,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} `{}`)",
            self.description,
            self.part,
            self.matcher.kind(),
            self.matcher.as_str()
        )
    }
}

/// Path metadata of a changed file: the full path, its final component, and that component's
/// extension (including the leading dot, empty when there is none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub path: String,
    pub filename: String,
    pub extension: String,
}

impl MatchCandidate {
    pub fn new(path: &str) -> Self {
        let filename = match path.rfind('/') {
            Some(idx) => &path[idx + 1..],
            None => path,
        };
        let extension = match filename.rfind('.') {
            Some(idx) => &filename[idx..],
            None => "",
        };
        Self {
            path: path.to_string(),
            filename: filename.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Images and vendored dependency trees are never worth matching.
    pub fn is_skippable(&self) -> bool {
        let extension = self.extension.to_lowercase();
        if SKIPPABLE_EXTENSIONS.contains(&extension.as_str()) {
            return true;
        }
        let path = self.path.to_lowercase();
        SKIPPABLE_PATH_INDICATORS.iter().any(|indicator| path.contains(indicator))
    }
}

/// Which signature tiers run for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum MatchMode {
    /// Match file paths only
    #[default]
    #[value(name = "1")]
    PathOnly,
    /// Match file paths, then scan the content of files whose path matched
    #[value(name = "2")]
    PathThenContent,
    /// Scan the content of every file
    #[value(name = "3")]
    ContentOnly,
}

impl MatchMode {
    pub fn uses_path_signatures(self) -> bool {
        !matches!(self, MatchMode::ContentOnly)
    }

    pub fn uses_content_signatures(self) -> bool {
        !matches!(self, MatchMode::PathOnly)
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            MatchMode::PathOnly => 1,
            MatchMode::PathThenContent => 2,
            MatchMode::ContentOnly => 3,
        };
        write!(f, "{n}")
    }
}

/// One reportable hit for a change. At least one of the two tiers is set.
#[derive(Debug, Clone, Copy)]
pub struct SignatureMatch<'a> {
    pub path: Option<&'a Signature>,
    pub content: Option<&'a Signature>,
}

/// The path and content signature tiers used for a run.
#[derive(Debug, Clone, Default)]
pub struct SignatureSet {
    path: Vec<Signature>,
    content: Vec<Signature>,
}

impl SignatureSet {
    pub fn new(path: Vec<Signature>, content: Vec<Signature>) -> Result<Self, SignatureError> {
        if let Some(sig) = path.iter().find(|s| s.part == MatchPart::Content) {
            return Err(SignatureError::ContentPartInPathTier(sig.description.clone()));
        }
        if let Some(sig) = content.iter().find(|s| s.part != MatchPart::Content) {
            return Err(SignatureError::PathPartInContentTier(sig.description.clone()));
        }
        Ok(Self { path, content })
    }

    pub fn path_signatures(&self) -> &[Signature] {
        &self.path
    }

    pub fn content_signatures(&self) -> &[Signature] {
        &self.content
    }

    /// The first path signature, in declaration order, that matches the candidate.
    pub fn match_path(&self, candidate: &MatchCandidate) -> Option<&Signature> {
        self.path.iter().find(|sig| sig.is_match(candidate, None))
    }

    /// Every content signature that matches.
    pub fn match_content(&self, candidate: &MatchCandidate, content: &str) -> Vec<&Signature> {
        self.content.iter().filter(|sig| sig.is_match(candidate, Some(content))).collect()
    }

    /// Run a changed file through the tiers selected by `mode`.
    ///
    /// In mode 2 a path match is reported on its own and also opens the content tier, whose
    /// matches are reported separately. `load_content` is called at most once, and only when a
    /// content tier is reached. A load failure is logged and yields no content matches for this
    /// file. Bytes that are not valid UTF-8 are replaced before matching.
    pub fn evaluate<F>(
        &self,
        mode: MatchMode,
        candidate: &MatchCandidate,
        load_content: F,
    ) -> Vec<SignatureMatch<'_>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        if candidate.is_skippable() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        if mode.uses_path_signatures() {
            match self.match_path(candidate) {
                Some(sig) => matches.push(SignatureMatch { path: Some(sig), content: None }),
                None => return matches,
            }
        }
        if !mode.uses_content_signatures() {
            return matches;
        }

        let bytes = match load_content() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read content of {}: {e:#}", candidate.path);
                return matches;
            }
        };
        let content = String::from_utf8_lossy(&bytes);
        matches.extend(
            self.match_content(candidate, &content)
                .into_iter()
                .map(|sig| SignatureMatch { path: None, content: Some(sig) }),
        );
        matches
    }
}
