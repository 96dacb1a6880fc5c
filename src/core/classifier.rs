use crate::domain::model::{AdGroup, AspectRatio, MediaAsset, MediaKind, MediaPayload};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Trailing aspect token, with an optional `-`/`_` separator, anchored at the end.
static TRAILING_ASPECT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[-_]?(9x16|9_16|4x5|4_5|1x1|1_1|16x9|16_9)$")
        .expect("aspect token pattern is valid")
});

/// Scan order for the aspect tag; the first hit wins.
const ASPECT_PRIORITY: [(AspectRatio, [&str; 2]); 4] = [
    (AspectRatio::Vertical, ["9x16", "9_16"]),
    (AspectRatio::Portrait, ["4x5", "4_5"]),
    (AspectRatio::Square, ["1x1", "1_1"]),
    (AspectRatio::Landscape, ["16x9", "16_9"]),
];

/// A raw input file before grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFile {
    pub filename: String,
    pub payload: Option<MediaPayload>,
}

impl RawFile {
    pub fn new(filename: impl Into<String>, payload: Option<MediaPayload>) -> Self {
        Self {
            filename: filename.into(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub group_key: String,
    pub aspect: AspectRatio,
    pub kind: MediaKind,
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

/// Filename without extension and without a trailing aspect token.
pub fn group_key(filename: &str) -> String {
    let stem = file_stem(filename);
    let stripped = TRAILING_ASPECT_TOKEN.replace(stem, "");
    if stripped.is_empty() {
        stem.to_string()
    } else {
        stripped.into_owned()
    }
}

/// Aspect tag from a token found anywhere in the name.
pub fn aspect_tag(filename: &str) -> AspectRatio {
    let lowered = filename.to_ascii_lowercase();
    ASPECT_PRIORITY
        .iter()
        .find(|(_, tokens)| tokens.iter().any(|token| lowered.contains(token)))
        .map(|(aspect, _)| *aspect)
        .unwrap_or(AspectRatio::Other)
}

pub fn classify_filename(filename: &str) -> Classification {
    Classification {
        group_key: group_key(filename),
        aspect: aspect_tag(filename),
        kind: MediaKind::from_filename(filename),
    }
}

/// Groups files into ads by derived key. Groups accumulate across calls, so
/// files can be added in several batches.
#[derive(Debug, Default)]
pub struct FilenameClassifier {
    groups: Vec<AdGroup>,
    index: HashMap<String, usize>,
}

impl FilenameClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_files<I>(&mut self, files: I) -> &[AdGroup]
    where
        I: IntoIterator<Item = RawFile>,
    {
        for file in files {
            let classification = classify_filename(&file.filename);
            tracing::debug!(
                "🗂️ {} -> group '{}' ({}, {:?})",
                file.filename,
                classification.group_key,
                classification.aspect,
                classification.kind
            );

            let mut asset = MediaAsset::new(file.filename, classification.kind, classification.aspect);
            asset.payload = file.payload;

            let position = match self.index.get(&classification.group_key) {
                Some(position) => *position,
                None => {
                    self.groups.push(AdGroup::new(classification.group_key.clone()));
                    self.index
                        .insert(classification.group_key, self.groups.len() - 1);
                    self.groups.len() - 1
                }
            };
            self.groups[position].media.push(asset);
        }

        &self.groups
    }

    pub fn groups(&self) -> &[AdGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<AdGroup> {
        self.groups
    }
}
