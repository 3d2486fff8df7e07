//! Upload bundle: exactly three named artifacts
//!
//! A bundle can only be constructed through [`BundleBuilder::build`], which
//! refuses to produce one unless the front photo, back photo and video are
//! all present. Both the capture client (before sending) and the relay
//! (after receiving) go through the same builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which artifact a multipart part carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactRole {
    IdFront,
    IdBack,
    Video,
}

impl ArtifactRole {
    /// All roles in upload (and forwarding) order
    pub const ALL: [ArtifactRole; 3] = [
        ArtifactRole::IdFront,
        ArtifactRole::IdBack,
        ArtifactRole::Video,
    ];

    /// Multipart part name
    pub fn part_name(self) -> &'static str {
        match self {
            ArtifactRole::IdFront => "idFront",
            ArtifactRole::IdBack => "idBack",
            ArtifactRole::Video => "video",
        }
    }

    /// Look up a role by multipart part name
    pub fn from_part_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.part_name() == name)
    }

    /// File name used when the sender did not supply one
    pub fn default_file_name(self) -> &'static str {
        match self {
            ArtifactRole::IdFront => "id_front.jpg",
            ArtifactRole::IdBack => "id_back.jpg",
            ArtifactRole::Video => "selfie.webm",
        }
    }

    /// Content type used when the sender did not supply one
    pub fn default_content_type(self) -> &'static str {
        match self {
            ArtifactRole::IdFront | ArtifactRole::IdBack => "image/jpeg",
            ArtifactRole::Video => "video/webm",
        }
    }

    pub fn is_photo(self) -> bool {
        !matches!(self, ArtifactRole::Video)
    }
}

impl fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.part_name())
    }
}

/// One encoded media object pending upload
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Payloads are megabytes; print the size instead.
impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The three-part payload of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadBundle {
    id_front: Artifact,
    id_back: Artifact,
    video: Artifact,
}

impl UploadBundle {
    pub fn get(&self, role: ArtifactRole) -> &Artifact {
        match role {
            ArtifactRole::IdFront => &self.id_front,
            ArtifactRole::IdBack => &self.id_back,
            ArtifactRole::Video => &self.video,
        }
    }

    /// Artifacts in forwarding order
    pub fn parts(&self) -> impl Iterator<Item = (ArtifactRole, &Artifact)> {
        ArtifactRole::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    /// Consume the bundle, yielding owned artifacts in forwarding order
    pub fn into_parts(self) -> [(ArtifactRole, Artifact); 3] {
        [
            (ArtifactRole::IdFront, self.id_front),
            (ArtifactRole::IdBack, self.id_back),
            (ArtifactRole::Video, self.video),
        ]
    }

    /// Total payload size in bytes
    pub fn total_len(&self) -> usize {
        self.parts().map(|(_, artifact)| artifact.len()).sum()
    }
}

/// Roles absent when a bundle was built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing parts: {}", .missing.iter().map(|r| r.part_name()).collect::<Vec<_>>().join(", "))]
pub struct MissingParts {
    pub missing: Vec<ArtifactRole>,
}

/// Collects artifacts by role; the first artifact per role wins
#[derive(Debug, Default, Clone)]
pub struct BundleBuilder {
    id_front: Option<Artifact>,
    id_back: Option<Artifact>,
    video: Option<Artifact>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, role: ArtifactRole) -> &mut Option<Artifact> {
        match role {
            ArtifactRole::IdFront => &mut self.id_front,
            ArtifactRole::IdBack => &mut self.id_back,
            ArtifactRole::Video => &mut self.video,
        }
    }

    /// Store an artifact for `role`
    ///
    /// Returns false (and drops `artifact`) if the role is already filled.
    pub fn insert(&mut self, role: ArtifactRole, artifact: Artifact) -> bool {
        let slot = self.slot(role);
        if slot.is_some() {
            return false;
        }
        *slot = Some(artifact);
        true
    }

    /// Builder-style variant of [`insert`](Self::insert) for optional artifacts
    pub fn with(mut self, role: ArtifactRole, artifact: Option<Artifact>) -> Self {
        if let Some(artifact) = artifact {
            self.insert(role, artifact);
        }
        self
    }

    pub fn contains(&self, role: ArtifactRole) -> bool {
        match role {
            ArtifactRole::IdFront => self.id_front.is_some(),
            ArtifactRole::IdBack => self.id_back.is_some(),
            ArtifactRole::Video => self.video.is_some(),
        }
    }

    /// Produce the bundle, or report every missing role
    pub fn build(self) -> Result<UploadBundle, MissingParts> {
        match (self.id_front, self.id_back, self.video) {
            (Some(id_front), Some(id_back), Some(video)) => Ok(UploadBundle {
                id_front,
                id_back,
                video,
            }),
            (id_front, id_back, video) => {
                let mut missing = Vec::new();
                if id_front.is_none() {
                    missing.push(ArtifactRole::IdFront);
                }
                if id_back.is_none() {
                    missing.push(ArtifactRole::IdBack);
                }
                if video.is_none() {
                    missing.push(ArtifactRole::Video);
                }
                Err(MissingParts { missing })
            }
        }
    }
}
