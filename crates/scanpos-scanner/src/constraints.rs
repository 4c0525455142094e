//! # Constraint Candidates
//!
//! The fixed fallback ladder of camera requests tried by the
//! [`StreamAcquirer`](crate::acquire::StreamAcquirer).
//!
//! ## Fallback Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  #  facingMode              resolution hint          Why it may fail    │
//! │  ─  ──────────────────────  ───────────────────────  ────────────────── │
//! │  0  { exact: environment }  ideal W×H (orientation)  laptop, no rear cam│
//! │  1  { ideal: environment }  ideal W×H (orientation)  odd driver sizes   │
//! │  2  { ideal: environment }  none                     picky drivers      │
//! │  3  video: true             none                     (last resort)      │
//! │                                                                         │
//! │  Portrait:  720 × 1280        Landscape: 1280 × 720                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// =============================================================================
// Orientation / Facing
// =============================================================================

/// Viewport orientation; resolution hints depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Portrait when taller than wide.
    pub fn from_viewport(width: u32, height: u32) -> Self {
        if height >= width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// Which way the camera points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front ("selfie") camera.
    User,
    /// Rear camera.
    Environment,
}

impl FacingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

/// How strictly a constraint must be met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Exact,
    Ideal,
}

impl Requirement {
    const fn key(&self) -> &'static str {
        match self {
            Requirement::Exact => "exact",
            Requirement::Ideal => "ideal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacingConstraint {
    pub mode: FacingMode,
    pub requirement: Requirement,
}

/// Ideal capture size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

const PORTRAIT_HINT: Resolution = Resolution {
    width: 720,
    height: 1280,
};

const LANDSCAPE_HINT: Resolution = Resolution {
    width: 1280,
    height: 720,
};

// =============================================================================
// Constraint Candidate
// =============================================================================

/// One camera request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintCandidate {
    /// Short description used in logs and error tags.
    pub label: &'static str,
    pub facing: Option<FacingConstraint>,
    pub resolution: Option<Resolution>,
}

impl ConstraintCandidate {
    /// `video: true`.
    pub const fn any() -> Self {
        ConstraintCandidate {
            label: "any camera",
            facing: None,
            resolution: None,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.facing.is_none() && self.resolution.is_none()
    }

    /// Renders the candidate as a `MediaStreamConstraints` object.
    ///
    /// ```rust
    /// use scanpos_scanner::constraints::ConstraintCandidate;
    ///
    /// let value = ConstraintCandidate::any().to_media_constraints();
    /// assert_eq!(value.to_string(), r#"{"audio":false,"video":true}"#);
    /// ```
    pub fn to_media_constraints(&self) -> Value {
        if self.is_unconstrained() {
            return json!({ "audio": false, "video": true });
        }

        let mut video = Map::new();
        if let Some(facing) = self.facing {
            video.insert(
                "facingMode".to_string(),
                json!({ facing.requirement.key(): facing.mode.as_str() }),
            );
        }
        if let Some(resolution) = self.resolution {
            video.insert("width".to_string(), json!({ "ideal": resolution.width }));
            video.insert("height".to_string(), json!({ "ideal": resolution.height }));
        }

        json!({ "audio": false, "video": Value::Object(video) })
    }
}

impl fmt::Display for ConstraintCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.to_media_constraints())
    }
}

const fn environment(requirement: Requirement) -> Option<FacingConstraint> {
    Some(FacingConstraint {
        mode: FacingMode::Environment,
        requirement,
    })
}

const fn ladder(hint: Resolution) -> [ConstraintCandidate; 4] {
    [
        ConstraintCandidate {
            label: "exact environment + resolution",
            facing: environment(Requirement::Exact),
            resolution: Some(hint),
        },
        ConstraintCandidate {
            label: "ideal environment + resolution",
            facing: environment(Requirement::Ideal),
            resolution: Some(hint),
        },
        ConstraintCandidate {
            label: "ideal environment",
            facing: environment(Requirement::Ideal),
            resolution: None,
        },
        ConstraintCandidate::any(),
    ]
}

/// Ladder used while the viewport is portrait.
pub const PORTRAIT_CANDIDATES: [ConstraintCandidate; 4] = ladder(PORTRAIT_HINT);

/// Ladder used while the viewport is landscape.
pub const LANDSCAPE_CANDIDATES: [ConstraintCandidate; 4] = ladder(LANDSCAPE_HINT);

/// Candidates for `orientation`, most specific first.
pub fn candidates_for(orientation: Orientation) -> &'static [ConstraintCandidate] {
    match orientation {
        Orientation::Portrait => &PORTRAIT_CANDIDATES,
        Orientation::Landscape => &LANDSCAPE_CANDIDATES,
    }
}
