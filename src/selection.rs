//! Component paths such as `"body.vtx[3]"` and a sink to send them to.
//!
//! The engine formats paths for vertices, edges and faces and hands them to a
//! [`SelectionSink`]. It never reads a selection back.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Vertex,
    Edge,
    Face,
}

impl ComponentKind {
    /// Path token: `vtx`, `e` or `f`.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Vertex => "vtx",
            Self::Edge => "e",
            Self::Face => "f",
        }
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "vtx" => Some(Self::Vertex),
            "e" => Some(Self::Edge),
            "f" => Some(Self::Face),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Edge => f.write_str("edge"),
            Self::Face => f.write_str("face"),
        }
    }
}

/// How a sink combines incoming paths with what it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SelectMode {
    #[default]
    Replace,
    Add,
    Remove,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("empty selection")]
    Empty,
    #[error("malformed component path `{0}`")]
    Malformed(String),
    #[error("selection mixes component kinds")]
    MixedKinds,
    #[error("selection spans more than one mesh")]
    MixedMeshes,
    #[error("inverted range [{start}:{end}]")]
    InvertedRange { start: usize, end: usize },
    #[error("{kind} {id} out of range (mesh has {count})")]
    OutOfRange {
        kind: ComponentKind,
        id: usize,
        count: usize,
    },
    #[error("selection sink failed: {0}")]
    Sink(String),
}

/// Receives formatted component paths.
pub trait SelectionSink {
    fn select(&mut self, paths: &[String], mode: SelectMode) -> Result<(), SelectionError>;
}

/// A plain list is the simplest sink; order of first insertion is kept.
impl SelectionSink for Vec<String> {
    fn select(&mut self, paths: &[String], mode: SelectMode) -> Result<(), SelectionError> {
        match mode {
            SelectMode::Replace => {
                self.clear();
                for path in paths {
                    if !self.contains(path) {
                        self.push(path.clone());
                    }
                }
            }
            SelectMode::Add => {
                for path in paths {
                    if !self.contains(path) {
                        self.push(path.clone());
                    }
                }
            }
            SelectMode::Remove => self.retain(|held| !paths.contains(held)),
            SelectMode::Toggle => {
                for path in paths {
                    if let Some(pos) = self.iter().position(|held| held == path) {
                        self.remove(pos);
                    } else {
                        self.push(path.clone());
                    }
                }
            }
        }
        Ok(())
    }
}

/// `"{name}.{token}[{id}]"` for every id, in input order.
#[must_use]
pub fn component_paths(name: &str, kind: ComponentKind, ids: &[usize]) -> Vec<String> {
    ids.iter()
        .map(|id| format!("{name}.{}[{id}]", kind.token()))
        .collect()
}

/// Result of [`parse_component_selection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSelection {
    pub mesh: String,
    pub kind: ComponentKind,
    /// Sorted, without duplicates.
    pub ids: Vec<usize>,
}

static COMPONENT_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<mesh>.+)\.(?P<kind>vtx|e|f)\[(?P<start>\d+)(?::(?P<end>\d+))?\]$").ok()
});

/// Parses paths like `"body.vtx[3]"` or `"body.f[0:4]"` (inclusive range).
/// All items must name the same mesh and component kind.
pub fn parse_component_selection<S: AsRef<str>>(
    items: &[S],
) -> Result<ComponentSelection, SelectionError> {
    let mut mesh: Option<String> = None;
    let mut kind: Option<ComponentKind> = None;
    let mut ids = BTreeSet::new();

    for item in items {
        let item = item.as_ref().trim();
        let caps = COMPONENT_PATH
            .as_ref()
            .and_then(|pattern| pattern.captures(item))
            .ok_or_else(|| SelectionError::Malformed(item.to_owned()))?;

        let item_kind = ComponentKind::from_token(&caps["kind"])
            .ok_or_else(|| SelectionError::Malformed(item.to_owned()))?;
        match kind {
            Some(existing) if existing != item_kind => return Err(SelectionError::MixedKinds),
            _ => kind = Some(item_kind),
        }
        match &mesh {
            Some(existing) if existing != &caps["mesh"] => {
                return Err(SelectionError::MixedMeshes);
            }
            Some(_) => {}
            None => mesh = Some(caps["mesh"].to_owned()),
        }

        let parse_id = |text: &str| {
            text.parse::<usize>()
                .map_err(|_| SelectionError::Malformed(item.to_owned()))
        };
        let start = parse_id(&caps["start"])?;
        let end = caps.name("end").map_or(Ok(start), |m| parse_id(m.as_str()))?;
        if end < start {
            return Err(SelectionError::InvertedRange { start, end });
        }
        ids.extend(start..=end);
    }

    match (mesh, kind) {
        (Some(mesh), Some(kind)) => Ok(ComponentSelection {
            mesh,
            kind,
            ids: ids.into_iter().collect(),
        }),
        _ => Err(SelectionError::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_paths() {
        assert_eq!(
            component_paths("body", ComponentKind::Edge, &[2, 0]),
            vec!["body.e[2]".to_owned(), "body.e[0]".to_owned()]
        );
        assert!(component_paths("body", ComponentKind::Face, &[]).is_empty());
    }

    #[test]
    fn parses_single_ids_and_ranges() {
        let parsed =
            parse_component_selection(&["grp|body.vtx[5]", "grp|body.vtx[1:3]", "grp|body.vtx[2]"])
                .unwrap();
        assert_eq!(parsed.mesh, "grp|body");
        assert_eq!(parsed.kind, ComponentKind::Vertex);
        assert_eq!(parsed.ids, vec![1, 2, 3, 5]);
    }

    #[test]
    fn formatted_paths_parse_back() {
        let paths = component_paths("ns:mesh.shape", ComponentKind::Face, &[4, 1]);
        let parsed = parse_component_selection(&paths).unwrap();
        assert_eq!(parsed.mesh, "ns:mesh.shape");
        assert_eq!(parsed.kind, ComponentKind::Face);
        assert_eq!(parsed.ids, vec![1, 4]);
    }

    #[test]
    fn rejects_bad_selections() {
        let none: [&str; 0] = [];
        assert_eq!(parse_component_selection(&none), Err(SelectionError::Empty));
        assert_eq!(
            parse_component_selection(&["body.vtx[1]", "body.f[1]"]),
            Err(SelectionError::MixedKinds)
        );
        assert_eq!(
            parse_component_selection(&["a.e[1]", "b.e[1]"]),
            Err(SelectionError::MixedMeshes)
        );
        assert_eq!(
            parse_component_selection(&["a.e[4:2]"]),
            Err(SelectionError::InvertedRange { start: 4, end: 2 })
        );
        assert_eq!(
            parse_component_selection(&["a.uv[0]"]),
            Err(SelectionError::Malformed("a.uv[0]".into()))
        );
    }

    #[test]
    fn vec_sink_modes() {
        let mut held: Vec<String> = Vec::new();
        let ab = vec!["m.f[0]".to_owned(), "m.f[1]".to_owned()];
        let bc = vec!["m.f[1]".to_owned(), "m.f[2]".to_owned()];

        held.select(&ab, SelectMode::Replace).unwrap();
        assert_eq!(held, ab);
        held.select(&bc, SelectMode::Add).unwrap();
        assert_eq!(held, vec!["m.f[0]", "m.f[1]", "m.f[2]"]);
        held.select(&ab, SelectMode::Remove).unwrap();
        assert_eq!(held, vec!["m.f[2]"]);
        held.select(&bc, SelectMode::Toggle).unwrap();
        assert_eq!(held, vec!["m.f[1]"]);
        held.select(&bc, SelectMode::Replace).unwrap();
        assert_eq!(held, bc);
    }
}
