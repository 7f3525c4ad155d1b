//! Wavefront OBJ import.
//!
//! Supported statements:
//! - `v x y z [w]`   vertex position (`w` ignored)
//! - `vt u [v [w]]`  texture coordinate
//! - `f a b c ...`   polygon; corners may be `v`, `v/vt`, `v//vn` or `v/vt/vn`,
//!   and negative indices count back from the end
//!
//! Everything else (`vn`, `o`, `g`, `s`, `usemtl`, `mtllib`, ...) is skipped.
//! UVs become a per-vertex set named `map1`; when one vertex is used with
//! several texture coordinates the first one seen wins.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::MeshQueryError;
use crate::geom::{Point3, UvPoint};
use crate::snapshot::MeshSnapshot;

/// Name of the UV set built from `vt` statements.
const UV_SET_NAME: &str = "map1";

#[derive(Debug, Error)]
pub enum ObjError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Topology(#[from] MeshQueryError),
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::Parse {
        line,
        message: message.into(),
    }
}

/// Reads an OBJ file; the mesh is named after the file stem.
pub fn read_obj(path: impl AsRef<Path>) -> Result<MeshSnapshot, ObjError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("mesh");
    log::debug!("reading OBJ `{}`", path.display());
    parse_obj(&text, name)
}

/// Parses OBJ source text into a snapshot called `name`.
pub fn parse_obj(text: &str, name: &str) -> Result<MeshSnapshot, ObjError> {
    let mut positions = Vec::new();
    let mut texcoords = Vec::new();
    let mut faces = Vec::new();
    // Per face corner: the referenced texture coordinate, if any.
    let mut corner_uvs: Vec<Vec<Option<usize>>> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or_default().trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let coords = parse_floats(parts, line_no)?;
                if coords.len() < 3 {
                    return Err(parse_error(line_no, "vertex needs three coordinates"));
                }
                positions.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            "vt" => {
                let coords = parse_floats(parts, line_no)?;
                match coords.as_slice() {
                    [] => return Err(parse_error(line_no, "texture coordinate needs a value")),
                    [u] => texcoords.push(UvPoint::new(*u, 0.0)),
                    [u, v, ..] => texcoords.push(UvPoint::new(*u, *v)),
                }
            }
            "f" => {
                let mut face = Vec::new();
                let mut uvs = Vec::new();
                for corner in parts {
                    let mut fields = corner.split('/');
                    let vertex = fields
                        .next()
                        .ok_or_else(|| parse_error(line_no, "empty face corner"))?;
                    face.push(resolve_index(vertex, positions.len(), line_no)?);
                    let uv = match fields.next() {
                        Some(field) if !field.is_empty() => {
                            Some(resolve_index(field, texcoords.len(), line_no)?)
                        }
                        _ => None,
                    };
                    uvs.push(uv);
                }
                if face.len() < 3 {
                    return Err(parse_error(line_no, "face needs at least three corners"));
                }
                faces.push(face);
                corner_uvs.push(uvs);
            }
            _ => {}
        }
    }

    let vertex_count = positions.len();
    let mut snapshot = MeshSnapshot::new(name, positions, faces)?;

    if !texcoords.is_empty() {
        let mut per_vertex: Vec<Option<UvPoint>> = vec![None; vertex_count];
        for (face, uvs) in snapshot.faces().iter().zip(&corner_uvs) {
            for (&vertex, &uv) in face.iter().zip(uvs) {
                if let (None, Some(uv)) = (per_vertex[vertex], uv) {
                    per_vertex[vertex] = Some(texcoords[uv]);
                }
            }
        }
        let unmapped = per_vertex.iter().filter(|uv| uv.is_none()).count();
        if unmapped > 0 {
            log::debug!("{unmapped} vertices of `{name}` have no texture coordinate; using (0, 0)");
        }
        let uvs = per_vertex
            .into_iter()
            .map(|uv| uv.unwrap_or(UvPoint::new(0.0, 0.0)))
            .collect();
        snapshot = snapshot.with_uv_set(UV_SET_NAME, uvs)?;
    }

    Ok(snapshot)
}

fn parse_floats<'a>(
    parts: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec<f64>, ObjError> {
    parts
        .map(|part| {
            part.parse::<f64>()
                .map_err(|_| parse_error(line, format!("invalid number `{part}`")))
        })
        .collect()
}

/// One-based OBJ index (negative counts back from `len`) to a zero-based one.
fn resolve_index(field: &str, len: usize, line: usize) -> Result<usize, ObjError> {
    let raw: i64 = field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index `{field}`")))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => usize::try_from(r - 1).ok(),
        r => usize::try_from(r.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back)),
    };
    resolved
        .filter(|&i| i < len)
        .ok_or_else(|| parse_error(line, format!("index {raw} out of range ({len} defined)")))
}
