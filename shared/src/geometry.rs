//! Mesh analysis for uploaded models
//!
//! Parses binary STL, ASCII STL and Wavefront OBJ into triangles and
//! measures them. Units are assumed to be millimetres.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::Dimensions;

type Vec3 = [f64; 3];
type Triangle = [Vec3; 3];

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    #[error("mesh contains no triangles")]
    Empty,

    #[error("binary STL truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Measurements of a triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStats {
    pub vertices: usize,
    pub faces: usize,
    pub edges: usize,
    pub dimensions: Dimensions,
    pub volume_cm3: f64,
    pub surface_area_cm2: f64,
}

/// Parse and measure a mesh, choosing the parser from the file extension
pub fn analyze_mesh(bytes: &[u8], file_name: &str) -> Result<MeshStats, GeometryError> {
    let ext = crate::models::file_extension(file_name).unwrap_or_default();
    let (triangles, vertices) = match ext.as_str() {
        ".stl" => parse_stl(bytes)?,
        ".obj" => parse_obj(bytes)?,
        other => return Err(GeometryError::UnsupportedFormat(other.to_string())),
    };
    measure(&triangles, vertices)
}

// ========== STL ==========

fn parse_stl(bytes: &[u8]) -> Result<(Vec<Triangle>, usize), GeometryError> {
    if is_binary_stl(bytes) {
        parse_binary_stl(bytes)
    } else if bytes.trim_ascii_start().starts_with(b"solid") {
        parse_ascii_stl(bytes)
    } else {
        parse_binary_stl(bytes)
    }
}

/// Binary when the header's triangle count matches the byte length exactly
fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < 84 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    84 + count * 50 == bytes.len()
}

fn parse_binary_stl(bytes: &[u8]) -> Result<(Vec<Triangle>, usize), GeometryError> {
    if bytes.len() < 84 {
        return Err(GeometryError::Truncated {
            expected: 84,
            actual: bytes.len(),
        });
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let expected = 84 + count * 50;
    if bytes.len() < expected {
        return Err(GeometryError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    let read_f32 = |offset: usize| {
        f64::from(f32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]))
    };

    let mut unique = HashSet::new();
    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        // 12 bytes of normal precede the three vertices
        let base = 84 + i * 50 + 12;
        let mut tri = [[0.0; 3]; 3];
        for (v, vertex) in tri.iter_mut().enumerate() {
            for (axis, coord) in vertex.iter_mut().enumerate() {
                *coord = read_f32(base + v * 12 + axis * 4);
            }
            unique.insert(vertex_key(vertex));
        }
        triangles.push(tri);
    }
    Ok((triangles, unique.len()))
}

fn parse_ascii_stl(bytes: &[u8]) -> Result<(Vec<Triangle>, usize), GeometryError> {
    let text = String::from_utf8_lossy(bytes);
    let mut unique = HashSet::new();
    let mut triangles = Vec::new();
    let mut pending: Vec<Vec3> = Vec::with_capacity(3);

    for (idx, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("vertex") {
            continue;
        }
        let vertex = parse_coords(tokens, idx + 1)?;
        unique.insert(vertex_key(&vertex));
        pending.push(vertex);
        if pending.len() == 3 {
            triangles.push([pending[0], pending[1], pending[2]]);
            pending.clear();
        }
    }

    if !pending.is_empty() {
        return Err(GeometryError::Parse {
            line: text.lines().count(),
            message: "facet with fewer than three vertices".to_string(),
        });
    }
    Ok((triangles, unique.len()))
}

// ========== OBJ ==========

fn parse_obj(bytes: &[u8]) -> Result<(Vec<Triangle>, usize), GeometryError> {
    let text = String::from_utf8_lossy(bytes);
    let mut positions: Vec<Vec3> = Vec::new();
    let mut triangles = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_coords(tokens, line_no)?),
            Some("f") => {
                let corners = tokens
                    .map(|tok| resolve_obj_index(tok, positions.len(), line_no))
                    .collect::<Result<Vec<_>, _>>()?;
                if corners.len() < 3 {
                    return Err(GeometryError::Parse {
                        line: line_no,
                        message: "face needs at least three vertices".to_string(),
                    });
                }
                // Fan triangulation around the first corner
                for pair in corners[1..].windows(2) {
                    triangles.push([
                        positions[corners[0]],
                        positions[pair[0]],
                        positions[pair[1]],
                    ]);
                }
            }
            _ => {}
        }
    }

    Ok((triangles, positions.len()))
}

/// OBJ indices are 1-based; negative values count back from the last vertex
fn resolve_obj_index(token: &str, count: usize, line: usize) -> Result<usize, GeometryError> {
    let raw = token.split('/').next().unwrap_or_default();
    let parsed: i64 = raw.parse().map_err(|_| GeometryError::Parse {
        line,
        message: format!("invalid face index '{token}'"),
    })?;
    let resolved = if parsed < 0 {
        count as i64 + parsed
    } else {
        parsed - 1
    };
    if resolved < 0 || resolved as usize >= count {
        return Err(GeometryError::Parse {
            line,
            message: format!("face index {parsed} out of range"),
        });
    }
    Ok(resolved as usize)
}

// ========== Shared helpers ==========

fn parse_coords<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<Vec3, GeometryError> {
    let mut out = [0.0; 3];
    for coord in out.iter_mut() {
        let token = tokens.next().ok_or_else(|| GeometryError::Parse {
            line,
            message: "expected three coordinates".to_string(),
        })?;
        *coord = token.parse().map_err(|_| GeometryError::Parse {
            line,
            message: format!("invalid coordinate '{token}'"),
        })?;
    }
    Ok(out)
}

fn vertex_key(v: &Vec3) -> [u64; 3] {
    [v[0].to_bits(), v[1].to_bits(), v[2].to_bits()]
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn measure(triangles: &[Triangle], vertices: usize) -> Result<MeshStats, GeometryError> {
    if triangles.is_empty() {
        return Err(GeometryError::Empty);
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    let mut signed_volume = 0.0;
    let mut area = 0.0;

    for [a, b, c] in triangles {
        for v in [a, b, c] {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }
        signed_volume += dot(*a, cross(*b, *c)) / 6.0;
        let n = cross(sub(*b, *a), sub(*c, *a));
        area += dot(n, n).sqrt() / 2.0;
    }

    let faces = triangles.len();
    Ok(MeshStats {
        vertices,
        faces,
        edges: faces * 3 / 2,
        dimensions: Dimensions::new(max[0] - min[0], max[1] - min[1], max[2] - min[2]),
        // mm^3 -> cm^3, mm^2 -> cm^2
        volume_cm3: signed_volume.abs() / 1000.0,
        surface_area_cm2: area / 100.0,
    })
}
