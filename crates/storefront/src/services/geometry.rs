//! Printability analysis of uploaded STL meshes.
//!
//! Meshes are parsed with `stl_io`, which welds identical vertices, so edge
//! topology can be read straight off the face indices.

use std::collections::HashMap;
use std::io::Cursor;

use serde::Serialize;
use thiserror::Error;

/// Extensions the analyzer can parse.
pub const MESH_EXTENSIONS: &[&str] = &[".stl"];

/// Faces smaller than this (mm²) count as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-8;

/// Fewer faces than this cannot enclose a volume.
pub const MIN_FACES: usize = 4;

/// Rough FDM throughput used for print time estimates.
const CM3_PER_HOUR: f64 = 100.0;

/// PLA density in g/cm³.
const PLA_DENSITY: f64 = 1.25;

const MM3_PER_CM3: f64 = 1000.0;

/// Errors from mesh parsing.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Unsupported file type. Allowed: {}", MESH_EXTENSIONS.join(", "))]
    UnsupportedFileType,

    #[error("Empty model")]
    EmptyModel,

    #[error("{0}")]
    Parse(String),
}

/// Check a filename against [`MESH_EXTENSIONS`].
///
/// # Errors
///
/// Returns `GeometryError::UnsupportedFileType` for anything else.
pub fn check_extension(filename: &str) -> Result<(), GeometryError> {
    let ext = filename
        .rfind('.')
        .and_then(|i| filename.get(i..))
        .map(str::to_ascii_lowercase);

    match ext {
        Some(ext) if MESH_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(GeometryError::UnsupportedFileType),
    }
}

/// A point or vector in mesh units (mm).
pub type Point = [f64; 3];

fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: Point) -> f64 {
    dot(a, a).sqrt()
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point>,
    faces: Vec<[usize; 3]>,
}

/// How the mesh's edges are shared between faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeReport {
    /// Every edge is shared by exactly two faces.
    pub watertight: bool,
    /// Every edge shared by two faces is traversed in opposite directions.
    pub winding_consistent: bool,
}

#[derive(Default)]
struct EdgeUse {
    count: u32,
    forward: u32,
}

impl Mesh {
    /// Build a mesh from vertices and faces indexing into them.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Parse` if a face references a missing vertex.
    pub fn new(vertices: Vec<Point>, faces: Vec<[usize; 3]>) -> Result<Self, GeometryError> {
        if let Some(bad) = faces.iter().flatten().find(|&&i| i >= vertices.len()) {
            return Err(GeometryError::Parse(format!(
                "face references missing vertex {bad}"
            )));
        }
        Ok(Self { vertices, faces })
    }

    /// Parse a binary or ASCII STL file.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Parse` if the bytes are not a readable STL.
    pub fn from_stl(bytes: &[u8]) -> Result<Self, GeometryError> {
        let indexed = stl_io::read_stl(&mut Cursor::new(bytes))
            .map_err(|e| GeometryError::Parse(e.to_string()))?;

        let vertices = indexed
            .vertices
            .iter()
            .map(|v| [f64::from(v[0]), f64::from(v[1]), f64::from(v[2])])
            .collect();
        let faces = indexed.faces.iter().map(|f| f.vertices).collect();

        Self::new(vertices, faces)
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    fn corners(&self, face: [usize; 3]) -> [Point; 3] {
        face.map(|i| self.vertices[i])
    }

    fn face_area(&self, face: [usize; 3]) -> f64 {
        let [a, b, c] = self.corners(face);
        norm(cross(sub(b, a), sub(c, a))) / 2.0
    }

    #[must_use]
    pub fn surface_area(&self) -> f64 {
        self.faces.iter().map(|&f| self.face_area(f)).sum()
    }

    /// Enclosed volume, independent of face orientation.
    ///
    /// Only meaningful for watertight meshes.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let signed: f64 = self
            .faces
            .iter()
            .map(|&f| {
                let [a, b, c] = self.corners(f);
                dot(a, cross(b, c))
            })
            .sum();
        (signed / 6.0).abs()
    }

    /// Number of faces with an area below [`DEGENERATE_AREA`].
    #[must_use]
    pub fn degenerate_faces(&self) -> usize {
        self.faces
            .iter()
            .filter(|&&f| self.face_area(f) < DEGENERATE_AREA)
            .count()
    }

    /// Axis-aligned bounds of the referenced vertices, `None` for no faces.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut points = self.faces.iter().flatten().map(|&i| self.vertices[i]);
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(mut lo, mut hi), p| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
            (lo, hi)
        });

        Some(BoundingBox {
            min,
            max,
            dimensions: sub(max, min),
        })
    }

    #[must_use]
    pub fn edge_report(&self) -> EdgeReport {
        let mut edges: HashMap<(usize, usize), EdgeUse> = HashMap::new();
        for face in &self.faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                let edge = edges.entry((a.min(b), a.max(b))).or_default();
                edge.count += 1;
                if a < b {
                    edge.forward += 1;
                }
            }
        }

        EdgeReport {
            watertight: !edges.is_empty() && edges.values().all(|e| e.count == 2),
            winding_consistent: edges
                .values()
                .filter(|e| e.count == 2)
                .all(|e| e.forward == 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub dimensions: Point,
}

/// Response of `POST /api/geometry/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAnalysis {
    /// mm³
    pub volume: f64,
    /// mm²
    pub surface_area: f64,
    pub bounding_box: BoundingBox,
    pub triangle_count: usize,
    pub is_watertight: bool,
    /// Hours.
    pub estimated_print_time: f64,
    /// Grams of PLA.
    pub estimated_material: f64,
}

/// Response of `POST /api/geometry/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
    pub triangle_count: usize,
    pub is_watertight: bool,
}

/// Measure a mesh and estimate what printing it costs.
///
/// # Errors
///
/// Returns `GeometryError::EmptyModel` for a mesh without faces.
pub fn analyze(mesh: &Mesh) -> Result<ModelAnalysis, GeometryError> {
    let bounding_box = mesh.bounds().ok_or(GeometryError::EmptyModel)?;
    let volume = mesh.volume();
    let volume_cm3 = volume / MM3_PER_CM3;

    Ok(ModelAnalysis {
        volume,
        surface_area: mesh.surface_area(),
        bounding_box,
        triangle_count: mesh.triangle_count(),
        is_watertight: mesh.edge_report().watertight,
        estimated_print_time: volume_cm3 / CM3_PER_HOUR,
        estimated_material: volume_cm3 * PLA_DENSITY,
    })
}

/// List the problems that would stop a mesh from printing cleanly.
#[must_use]
pub fn validate(mesh: &Mesh) -> ValidationReport {
    let edges = mesh.edge_report();
    let mut issues = Vec::new();

    if !edges.watertight {
        issues.push("Model is not watertight (has holes)".to_string());
    }
    if !edges.winding_consistent {
        issues.push("Inconsistent face winding".to_string());
    }
    if mesh.triangle_count() < MIN_FACES {
        issues.push("Too few faces for a valid 3D model".to_string());
    }
    let degenerate = mesh.degenerate_faces();
    if degenerate > 0 {
        issues.push(format!("Contains {degenerate} degenerate faces"));
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
        triangle_count: mesh.triangle_count(),
        is_watertight: edges.watertight,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
pub(crate) mod tests {
    use super::*;

    const CUBE_VERTICES: [Point; 8] = [
        [0.0, 0.0, 0.0],
        [10.0, 0.0, 0.0],
        [10.0, 10.0, 0.0],
        [0.0, 10.0, 0.0],
        [0.0, 0.0, 10.0],
        [10.0, 0.0, 10.0],
        [10.0, 10.0, 10.0],
        [0.0, 10.0, 10.0],
    ];

    /// Outward-facing triangles of a 10 mm cube.
    const CUBE_FACES: [[usize; 3]; 12] = [
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];

    fn cube() -> Mesh {
        Mesh::new(CUBE_VERTICES.to_vec(), CUBE_FACES.to_vec()).unwrap()
    }

    /// Encode triangles as a binary STL file.
    pub(crate) fn binary_stl(triangles: &[[Point; 3]]) -> Vec<u8> {
        let mut bytes = vec![0_u8; 80];
        bytes.extend_from_slice(&u32::try_from(triangles.len()).unwrap().to_le_bytes());
        for triangle in triangles {
            bytes.extend_from_slice(&[0_u8; 12]);
            for corner in triangle {
                for coord in corner {
                    #[allow(clippy::cast_possible_truncation)]
                    bytes.extend_from_slice(&(*coord as f32).to_le_bytes());
                }
            }
            bytes.extend_from_slice(&[0_u8; 2]);
        }
        bytes
    }

    pub(crate) fn cube_stl() -> Vec<u8> {
        let triangles: Vec<[Point; 3]> = CUBE_FACES
            .iter()
            .map(|f| f.map(|i| CUBE_VERTICES[i]))
            .collect();
        binary_stl(&triangles)
    }

    #[test]
    fn test_check_extension() {
        assert!(check_extension("bracket.STL").is_ok());
        assert!(check_extension("gear.v2.stl").is_ok());
        assert!(matches!(
            check_extension("part.step"),
            Err(GeometryError::UnsupportedFileType)
        ));
        assert!(check_extension("stl").is_err());
        assert_eq!(
            GeometryError::UnsupportedFileType.to_string(),
            "Unsupported file type. Allowed: .stl"
        );
    }

    #[test]
    fn test_cube_measurements() {
        let analysis = analyze(&cube()).unwrap();

        assert!((analysis.volume - 1000.0).abs() < 1e-9);
        assert!((analysis.surface_area - 600.0).abs() < 1e-9);
        assert_eq!(analysis.triangle_count, 12);
        assert!(analysis.is_watertight);
        assert_eq!(analysis.bounding_box.min, [0.0, 0.0, 0.0]);
        assert_eq!(analysis.bounding_box.max, [10.0, 10.0, 10.0]);
        assert_eq!(analysis.bounding_box.dimensions, [10.0, 10.0, 10.0]);
        assert!((analysis.estimated_print_time - 0.01).abs() < 1e-12);
        assert!((analysis.estimated_material - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_cube_has_positive_volume() {
        let faces = CUBE_FACES.iter().map(|&[a, b, c]| [a, c, b]).collect();
        let mesh = Mesh::new(CUBE_VERTICES.to_vec(), faces).unwrap();
        assert!((mesh.volume() - 1000.0).abs() < 1e-9);
        assert!(validate(&mesh).valid);
    }

    #[test]
    fn test_valid_cube() {
        let report = validate(&cube());
        assert!(report.valid);
        assert!(report.issues.is_empty());
        assert!(report.is_watertight);
        assert_eq!(report.triangle_count, 12);
    }

    #[test]
    fn test_open_mesh_reports_holes() {
        let mut faces = CUBE_FACES.to_vec();
        faces.truncate(10);
        let report = validate(&Mesh::new(CUBE_VERTICES.to_vec(), faces).unwrap());

        assert!(!report.valid);
        assert!(!report.is_watertight);
        assert_eq!(report.issues, ["Model is not watertight (has holes)"]);
    }

    #[test]
    fn test_flipped_face_reports_winding() {
        let mut faces = CUBE_FACES.to_vec();
        faces[0] = [0, 1, 2];
        let report = validate(&Mesh::new(CUBE_VERTICES.to_vec(), faces).unwrap());

        assert!(report.is_watertight);
        assert_eq!(report.issues, ["Inconsistent face winding"]);
    }

    #[test]
    fn test_single_degenerate_triangle() {
        let mesh = Mesh::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let report = validate(&mesh);

        assert_eq!(
            report.issues,
            [
                "Model is not watertight (has holes)",
                "Too few faces for a valid 3D model",
                "Contains 1 degenerate faces",
            ]
        );
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new(Vec::new(), Vec::new()).unwrap();
        assert!(matches!(analyze(&mesh), Err(GeometryError::EmptyModel)));
        assert!(!validate(&mesh).valid);
    }

    #[test]
    fn test_face_with_missing_vertex() {
        assert!(matches!(
            Mesh::new(vec![[0.0; 3]], vec![[0, 0, 7]]),
            Err(GeometryError::Parse(_))
        ));
    }

    #[test]
    fn test_from_binary_stl() {
        let mesh = Mesh::from_stl(&cube_stl()).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.edge_report().watertight);
        assert!((mesh.volume() - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_garbage() {
        assert!(matches!(
            Mesh::from_stl(b"definitely not a mesh"),
            Err(GeometryError::Parse(_))
        ));
    }
}
