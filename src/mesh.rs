use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use obj::raw::object::{parse_obj, Polygon, RawObj};
use obj::ObjError;
use tracing::info;

use crate::error::{Error, Result};
use crate::math::{Vec2f, Vec3f};

/// One triangle: per-corner indices into the position, texture coordinate and normal arrays.
/// All indices are zero-based and checked against the mesh at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub vertices: [usize; 3],
    pub textures: [usize; 3],
    pub normals: [usize; 3],
}

impl Face {
    /// Accepts only `position/texture/normal` triangles.
    fn from_polygon(index: usize, polygon: &Polygon) -> Result<Face> {
        let unsupported = |message: String| Error::UnsupportedFace {
            face: index,
            message,
        };
        let corners = match polygon {
            Polygon::PTN(corners) => corners,
            _ => {
                return Err(unsupported(
                    "corners must be `position/texture/normal`".to_string(),
                ))
            }
        };
        if corners.len() != 3 {
            return Err(unsupported(format!(
                "only triangles are supported, face has {} corners",
                corners.len()
            )));
        }
        let mut face = Face {
            vertices: [0; 3],
            textures: [0; 3],
            normals: [0; 3],
        };
        for (corner, &(v, t, n)) in corners.iter().enumerate() {
            face.vertices[corner] = v;
            face.textures[corner] = t;
            face.normals[corner] = n;
        }
        return Ok(face);
    }
}

/// Triangle mesh read from a Wavefront OBJ file with `v`, `vt`, `vn` and
/// triangular `f v/t/n` records. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<Vec3f>,
    texture_coords: Vec<Vec2f>,
    normals: Vec<Vec3f>,
    faces: Vec<Face>,
}

impl Mesh {
    /// Reads and validates a mesh file.
    pub fn load(path: impl AsRef<Path>) -> Result<Mesh> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mesh = Mesh::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "Loaded mesh"
        );
        return Ok(mesh);
    }

    /// Parses with `obj-rs`, then narrows the result to triangles.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Mesh> {
        let mut lines = LineTracker::new(reader);
        let raw = match parse_obj(&mut lines) {
            Ok(raw) => raw,
            Err(ObjError::Io(err)) => return Err(Error::Io(err)),
            Err(err) => {
                return Err(Error::Parse {
                    line: lines.line,
                    message: format!("{} in `{}`", err, lines.text()),
                })
            }
        };
        let mesh = Mesh::from_raw(&raw)?;
        mesh.validate()?;
        return Ok(mesh);
    }

    fn from_raw(raw: &RawObj) -> Result<Mesh> {
        let faces = raw
            .polygons
            .iter()
            .enumerate()
            .map(|(index, polygon)| Face::from_polygon(index, polygon))
            .collect::<Result<Vec<Face>>>()?;
        return Ok(Mesh {
            // The homogeneous weight of positions and the third texture coordinate are dropped.
            vertices: raw.positions.iter().map(|&(x, y, z, _)| Vec3f::new(x, y, z)).collect(),
            texture_coords: raw.tex_coords.iter().map(|&(u, v, _)| Vec2f::new(u, v)).collect(),
            normals: raw.normals.iter().map(|&(x, y, z)| Vec3f::new(x, y, z)).collect(),
            faces,
        });
    }

    /// Checks every face index against the arrays it points into.
    fn validate(&self) -> Result<()> {
        for (face_index, face) in self.faces.iter().enumerate() {
            let checks = [
                ("vertex", &face.vertices, self.vertices.len()),
                ("texture", &face.textures, self.texture_coords.len()),
                ("normal", &face.normals, self.normals.len()),
            ];
            for (attribute, indices, len) in checks {
                if let Some(&index) = indices.iter().find(|&&index| index >= len) {
                    return Err(Error::IndexOutOfRange {
                        face: face_index,
                        attribute,
                        index,
                        len,
                    });
                }
            }
        }
        return Ok(());
    }

    pub fn vertex_count(&self) -> usize {
        return self.vertices.len();
    }

    pub fn face_count(&self) -> usize {
        return self.faces.len();
    }

    pub fn texture_coord_count(&self) -> usize {
        return self.texture_coords.len();
    }

    pub fn normal_count(&self) -> usize {
        return self.normals.len();
    }

    /// Object-space position. Panics if `index` is out of range, like slice indexing.
    pub fn vertex(&self, index: usize) -> Vec3f {
        return self.vertices[index];
    }

    /// Position indices of face `index`.
    pub fn face(&self, index: usize) -> [usize; 3] {
        return self.faces[index].vertices;
    }

    pub fn texture_indices(&self, index: usize) -> [usize; 3] {
        return self.faces[index].textures;
    }

    pub fn normal_indices(&self, index: usize) -> [usize; 3] {
        return self.faces[index].normals;
    }

    pub fn texture_coord(&self, index: usize) -> Vec2f {
        return self.texture_coords[index];
    }

    pub fn normal(&self, index: usize) -> Vec3f {
        return self.normals[index];
    }

    pub fn faces(&self) -> &[Face] {
        return &self.faces;
    }
}

impl FromStr for Mesh {
    type Err = Error;

    fn from_str(source: &str) -> Result<Mesh> {
        return Mesh::from_reader(source.as_bytes());
    }
}

/// Counts the lines handed to the OBJ lexer so its errors can name a position.
struct LineTracker<R> {
    inner: R,
    line: usize,
    current: Vec<u8>,
    line_done: bool,
}

impl<R: BufRead> LineTracker<R> {
    fn new(inner: R) -> LineTracker<R> {
        return LineTracker {
            inner,
            line: 0,
            current: Vec::new(),
            line_done: true,
        };
    }

    /// Text of the last line consumed.
    fn text(&self) -> String {
        return String::from_utf8_lossy(&self.current).trim().to_string();
    }
}

impl<R: BufRead> Read for LineTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = available.len().min(buf.len());
        buf[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        return Ok(amount);
    }
}

impl<R: BufRead> BufRead for LineTracker<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        return self.inner.fill_buf();
    }

    fn consume(&mut self, amount: usize) {
        // Already buffered, so this does not touch the underlying reader.
        if let Ok(available) = self.inner.fill_buf() {
            for &byte in &available[..amount.min(available.len())] {
                if self.line_done {
                    self.current.clear();
                    self.line += 1;
                    self.line_done = false;
                }
                if byte == b'\n' {
                    self.line_done = true;
                } else {
                    self.current.push(byte);
                }
            }
        }
        self.inner.consume(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
# two triangles sharing an edge
o quad
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
s off
usemtl none
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";

    #[test]
    fn counts_match_records() {
        let mesh: Mesh = QUAD.parse().unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.texture_coord_count(), 4);
        assert_eq!(mesh.normal_count(), 1);
    }

    #[test]
    fn indices_become_zero_based() {
        let mesh: Mesh = QUAD.parse().unwrap();
        assert_eq!(mesh.face(1), [0, 2, 3]);
        assert_eq!(mesh.texture_indices(1), [0, 2, 3]);
        assert_eq!(mesh.normal_indices(0), [0, 0, 0]);
        assert_eq!(mesh.vertex(2), Vec3f::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.texture_coord(1), Vec2f::new(1.0, 0.0));
        assert_eq!(mesh.normal(0), Vec3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn malformed_number_reports_line() {
        let err = "v 1.0 2.0 3.0\nv 1.0 abc 3.0\n".parse::<Mesh>().unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn short_vertex_record_is_rejected() {
        assert!(matches!(
            "v 1.0 2.0\n".parse::<Mesh>(),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn polygons_are_rejected() {
        let source =
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1 4/1/1\n";
        let err = source.parse::<Mesh>().unwrap_err();
        assert!(err.to_string().contains("only triangles"), "{}", err);
    }

    #[test]
    fn corners_without_all_indices_are_rejected() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
        assert!(matches!(
            source.parse::<Mesh>(),
            Err(Error::UnsupportedFace { face: 0, .. })
        ));
    }

    #[test]
    fn zero_index_is_rejected() {
        let source = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 0/1/1 1/1/1 1/1/1\n";
        assert!(matches!(source.parse::<Mesh>(), Err(Error::Parse { line: 4, .. })));
    }

    #[test]
    fn out_of_range_index_reports_line() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/2/1\n";
        match source.parse::<Mesh>().unwrap_err() {
            Error::Parse { line, message } => {
                assert_eq!(line, 6);
                assert!(message.contains("3/2/1"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn validate_names_the_offending_attribute() {
        let mut mesh: Mesh = QUAD.parse().unwrap();
        mesh.faces[1].normals[2] = 1;
        match mesh.validate().unwrap_err() {
            Error::IndexOutOfRange {
                face,
                attribute,
                index,
                len,
            } => {
                assert_eq!((face, attribute, index, len), (1, "normal", 1, 1));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn line_tracker_counts_consumed_lines() {
        let mut lines = LineTracker::new("first\nsecond line\nthird".as_bytes());
        let mut text = String::new();
        lines.read_line(&mut text).unwrap();
        lines.read_line(&mut text).unwrap();
        assert_eq!(lines.line, 2);
        assert_eq!(lines.text(), "second line");
        lines.read_line(&mut text).unwrap();
        assert_eq!((lines.line, lines.text().as_str()), (3, "third"));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = Mesh::load("does/not/exist.obj").unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
    }

    #[test]
    fn load_reads_from_disk() {
        let path = std::env::temp_dir()
            .join(format!("tiny_rasterizer_quad_{}.obj", std::process::id()));
        std::fs::write(&path, QUAD).unwrap();
        let mesh = Mesh::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(mesh.face_count(), 2);
    }
}
