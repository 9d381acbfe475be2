//! STL file format I/O.
//!
//! The solid models attached to material regions are triangulated STL
//! exports (FreeCAD writes them in millimetres). openEMS reads the files
//! itself, so here they are only parsed to check that they are usable and
//! to report their extents before the solver starts.

use crate::{Mesh, Point, Vector};
use anyhow::{Context, Result, anyhow, bail};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// STL file format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// ASCII text format (human-readable, larger file size)
    Ascii,
    /// Binary format (compact, faster to read/write)
    Binary,
}

const BINARY_HEADER_LEN: usize = 80;
const BINARY_TRIANGLE_LEN: usize = 50;

impl StlFormat {
    /// Guesses the format from the file contents.
    ///
    /// Binary files may also start with "solid" in their header, so the size
    /// implied by the triangle count wins when it matches.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.len() >= BINARY_HEADER_LEN + 4 {
            let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
            if BINARY_HEADER_LEN + 4 + count * BINARY_TRIANGLE_LEN == bytes.len() {
                return StlFormat::Binary;
            }
        }
        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
        if head.trim_start().starts_with("solid") {
            StlFormat::Ascii
        } else {
            StlFormat::Binary
        }
    }
}

/// Reads triangles from an STL file into a Mesh.
pub fn read_stl(path: &Path) -> Result<Mesh> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read STL file: {}", path.display()))?;
    parse_stl(&bytes).with_context(|| format!("Invalid STL file: {}", path.display()))
}

/// Parses STL contents (either format).
pub fn parse_stl(bytes: &[u8]) -> Result<Mesh> {
    let triangles = match StlFormat::detect(bytes) {
        StlFormat::Ascii => parse_ascii(bytes)?,
        StlFormat::Binary => parse_binary(bytes)?,
    };
    Ok(Mesh::from_triangles(&triangles))
}

fn parse_ascii(bytes: &[u8]) -> Result<Vec<[Point; 3]>> {
    let text = std::str::from_utf8(bytes).context("ASCII STL is not valid UTF-8")?;

    let mut triangles: Vec<[Point; 3]> = Vec::new();
    let mut corners: Vec<Point> = Vec::with_capacity(3);

    for (lineno, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("vertex") => {
                let mut coord = || -> Result<f64> {
                    let tok = parts
                        .next()
                        .ok_or_else(|| anyhow!("Line {}: vertex needs 3 coordinates", lineno + 1))?;
                    tok.parse::<f64>()
                        .with_context(|| format!("Line {}: bad coordinate '{tok}'", lineno + 1))
                };
                let (x, y, z) = (coord()?, coord()?, coord()?);
                corners.push(Point::new(x, y, z));
            }
            Some("endloop") => {
                if corners.len() != 3 {
                    bail!(
                        "Line {}: facet has {} vertices, expected 3",
                        lineno + 1,
                        corners.len()
                    );
                }
                triangles.push([corners[0], corners[1], corners[2]]);
                corners.clear();
            }
            _ => {}
        }
    }

    if !corners.is_empty() {
        bail!(
            "File ends inside a facet ({} vertices after the last endloop)",
            corners.len()
        );
    }

    Ok(triangles)
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<[Point; 3]>> {
    if bytes.len() < BINARY_HEADER_LEN + 4 {
        bail!("Binary STL is shorter than its header ({} bytes)", bytes.len());
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let body = &bytes[BINARY_HEADER_LEN + 4..];
    if body.len() < count * BINARY_TRIANGLE_LEN {
        bail!(
            "Binary STL declares {count} triangles but holds only {} bytes of facet data",
            body.len()
        );
    }

    let read_f32 = |chunk: &[u8], offset: usize| -> f64 {
        f32::from_le_bytes([
            chunk[offset],
            chunk[offset + 1],
            chunk[offset + 2],
            chunk[offset + 3],
        ]) as f64
    };

    // Facet layout: normal (12 bytes), 3 vertices (36 bytes), attribute (2 bytes)
    let triangles = body
        .chunks_exact(BINARY_TRIANGLE_LEN)
        .take(count)
        .map(|chunk| {
            let vertex = |i: usize| {
                let base = 12 + 12 * i;
                Point::new(
                    read_f32(chunk, base),
                    read_f32(chunk, base + 4),
                    read_f32(chunk, base + 8),
                )
            };
            [vertex(0), vertex(1), vertex(2)]
        })
        .collect();

    Ok(triangles)
}

/// Writes a mesh to an STL file.
///
/// # Arguments
/// * `path` - Path to the output file
/// * `mesh` - The mesh to export
/// * `name` - Name to use in the STL header
/// * `format` - ASCII or Binary format
pub fn write_stl(path: &Path, mesh: &Mesh, name: &str, format: StlFormat) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        StlFormat::Ascii => write_ascii(&mut writer, mesh, name)?,
        StlFormat::Binary => write_binary(&mut writer, mesh, name)?,
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write STL file: {}", path.display()))
}

fn facet_normal(tri: &[Point; 3]) -> Vector {
    Vector::normal(tri[0], tri[1], tri[2]).unwrap_or(Vector::new(0.0, 0.0, 1.0))
}

fn write_ascii<W: Write>(writer: &mut W, mesh: &Mesh, name: &str) -> Result<()> {
    writeln!(writer, "solid {name}")?;
    for tri in mesh.triangles() {
        let n = facet_normal(&tri);
        writeln!(writer, "  facet normal {} {} {}", n.dx, n.dy, n.dz)?;
        writeln!(writer, "    outer loop")?;
        for p in tri {
            writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid {name}")?;
    Ok(())
}

fn write_binary<W: Write>(writer: &mut W, mesh: &Mesh, name: &str) -> Result<()> {
    let mut header = [0u8; BINARY_HEADER_LEN];
    let label = format!("binary STL - {name}");
    let len = label.len().min(BINARY_HEADER_LEN);
    header[..len].copy_from_slice(&label.as_bytes()[..len]);
    writer.write_all(&header)?;

    let count = u32::try_from(mesh.face_count()).context("Too many triangles for binary STL")?;
    writer.write_all(&count.to_le_bytes())?;

    for tri in mesh.triangles() {
        let n = facet_normal(&tri);
        for v in [n.dx, n.dy, n.dz] {
            writer.write_all(&(v as f32).to_le_bytes())?;
        }
        for p in tri {
            for v in [p.x, p.y, p.z] {
                writer.write_all(&(v as f32).to_le_bytes())?;
            }
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    Ok(())
}

/// Axis-aligned box mesh with corners `lo` and `hi` (12 triangles).
///
/// Handy for producing placeholder solid models.
pub fn box_mesh(lo: Point, hi: Point) -> Mesh {
    let c = |i: usize| {
        Point::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        )
    };
    // Outward facing quads, counter-clockwise seen from outside
    let quads = [
        [0, 2, 3, 1], // z-
        [4, 5, 7, 6], // z+
        [0, 1, 5, 4], // y-
        [2, 6, 7, 3], // y+
        [0, 4, 6, 2], // x-
        [1, 3, 7, 5], // x+
    ];
    let triangles: Vec<[Point; 3]> = quads
        .iter()
        .flat_map(|q| [[c(q[0]), c(q[1]), c(q[2])], [c(q[0]), c(q[2]), c(q[3])]])
        .collect();
    Mesh::from_triangles(&triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tetrahedron() -> Mesh {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(1.0, 0.0, 0.0);
        let c = Point::new(0.5, 1.0, 0.0);
        let d = Point::new(0.5, 0.5, 1.0);
        Mesh::from_triangles(&[[a, c, b], [a, b, d], [b, c, d], [c, a, d]])
    }

    #[test]
    fn test_write_read_ascii() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tet.stl");
        write_stl(&path, &tetrahedron(), "tet", StlFormat::Ascii)?;

        let content = std::fs::read_to_string(&path)?;
        assert!(content.starts_with("solid tet"));
        assert!(content.contains("facet normal"));
        assert!(content.trim_end().ends_with("endsolid tet"));

        let loaded = read_stl(&path)?;
        assert_eq!(loaded.face_count(), 4);
        assert_eq!(loaded.vertex_count(), 4);
        Ok(())
    }

    #[test]
    fn test_write_read_binary() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tet.stl");
        write_stl(&path, &tetrahedron(), "tet", StlFormat::Binary)?;

        // 80 header + 4 count + 4 triangles * 50 bytes
        assert_eq!(std::fs::metadata(&path)?.len(), 80 + 4 + 4 * 50);

        let loaded = read_stl(&path)?;
        assert_eq!(loaded.face_count(), 4);
        assert_eq!(loaded.vertex_count(), 4);
        Ok(())
    }

    #[test]
    fn test_binary_header_starting_with_solid() -> Result<()> {
        let mut bytes = vec![0u8; 84];
        bytes[..5].copy_from_slice(b"solid");
        bytes[80..84].copy_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 50]);
        assert_eq!(StlFormat::detect(&bytes), StlFormat::Binary);
        let mesh = parse_stl(&bytes)?;
        assert_eq!(mesh.face_count(), 1);
        Ok(())
    }

    #[test]
    fn test_truncated_ascii() {
        let text = "solid cut\n  facet normal 0 0 1\n    outer loop\n      vertex 0 0 0\n      vertex 1 0 0\n";
        let err = parse_stl(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("2 vertices"));
    }

    #[test]
    fn test_empty_ascii_solid() -> Result<()> {
        let mesh = parse_stl(b"solid empty\nendsolid empty\n")?;
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.bounds().is_none());
        Ok(())
    }

    #[test]
    fn test_truncated_binary() {
        let mut bytes = vec![0u8; 84];
        bytes[80..84].copy_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 60]);
        assert!(parse_stl(&bytes).is_err());
    }

    #[test]
    fn test_bad_ascii_vertex() {
        let text = "solid bad\n facet normal 0 0 1\n outer loop\n vertex 0 0 zero\n";
        assert!(parse_stl(text.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = read_stl(Path::new("/nonexistent/copper_gen_model.stl")).unwrap_err();
        assert!(format!("{err:#}").contains("copper_gen_model.stl"));
    }

    #[test]
    fn test_box_mesh() -> Result<()> {
        let mesh = box_mesh(Point::new(64., -90., -1.), Point::new(137., -31., 3.));
        assert_eq!(mesh.face_count(), 12);
        assert_eq!(mesh.vertex_count(), 8);

        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        write_stl(&path, &mesh, "box", StlFormat::Binary)?;
        let (lo, hi) = read_stl(&path)?.bounds().unwrap();
        assert!((lo.x - 64.).abs() < 1e-4 && (hi.y + 31.).abs() < 1e-4);
        Ok(())
    }
}
