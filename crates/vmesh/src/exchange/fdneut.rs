//! FIDAP neutral file output (`.FDNEUT`).
//!
//! Only the cells of the highest dimension are written, grouped into one
//! element group per cell type. Node and element numbers start at 1.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use log::debug;

use crate::error::WriteError;
use crate::exchange::FdneutGridWriter;
use crate::mesh::{CellType, UnstructuredMesh};

const VERSION: &str = "VERSION    8.01";

/// Writes FIDAP neutral files with a fixed title and date line, so the
/// same mesh always produces the same bytes.
#[derive(Debug, Clone)]
pub struct FdneutWriter {
    pub title: String,
    pub date: String,
}

impl Default for FdneutWriter {
    fn default() -> Self {
        Self {
            title: "vmesh".to_string(),
            date: "01 Jan 2000    00:00:00".to_string(),
        }
    }
}

impl FdneutGridWriter for FdneutWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()> {
        let groups = element_groups(mesh)?;
        let file = File::create(path)?;
        write_fdneut(self, mesh, &groups, BufWriter::new(file))
    }
}

/// The FIDAP geometry code of a cell type and the order its VTK nodes
/// are listed in, or None if FIDAP can't hold it.
fn fidap_element(kind: CellType) -> Option<(usize, &'static [usize])> {
    match kind {
        CellType::Quad => Some((1, &[0, 1, 2, 3])),
        CellType::Triangle => Some((2, &[0, 1, 2])),
        // corner and mid-edge nodes alternate around the perimeter
        CellType::QuadraticTriangle => Some((2, &[0, 3, 1, 4, 2, 5])),
        // brick nodes are ordered lexicographically
        CellType::Hexahedron => Some((3, &[0, 1, 3, 2, 4, 5, 7, 6])),
        CellType::Wedge => Some((4, &[0, 1, 2, 3, 4, 5])),
        CellType::Tetra => Some((5, &[0, 1, 2, 3])),
        CellType::QuadraticTetra => Some((5, &[0, 4, 1, 6, 5, 2, 7, 8, 9, 3])),
        _ => None,
    }
}

#[derive(Debug, PartialEq)]
struct ElementGroup {
    kind: CellType,
    geometry: usize,
    // indexes into `UnstructuredMesh::cells`
    cells: Vec<usize>,
}

/// Group the highest dimension cells by type, in order of appearance.
fn element_groups(mesh: &UnstructuredMesh) -> Result<Vec<ElementGroup>> {
    mesh.validate()?;
    let Some(dimension) = mesh.max_dimension() else {
        return Ok(Vec::new());
    };

    let mut groups: Vec<ElementGroup> = Vec::new();
    for (i, cell) in mesh.cells.iter().enumerate() {
        if cell.kind.dimension() != dimension {
            debug!("skipping {} cell {} for FDNEUT", cell.kind.name(), i);
            continue;
        }
        let (geometry, _) = fidap_element(cell.kind).ok_or_else(|| {
            WriteError::InvalidMesh(format!(
                "cell {} is a {} which has no FIDAP element geometry",
                i,
                cell.kind.name()
            ))
        })?;
        match groups.iter_mut().find(|g| g.kind == cell.kind) {
            Some(group) => group.cells.push(i),
            None => groups.push(ElementGroup {
                kind: cell.kind,
                geometry,
                cells: vec![i],
            }),
        }
    }
    Ok(groups)
}

/// Format a float like Fortran's `E` edit descriptor, `1.0000000000E+00`.
fn fortran_exp(value: f64) -> String {
    let text = format!("{:.10E}", value);
    match text.split_once('E') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(e) => format!(
                "{}E{}{:02}",
                mantissa,
                if e < 0 { '-' } else { '+' },
                e.abs()
            ),
            Err(_) => text,
        },
        // NaN and infinity have no exponent
        None => text,
    }
}

fn write_fdneut<W: Write>(
    writer: &FdneutWriter,
    mesh: &UnstructuredMesh,
    groups: &[ElementGroup],
    mut out: W,
) -> Result<()> {
    let n_elements: usize = groups.iter().map(|g| g.cells.len()).sum();

    writeln!(out, "** FIDAP NEUTRAL FILE")?;
    writeln!(out, "{}", writer.title)?;
    writeln!(out, "{}", VERSION)?;
    writeln!(out, "{}", writer.date)?;
    writeln!(
        out,
        "   NO. OF NODES   NO. ELEMENTS NO. ELT GROUPS          NDFCD          NDFVL"
    )?;
    writeln!(
        out,
        "{:15}{:15}{:15}{:15}{:15}",
        mesh.point_count(),
        n_elements,
        groups.len(),
        3,
        3
    )?;
    writeln!(
        out,
        "   STEADY/TRANS     TURB. FLAG FREE SURF FLAG    COMPR. FLAG   RESULTS ONLY"
    )?;
    writeln!(out, "{:15}{:15}{:15}{:15}{:15}", 0, 0, 0, 0, 0)?;
    writeln!(out, "TEMPERATURE/SPECIES FLAGS")?;
    writeln!(out, " 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0")?;
    writeln!(out, "PRESSURE FLAGS - IDYNP, IHYDP")?;
    writeln!(out, " 0 0")?;

    writeln!(out, "NODAL COORDINATES       {}", VERSION)?;
    for (i, p) in mesh.points.iter().enumerate() {
        writeln!(
            out,
            "{:10}{:>20}{:>20}{:>20}",
            i + 1,
            fortran_exp(p.x),
            fortran_exp(p.y),
            fortran_exp(p.z)
        )?;
    }

    writeln!(out, "BOUNDARY CONDITIONS     {}", VERSION)?;
    writeln!(out, "ELEMENT GROUPS          {}", VERSION)?;

    let mut element = 0;
    for (g, group) in groups.iter().enumerate() {
        let nodes = group.kind.node_count();
        writeln!(
            out,
            "GROUP:{:9} ELEMENTS:{:11} NODES:{:14} GEOMETRY:{:5} TYPE:{:4}",
            g + 1,
            group.cells.len(),
            nodes,
            group.geometry,
            1
        )?;
        writeln!(out, "ENTITY NAME:   fluid")?;

        let order = fidap_element(group.kind).map(|(_, o)| o).unwrap_or_default();
        for &i in group.cells.iter() {
            element += 1;
            let connectivity = &mesh.cells[i].connectivity;
            writeln!(
                out,
                "{:8} {}",
                element,
                order.iter().map(|&j| connectivity[j] + 1).join(" ")
            )?;
        }
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {

    use nalgebra::Point3;

    use super::*;
    use crate::mesh::Cell;

    fn tet_with_face() -> UnstructuredMesh {
        UnstructuredMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, -0.25),
            ],
            vec![
                Cell::new(CellType::Triangle, vec![0, 2, 1]),
                Cell::new(CellType::Tetra, vec![0, 1, 2, 3]),
            ],
        )
    }

    #[test]
    fn test_fortran_exp() {
        assert_eq!(fortran_exp(0.0), "0.0000000000E+00");
        assert_eq!(fortran_exp(1.0), "1.0000000000E+00");
        assert_eq!(fortran_exp(-0.25), "-2.5000000000E-01");
        assert_eq!(fortran_exp(12345.0), "1.2345000000E+04");
        assert_eq!(fortran_exp(1e-120), "1.0000000000E-120");
    }

    #[test]
    fn test_fdneut_tet() {
        let mesh = tet_with_face();
        let groups = element_groups(&mesh).unwrap();
        assert_eq!(
            groups,
            vec![ElementGroup {
                kind: CellType::Tetra,
                geometry: 5,
                cells: vec![1]
            }]
        );

        let mut buffer = Vec::new();
        write_fdneut(&FdneutWriter::default(), &mesh, &groups, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "** FIDAP NEUTRAL FILE");
        assert_eq!(
            lines[5],
            format!("{:15}{:15}{:15}{:15}{:15}", 4, 1, 1, 3, 3)
        );

        // nodes are numbered from one
        let start = lines
            .iter()
            .position(|l| l.starts_with("NODAL COORDINATES"))
            .unwrap();
        assert_eq!(
            lines[start + 4],
            "         4    0.0000000000E+00    0.0000000000E+00   -2.5000000000E-01"
        );

        assert!(text.ends_with(
            "GROUP:        1 ELEMENTS:          1 NODES:             4 GEOMETRY:    5 TYPE:   1\n\
             ENTITY NAME:   fluid\n       1 1 2 3 4\n"
        ));
    }

    #[test]
    fn test_fdneut_reorders_nodes() {
        let points = (0..8)
            .map(|i| Point3::new((i % 2) as f64, ((i / 2) % 2) as f64, (i / 4) as f64))
            .collect();
        let mesh = UnstructuredMesh::new(
            points,
            vec![Cell::new(CellType::Hexahedron, vec![0, 1, 3, 2, 4, 5, 7, 6])],
        );
        let groups = element_groups(&mesh).unwrap();
        let mut buffer = Vec::new();
        write_fdneut(&FdneutWriter::default(), &mesh, &groups, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.ends_with("       1 1 2 3 4 5 6 7 8\n"));
    }

    #[test]
    fn test_fdneut_unsupported() {
        let mesh = UnstructuredMesh::new(
            vec![Point3::new(0.0, 0.0, 0.0); 5],
            vec![Cell::new(CellType::Pyramid, vec![0, 1, 2, 3, 4])],
        );
        let err = element_groups(&mesh).err().unwrap();
        assert!(err.to_string().contains("pyramid"));
    }
}
