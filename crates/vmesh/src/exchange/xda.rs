//! libMesh ASCII mesh output (`.xda`).
//!
//! The elements of an XDA file are the cells of the highest dimension in
//! the mesh. Cells one dimension lower are boundary faces: when a
//! boundary data array is named, each one is matched to the element side
//! sharing its nodes and written as a boundary condition
//! `element side id`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::AHashMap;
use anyhow::Result;
use itertools::Itertools;
use log::debug;

use crate::error::WriteError;
use crate::exchange::{XdaGridWriter, XdaOptions};
use crate::mesh::{CellType, UnstructuredMesh};

/// Writes `.xda` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdaWriter;

impl XdaGridWriter for XdaWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path, options: &XdaOptions) -> Result<()> {
        // everything that can fail on the mesh happens before the file exists
        let xda = XdaMesh::from_mesh(mesh, options.boundary_data_array_name.as_deref())?;
        let file = File::create(path)?;
        xda.write(BufWriter::new(file))
    }
}

/// The libMesh element type id for a cell type.
fn libmesh_type(kind: CellType) -> Option<usize> {
    match kind {
        CellType::Triangle => Some(3),
        CellType::QuadraticTriangle => Some(4),
        CellType::Quad => Some(5),
        CellType::Tetra => Some(8),
        CellType::QuadraticTetra => Some(9),
        CellType::Hexahedron => Some(10),
        CellType::Wedge => Some(13),
        CellType::Pyramid => Some(16),
        _ => None,
    }
}

/// The vertices of each side of an element in libMesh side order.
fn sides(kind: CellType) -> &'static [&'static [usize]] {
    match kind {
        CellType::Triangle | CellType::QuadraticTriangle => &[&[0, 1], &[1, 2], &[2, 0]],
        CellType::Quad => &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]],
        CellType::Tetra | CellType::QuadraticTetra => {
            &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[2, 0, 3]]
        }
        CellType::Hexahedron => &[
            &[0, 3, 2, 1],
            &[0, 1, 5, 4],
            &[1, 2, 6, 5],
            &[2, 3, 7, 6],
            &[3, 0, 4, 7],
            &[4, 5, 6, 7],
        ],
        CellType::Wedge => &[
            &[0, 2, 1],
            &[0, 1, 4, 3],
            &[1, 2, 5, 4],
            &[2, 0, 3, 5],
            &[3, 4, 5],
        ],
        CellType::Pyramid => &[&[0, 1, 4], &[1, 2, 4], &[2, 3, 4], &[3, 0, 4], &[0, 3, 2, 1]],
        CellType::Vertex | CellType::Line => &[],
    }
}

/// How many of a boundary cell's leading nodes are corner vertices.
fn corner_count(kind: CellType) -> usize {
    match kind {
        CellType::QuadraticTriangle => 3,
        CellType::QuadraticTetra => 4,
        other => other.node_count(),
    }
}

/// A sorted list of point indexes identifying a face regardless of
/// its orientation.
fn face_key(nodes: impl Iterator<Item = usize>) -> Vec<usize> {
    nodes.sorted_unstable().collect()
}

/// A block of elements of the same type.
#[derive(Debug, PartialEq)]
struct XdaBlock {
    libmesh_type: usize,
    // indexes into `UnstructuredMesh::cells`
    cells: Vec<usize>,
}

/// A boundary condition: element number in file order, side, id.
#[derive(Debug, Clone, Copy, PartialEq)]
struct XdaBoundary {
    element: usize,
    side: usize,
    id: i64,
}

/// The intermediate representation of an XDA file.
struct XdaMesh<'a> {
    mesh: &'a UnstructuredMesh,
    blocks: Vec<XdaBlock>,
    boundaries: Vec<XdaBoundary>,
}

impl<'a> XdaMesh<'a> {
    /// Sort the cells of `mesh` into element blocks and boundary faces.
    fn from_mesh(mesh: &'a UnstructuredMesh, boundary_array: Option<&str>) -> Result<Self> {
        mesh.validate()?;

        let Some(dimension) = mesh.max_dimension() else {
            return Ok(Self {
                mesh,
                blocks: Vec::new(),
                boundaries: Vec::new(),
            });
        };

        // blocks are ordered by the first appearance of their element type
        let mut blocks: Vec<XdaBlock> = Vec::new();
        for (i, cell) in mesh.cells.iter().enumerate() {
            if cell.kind.dimension() != dimension {
                continue;
            }
            let kind = libmesh_type(cell.kind).ok_or_else(|| {
                WriteError::InvalidMesh(format!(
                    "cell {} is a {} which has no XDA element type",
                    i,
                    cell.kind.name()
                ))
            })?;
            match blocks.iter_mut().find(|b| b.libmesh_type == kind) {
                Some(block) => block.cells.push(i),
                None => blocks.push(XdaBlock {
                    libmesh_type: kind,
                    cells: vec![i],
                }),
            }
        }

        let boundaries = match boundary_array {
            Some(name) => Self::match_boundaries(mesh, &blocks, dimension, name)?,
            None => Vec::new(),
        };

        Ok(Self {
            mesh,
            blocks,
            boundaries,
        })
    }

    /// Find the element side of every boundary face and read its id
    /// from the cell data array `name`.
    fn match_boundaries(
        mesh: &UnstructuredMesh,
        blocks: &[XdaBlock],
        dimension: usize,
        name: &str,
    ) -> Result<Vec<XdaBoundary>> {
        let ids = mesh.cell_data.get(name).ok_or_else(|| {
            WriteError::InvalidMesh(format!("no cell data array named `{name}`"))
        })?;

        // every element side keyed by its sorted vertices, elements are
        // numbered in the order they are written
        let mut side_map: AHashMap<Vec<usize>, (usize, usize)> = AHashMap::new();
        for (element, &cell_index) in blocks.iter().flat_map(|b| b.cells.iter()).enumerate() {
            let cell = &mesh.cells[cell_index];
            for (side, vertices) in sides(cell.kind).iter().enumerate() {
                let key = face_key(vertices.iter().map(|&v| cell.connectivity[v]));
                side_map.entry(key).or_insert((element, side));
            }
        }

        let mut boundaries = Vec::new();
        for (i, cell) in mesh.cells.iter().enumerate() {
            if cell.kind.dimension() + 1 != dimension {
                if cell.kind.dimension() < dimension {
                    debug!("skipping {} cell {} for XDA boundaries", cell.kind.name(), i);
                }
                continue;
            }
            let key = face_key(cell.connectivity.iter().take(corner_count(cell.kind)).copied());
            let &(element, side) = side_map.get(&key).ok_or_else(|| {
                WriteError::InvalidMesh(format!(
                    "boundary cell {} does not match the side of any element",
                    i
                ))
            })?;
            boundaries.push(XdaBoundary {
                element,
                side,
                id: ids.component(i, 0).round() as i64,
            });
        }
        Ok(boundaries)
    }

    fn write<W: Write>(&self, mut out: W) -> Result<()> {
        let n_elements: usize = self.blocks.iter().map(|b| b.cells.len()).sum();
        let weights: usize = self
            .blocks
            .iter()
            .flat_map(|b| b.cells.iter())
            .map(|&i| self.mesh.cells[i].connectivity.len())
            .sum();

        writeln!(out, "DEAL 003:003")?;
        writeln!(out, "{}\t # Num. Elements", n_elements)?;
        writeln!(out, "{}\t # Num. Nodes", self.mesh.point_count())?;
        writeln!(out, "{}\t # Sum of Element Weights", weights)?;
        writeln!(out, "{}\t # Num. Boundary Conds.", self.boundaries.len())?;
        writeln!(out, "65536\t # String Size (ignore)")?;
        writeln!(out, "{}\t # Num. Element Types.", self.blocks.len())?;
        writeln!(
            out,
            "{}\t # Element types in each block.",
            self.blocks.iter().map(|b| b.libmesh_type).join(" ")
        )?;
        writeln!(
            out,
            "{}\t # Num. of elements in each block.",
            self.blocks.iter().map(|b| b.cells.len()).join(" ")
        )?;
        writeln!(out, "Id String")?;
        writeln!(out, "Title String")?;

        for &i in self.blocks.iter().flat_map(|b| b.cells.iter()) {
            writeln!(out, "{}", self.mesh.cells[i].connectivity.iter().join(" "))?;
        }
        for p in self.mesh.points.iter() {
            writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
        }
        for b in self.boundaries.iter() {
            writeln!(out, "{} {} {}", b.element, b.side, b.id)?;
        }

        out.flush()?;
        Ok(())
    }
}
