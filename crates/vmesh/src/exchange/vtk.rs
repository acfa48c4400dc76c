//! Legacy VTK output (`.vtk`) as an ASCII unstructured grid.
//!
//! The mesh is converted into a `vtkio` model which both this writer and
//! the `.vtu` writer export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, anyhow};
use vtkio::model::{
    Attribute, Attributes, ByteOrder, Cells, DataSet, FieldArray, IOBuffer, UnstructuredGridPiece,
    Version, VertexNumbers, Vtk,
};

use crate::attributes::DataArrays;
use crate::exchange::LegacyGridWriter;
use crate::mesh::{CellType, UnstructuredMesh};

/// Writes the legacy VTK format with a fixed title line.
#[derive(Debug, Clone)]
pub struct LegacyVtkWriter {
    pub title: String,
}

impl Default for LegacyVtkWriter {
    fn default() -> Self {
        Self {
            title: "vmesh unstructured grid".to_string(),
        }
    }
}

impl LegacyGridWriter for LegacyVtkWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()> {
        mesh.validate()?;
        // the file is only created once the whole text is built
        let text = write_legacy_vtk(mesh, &self.title)?;
        let mut file = File::create(path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Which flavor of VTK file a model is built for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum VtkFlavor {
    Legacy,
    Xml,
}

pub(crate) fn vtk_cell_type(kind: CellType) -> vtkio::model::CellType {
    use vtkio::model::CellType as Vtk;
    match kind {
        CellType::Vertex => Vtk::Vertex,
        CellType::Line => Vtk::Line,
        CellType::Triangle => Vtk::Triangle,
        CellType::Quad => Vtk::Quad,
        CellType::Tetra => Vtk::Tetra,
        CellType::Hexahedron => Vtk::Hexahedron,
        CellType::Wedge => Vtk::Wedge,
        CellType::Pyramid => Vtk::Pyramid,
        CellType::QuadraticTriangle => Vtk::QuadraticTriangle,
        CellType::QuadraticTetra => Vtk::QuadraticTetra,
    }
}

/// Convert the mesh into a `vtkio` model holding a single inline piece.
pub(crate) fn to_vtk(mesh: &UnstructuredMesh, title: &str, flavor: VtkFlavor) -> Vtk {
    let points: Vec<f64> = mesh.points.iter().flat_map(|p| [p.x, p.y, p.z]).collect();

    let cell_verts = match flavor {
        // every legacy cell is its node count followed by the node indexes
        VtkFlavor::Legacy => VertexNumbers::Legacy {
            num_cells: mesh.cell_count() as u32,
            vertices: mesh
                .cells
                .iter()
                .flat_map(|c| {
                    std::iter::once(c.connectivity.len() as u32)
                        .chain(c.connectivity.iter().map(|&v| v as u32))
                })
                .collect(),
        },
        VtkFlavor::Xml => VertexNumbers::XML {
            connectivity: mesh
                .cells
                .iter()
                .flat_map(|c| c.connectivity.iter().map(|&v| v as u64))
                .collect(),
            // the running end of each cell in `connectivity`
            offsets: mesh
                .cells
                .iter()
                .scan(0u64, |end, c| {
                    *end += c.connectivity.len() as u64;
                    Some(*end)
                })
                .collect(),
        },
    };

    let (version, title) = match flavor {
        VtkFlavor::Legacy => (Version::new((4, 1)), single_line(title)),
        VtkFlavor::Xml => (Version { major: 2, minor: 2 }, String::new()),
    };

    Vtk {
        version,
        title,
        byte_order: ByteOrder::LittleEndian,
        file_path: None,
        data: DataSet::inline(UnstructuredGridPiece {
            points: IOBuffer::F64(points),
            cells: Cells {
                cell_verts,
                types: mesh.cells.iter().map(|c| vtk_cell_type(c.kind)).collect(),
            },
            data: Attributes {
                point: attributes(&mesh.point_data, flavor),
                cell: attributes(&mesh.cell_data, flavor),
            },
        }),
    }
}

/// Named arrays as `vtkio` attributes. Single component arrays are
/// scalars; in the legacy format the rest share one `FIELD` block.
fn attributes(arrays: &DataArrays, flavor: VtkFlavor) -> Vec<Attribute> {
    let mut result = Vec::new();
    let mut fields = Vec::new();
    for (name, array) in arrays.named() {
        let data = IOBuffer::F64(array.values.clone());
        match flavor {
            VtkFlavor::Legacy if array.components == 1 => {
                result.push(Attribute::scalars(token(name), 1).with_data(data))
            }
            VtkFlavor::Legacy => fields.push(FieldArray {
                name: token(name),
                elem: array.components as u32,
                data,
            }),
            VtkFlavor::Xml if array.components == 1 => {
                result.push(Attribute::scalars(name, 1).with_data(data))
            }
            VtkFlavor::Xml => {
                result.push(Attribute::generic(name, array.components as u32).with_data(data))
            }
        }
    }
    if !fields.is_empty() {
        result.push(Attribute::Field {
            name: "FieldData".to_string(),
            data_array: fields,
        });
    }
    result
}

/// Write `mesh` as an ASCII legacy VTK unstructured grid.
pub fn write_legacy_vtk(mesh: &UnstructuredMesh, title: &str) -> Result<String> {
    let mut text = String::new();
    to_vtk(mesh, title, VtkFlavor::Legacy)
        .write_legacy_ascii(&mut text)
        .map_err(|e| anyhow!("could not write legacy VTK: {:?}", e))?;
    Ok(text)
}

/// The title is a single line of at most 256 characters.
fn single_line(title: &str) -> String {
    title
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(256)
        .collect()
}

/// Array names are whitespace delimited tokens in the legacy format.
pub(crate) fn token(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if clean.is_empty() {
        "unnamed".to_string()
    } else {
        clean
    }
}
