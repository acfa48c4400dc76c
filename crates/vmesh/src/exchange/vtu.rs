//! VTK XML unstructured grid output (`.vtu`), one inline `Piece` per file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Result, anyhow};

use crate::exchange::XmlGridWriter;
use crate::exchange::vtk::{VtkFlavor, to_vtk};
use crate::mesh::UnstructuredMesh;

/// Writes `.vtu` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct VtuWriter;

impl XmlGridWriter for VtuWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()> {
        mesh.validate()?;
        let buffer = write_vtu(mesh)?;
        let mut file = File::create(path)?;
        file.write_all(&buffer)?;
        file.flush()?;
        Ok(())
    }
}

/// Serialize `mesh` as a VTK XML unstructured grid.
pub fn write_vtu(mesh: &UnstructuredMesh) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_vtk(mesh, "", VtkFlavor::Xml)
        .write_xml(&mut buffer)
        .map_err(|e| anyhow!("could not write VTU: {:?}", e))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {

    use nalgebra::Point3;
    use tempfile::tempdir;
    use vtkio::model::{Attribute, DataSet, Piece, Vtk};

    use super::*;
    use crate::attributes::DataArray;
    use crate::mesh::{Cell, CellType};

    fn quad_and_triangle() -> UnstructuredMesh {
        UnstructuredMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 0.5, 0.0),
            ],
            vec![
                Cell::new(CellType::Quad, vec![0, 1, 2, 3]),
                Cell::new(CellType::Triangle, vec![1, 4, 2]),
            ],
        )
        .with_point_data(DataArray::scalars("p<0>", vec![0.0, 1.0, 2.0, 3.0, 4.0]))
        .with_point_data(DataArray::new("velocity", 3, vec![0.25; 15]).unwrap())
        .with_point_data(DataArray::unnamed(1, vec![9.0; 5]).unwrap())
        .with_cell_data(DataArray::scalars("CellEntityIds", vec![1.0, 2.0]))
    }

    #[test]
    fn test_vtu_structure() {
        let buffer = write_vtu(&quad_and_triangle()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("<VTKFile"));
        assert!(text.contains("UnstructuredGrid"));
        // markup in array names is escaped
        assert!(!text.contains("\"p<0>\""));
    }

    #[test]
    fn test_vtu_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.vtu");
        VtuWriter.write(&quad_and_triangle(), &path).unwrap();

        let vtk = Vtk::import(&path).unwrap();
        let DataSet::UnstructuredGrid { pieces, .. } = vtk.data else {
            panic!("expected an unstructured grid");
        };
        assert_eq!(pieces.len(), 1);
        let Piece::Inline(piece) = &pieces[0] else {
            panic!("expected an inline piece");
        };
        assert_eq!(piece.num_points(), 5);
        assert_eq!(
            piece.cells.types,
            vec![vtkio::model::CellType::Quad, vtkio::model::CellType::Triangle]
        );

        let names: Vec<&str> = piece
            .data
            .point
            .iter()
            .filter_map(|a| match a {
                Attribute::DataArray(array) => Some(array.name.as_str()),
                Attribute::Field { .. } => None,
            })
            .collect();
        assert_eq!(names, vec!["p<0>", "velocity"]);
        assert_eq!(piece.data.cell.len(), 1);
    }

    #[test]
    fn test_vtu_invalid_mesh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.vtu");
        let mesh = UnstructuredMesh::new(
            vec![Point3::new(0.0, 0.0, 0.0)],
            vec![Cell::new(CellType::Line, vec![0, 3])],
        );
        assert!(VtuWriter.write(&mesh, &path).is_err());
        assert!(!path.exists());
    }
}
