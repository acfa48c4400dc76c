use nalgebra::Point3;

use crate::attributes::{DataArray, DataArrays};
use crate::error::{WriteError, WriteResult};

/// The cell shapes an unstructured grid can hold.
///
/// The discriminants are the VTK cell type ids, which is also the
/// node ordering used by `Cell::connectivity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Vertex = 1,
    Line = 3,
    Triangle = 5,
    Quad = 9,
    Tetra = 10,
    Hexahedron = 12,
    Wedge = 13,
    Pyramid = 14,
    QuadraticTriangle = 22,
    QuadraticTetra = 24,
}

impl CellType {
    /// The VTK cell type id.
    pub fn vtk_id(&self) -> u8 {
        *self as u8
    }

    /// How many nodes a cell of this type references.
    pub fn node_count(&self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Line => 2,
            CellType::Triangle => 3,
            CellType::Quad => 4,
            CellType::Tetra => 4,
            CellType::Hexahedron => 8,
            CellType::Wedge => 6,
            CellType::Pyramid => 5,
            CellType::QuadraticTriangle => 6,
            CellType::QuadraticTetra => 10,
        }
    }

    /// The topological dimension of the cell.
    pub fn dimension(&self) -> usize {
        match self {
            CellType::Vertex => 0,
            CellType::Line => 1,
            CellType::Triangle | CellType::Quad | CellType::QuadraticTriangle => 2,
            CellType::Tetra
            | CellType::Hexahedron
            | CellType::Wedge
            | CellType::Pyramid
            | CellType::QuadraticTetra => 3,
        }
    }

    /// A lowercase name used in log messages and file headers.
    pub fn name(&self) -> &'static str {
        match self {
            CellType::Vertex => "vertex",
            CellType::Line => "line",
            CellType::Triangle => "triangle",
            CellType::Quad => "quad",
            CellType::Tetra => "tetra",
            CellType::Hexahedron => "hexahedron",
            CellType::Wedge => "wedge",
            CellType::Pyramid => "pyramid",
            CellType::QuadraticTriangle => "quadratic_triangle",
            CellType::QuadraticTetra => "quadratic_tetra",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellType,
    // indexes into `UnstructuredMesh::points`
    pub connectivity: Vec<usize>,
}

impl Cell {
    pub fn new(kind: CellType, connectivity: Vec<usize>) -> Self {
        Self { kind, connectivity }
    }
}

/// An unstructured grid: points, cells of mixed type, and named data
/// arrays attached to either.
#[derive(Debug, Clone, Default)]
pub struct UnstructuredMesh {
    pub points: Vec<Point3<f64>>,
    pub cells: Vec<Cell>,

    // one tuple per point
    pub point_data: DataArrays,
    // one tuple per cell
    pub cell_data: DataArrays,
}

impl UnstructuredMesh {
    /// Create a mesh from points and cells with no data arrays.
    pub fn new(points: Vec<Point3<f64>>, cells: Vec<Cell>) -> Self {
        Self {
            points,
            cells,
            ..Default::default()
        }
    }

    /// Create a mesh with only points, as produced by point-cloud steps.
    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self::new(points, Vec::new())
    }

    pub fn with_point_data(mut self, array: DataArray) -> Self {
        self.point_data.push(array);
        self
    }

    pub fn with_cell_data(mut self, array: DataArray) -> Self {
        self.cell_data.push(array);
        self
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The highest topological dimension among the cells, or None
    /// if the mesh has no cells.
    pub fn max_dimension(&self) -> Option<usize> {
        self.cells.iter().map(|c| c.kind.dimension()).max()
    }

    /// Check that the cells and data arrays are consistent with the
    /// points, returning the first problem found.
    pub fn validate(&self) -> WriteResult<()> {
        let n_points = self.points.len();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.connectivity.len() != cell.kind.node_count() {
                return Err(WriteError::InvalidMesh(format!(
                    "cell {} is a {} with {} nodes, expected {}",
                    i,
                    cell.kind.name(),
                    cell.connectivity.len(),
                    cell.kind.node_count()
                )));
            }
            if let Some(&bad) = cell.connectivity.iter().find(|&&p| p >= n_points) {
                return Err(WriteError::InvalidMesh(format!(
                    "cell {} references point {} but the mesh has {} points",
                    i, bad, n_points
                )));
            }
        }

        check_arrays(&self.point_data, n_points, "point")?;
        check_arrays(&self.cell_data, self.cells.len(), "cell")
    }
}

fn check_arrays(arrays: &DataArrays, expected: usize, kind: &str) -> WriteResult<()> {
    for array in arrays {
        if array.components == 0 || array.tuples() != expected {
            return Err(WriteError::InvalidMesh(format!(
                "{} data array `{}` has {} tuples of {} components, expected {} tuples",
                kind,
                array.name.as_deref().unwrap_or(""),
                array.tuples(),
                array.components,
                expected
            )));
        }
    }
    Ok(())
}
