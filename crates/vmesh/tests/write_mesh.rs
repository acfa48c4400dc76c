use std::fs;
use std::path::Path;

use nalgebra::Point3;
use tempfile::tempdir;

use vmesh::{
    Cell, CellType, DataArray, MeshFormat, MeshWriter, UnstructuredMesh, WriteError, WriterConfig,
};

fn pressure_mesh() -> UnstructuredMesh {
    UnstructuredMesh::from_points(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)])
        .with_point_data(DataArray::scalars("pressure", vec![10.0, 20.0]))
}

/// A unit tetrahedron with one face tagged as a boundary.
fn tetra_mesh() -> UnstructuredMesh {
    UnstructuredMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![
            Cell::new(CellType::Tetra, vec![0, 1, 2, 3]),
            Cell::new(CellType::Triangle, vec![0, 2, 1]),
        ],
    )
    .with_point_data(DataArray::new("velocity", 3, vec![0.5; 12]).unwrap())
    .with_point_data(DataArray::scalars("pressure", vec![1.0, 2.0, 3.0, 4.0]))
    .with_point_data(DataArray::scalars("distance_", vec![0.0; 4]))
    .with_cell_data(DataArray::scalars("CellEntityIds", vec![1.0, 2.0]))
}

#[test]
fn test_execute_point_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pressure.dat");

    // the explicit format is overridden by the `.dat` extension
    let config = WriterConfig::new(&path).with_format(MeshFormat::LegacyGrid);
    MeshWriter::new()
        .execute(Some(&pressure_mesh()), None, &config)
        .unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        include_str!("../../../test/data/pressure.dat")
    );
}

#[test]
fn test_point_table_idempotent() {
    let dir = tempdir().unwrap();
    let writer = MeshWriter::new();
    let mesh = tetra_mesh();

    let a = dir.path().join("a.dat");
    let b = dir.path().join("b.txt");
    writer.write(&mesh, &a, MeshFormat::PointTable, None).unwrap();
    writer.write(&mesh, &b, MeshFormat::PointTable, None).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());

    let text = fs::read_to_string(&a).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "X Y Z velocity0 velocity1 velocity2 pressure");
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|l| l.split_whitespace().count() == 7));
}

#[test]
fn test_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.dat");
    fs::write(&path, "stale contents that are much longer than the table\n".repeat(10)).unwrap();

    MeshWriter::new()
        .execute(Some(&pressure_mesh()), None, &WriterConfig::new(&path))
        .unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "X Y Z pressure\n0 0 0 10\n1 1 1 20\n"
    );
}

#[test]
fn test_builtin_backends() {
    let dir = tempdir().unwrap();
    let writer = MeshWriter::new();
    let mesh = tetra_mesh();

    let cases = [
        ("mesh.vtk", "# vtk DataFile Version"),
        ("mesh.vtu", "<VTKFile"),
        ("mesh.vtkxml", "<VTKFile"),
        ("mesh.xda", "DEAL 003:003"),
        ("mesh.FDNEUT", "** FIDAP NEUTRAL FILE"),
    ];
    for (name, marker) in cases {
        let path = dir.path().join(name);
        let config = WriterConfig::new(&path).with_entity_ids_array("CellEntityIds");
        writer.execute(Some(&mesh), None, &config).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(marker), "file: {name}");
    }

    // the tagged boundary face is side 0 of the only element
    let xda = fs::read_to_string(dir.path().join("mesh.xda")).unwrap();
    assert!(xda.contains("1\t # Num. Boundary Conds.\n"));
    assert!(xda.ends_with("0 0 2\n"));

    // internal arrays are still written by the grid formats
    let vtk = fs::read_to_string(dir.path().join("mesh.vtk")).unwrap();
    assert!(vtk.starts_with("# vtk DataFile Version"));
    assert!(vtk.contains("distance_"));
    let vtu = fs::read_to_string(dir.path().join("mesh.vtu")).unwrap();
    assert!(vtu.contains("distance_"));
}

#[test]
fn test_unknown_extension_uses_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mesh.out");
    let config = WriterConfig::new(&path).with_format(MeshFormat::LegacyGrid);
    MeshWriter::new()
        .execute(Some(&tetra_mesh()), None, &config)
        .unwrap();
    assert!(
        fs::read_to_string(&path)
            .unwrap()
            .starts_with("# vtk DataFile Version")
    );
}

#[test]
fn test_write_errors() {
    let dir = tempdir().unwrap();
    let writer = MeshWriter::new();
    let mesh = tetra_mesh();

    for format in MeshFormat::ALL {
        assert!(matches!(
            writer.write(&mesh, Path::new(""), format, None),
            Err(WriteError::Configuration(_))
        ));
    }

    let path = dir.path().join("mesh.unknown");
    assert!(matches!(
        writer.write_tagged(&mesh, &path, "obj", true, None),
        Err(WriteError::UnsupportedFormat(_))
    ));
    assert!(!path.exists());

    // a mesh that fails validation leaves no file behind
    let mut broken = tetra_mesh();
    broken.cells.push(Cell::new(CellType::Line, vec![0, 7]));
    for name in ["b.vtk", "b.vtu", "b.xda", "b.FDNEUT", "b.dat"] {
        let path = dir.path().join(name);
        let result = writer.execute(Some(&broken), None, &WriterConfig::new(&path));
        assert!(
            matches!(result, Err(WriteError::InvalidMesh(_))),
            "file: {name}"
        );
        assert!(!path.exists(), "file: {name}");
    }

    // a missing directory is reported as an I/O error
    let path = dir.path().join("missing").join("mesh.dat");
    assert!(matches!(
        writer.write(&mesh, &path, MeshFormat::PointTable, None),
        Err(WriteError::Io(_))
    ));
    let path = dir.path().join("missing").join("mesh.vtu");
    assert!(matches!(
        writer.write(&mesh, &path, MeshFormat::XmlGrid, None),
        Err(WriteError::Io(_))
    ));
}
