//! A plain text table of point coordinates and point data.
//!
//! The first line names the columns, `X Y Z` followed by one column per
//! component of every exported point data array. Single component arrays
//! use the array name, others append the component index (`velocity0
//! velocity1 velocity2`). Each following line holds one point.
//!
//! Numbers use the shortest decimal text that parses back to the same
//! `f64`, without exponent notation, so `10.0` is written as `10`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use rayon::prelude::*;

use crate::attributes::DataArray;
use crate::error::WriteResult;
use crate::exchange::vtk::token;
use crate::mesh::UnstructuredMesh;

/// The point data arrays that are exported: with a non-empty name that
/// is not internal, in their original order.
pub fn exported_arrays(mesh: &UnstructuredMesh) -> Vec<&DataArray> {
    mesh.point_data
        .iter()
        .filter(|a| a.name.as_deref().is_some_and(|n| !n.is_empty()) && !a.is_internal())
        .collect()
}

/// The column names of the table. Whitespace inside a name becomes `_`
/// so every line splits into the same number of fields.
pub fn header_fields(arrays: &[&DataArray]) -> Vec<String> {
    let mut fields: Vec<String> = vec!["X".into(), "Y".into(), "Z".into()];
    for array in arrays {
        let name = token(array.name.as_deref().unwrap_or_default());
        if array.components == 1 {
            fields.push(name.to_string());
        } else {
            fields.extend((0..array.components).map(|j| format!("{name}{j}")));
        }
    }
    fields
}

/// Write the table for `mesh` to any writer.
pub fn write_point_table<W: Write>(mesh: &UnstructuredMesh, mut out: W) -> WriteResult<()> {
    mesh.validate()?;
    let arrays = exported_arrays(mesh);

    writeln!(out, "{}", header_fields(&arrays).join(" "))?;

    // format rows in parallel, the collected order matches the point order
    let rows: Vec<String> = mesh
        .points
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            point
                .coords
                .iter()
                .copied()
                .chain(
                    arrays
                        .iter()
                        .flat_map(|a| (0..a.components).map(move |j| a.component(i, j))),
                )
                .join(" ")
        })
        .collect();

    for row in rows {
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

/// Create or overwrite `path` with the point table for `mesh`.
pub fn export_point_table(mesh: &UnstructuredMesh, path: &Path) -> WriteResult<()> {
    // check before the file is created so a bad mesh leaves nothing behind
    mesh.validate()?;
    let file = File::create(path)?;
    write_point_table(mesh, BufWriter::new(file))
}
