pub mod fdneut;
pub mod point_table;
pub mod vtk;
pub mod vtu;
pub mod xda;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{WriteError, WriteResult};
use crate::mesh::UnstructuredMesh;

use crate::exchange::fdneut::FdneutWriter;
use crate::exchange::vtk::LegacyVtkWriter;
use crate::exchange::vtu::VtuWriter;
use crate::exchange::xda::XdaWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
// An enum to represent the different mesh file formats we can write.
pub enum MeshFormat {
    // the legacy VTK `.vtk` unstructured grid format
    #[serde(rename = "vtk")]
    LegacyGrid,
    // the VTK XML `.vtu` unstructured grid format
    #[default]
    #[serde(rename = "vtkxml")]
    XmlGrid,
    // the libMesh ASCII format
    #[serde(rename = "xda")]
    XdaGrid,
    // the FIDAP neutral format
    #[serde(rename = "fdneut")]
    FdneutGrid,
    // a whitespace separated table of point coordinates and point data
    #[serde(rename = "pointdata")]
    PointTable,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 5] = [
        MeshFormat::LegacyGrid,
        MeshFormat::XmlGrid,
        MeshFormat::XdaGrid,
        MeshFormat::FdneutGrid,
        MeshFormat::PointTable,
    ];

    /// Parse a format tag such as `vtkxml` or `pointdata`.
    ///
    /// Tags are matched exactly: unlike file extensions for loading,
    /// the case of a tag is significant.
    pub fn from_tag(tag: &str) -> WriteResult<Self> {
        match tag {
            "vtk" => Ok(MeshFormat::LegacyGrid),
            "vtkxml" => Ok(MeshFormat::XmlGrid),
            "xda" => Ok(MeshFormat::XdaGrid),
            "fdneut" => Ok(MeshFormat::FdneutGrid),
            "pointdata" => Ok(MeshFormat::PointTable),
            _ => Err(WriteError::UnsupportedFormat(tag.to_string())),
        }
    }

    /// The tag naming this format.
    pub fn tag(&self) -> &'static str {
        match self {
            MeshFormat::LegacyGrid => "vtk",
            MeshFormat::XmlGrid => "vtkxml",
            MeshFormat::XdaGrid => "xda",
            MeshFormat::FdneutGrid => "fdneut",
            MeshFormat::PointTable => "pointdata",
        }
    }

    /// Look up the format for a file extension, without the leading dot.
    /// The lookup is case-sensitive.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "vtu" | "vtkxml" => Some(MeshFormat::XmlGrid),
            "vtk" => Some(MeshFormat::LegacyGrid),
            "xda" => Some(MeshFormat::XdaGrid),
            "FDNEUT" => Some(MeshFormat::FdneutGrid),
            "dat" => Some(MeshFormat::PointTable),
            _ => None,
        }
    }
}

impl FromStr for MeshFormat {
    type Err = WriteError;

    fn from_str(s: &str) -> WriteResult<Self> {
        MeshFormat::from_tag(s)
    }
}

impl std::fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Guess the format from the extension of the last path segment.
///
/// Leading dots of a name never start an extension, so `.vtk` and
/// `..vtk` have none.
pub fn guess_format(path: &Path) -> Option<MeshFormat> {
    let name = path.file_name()?.to_str()?;
    let (_, extension) = name.trim_start_matches('.').rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    MeshFormat::from_extension(extension)
}

/// Pick the format to write: a recognized extension on `output_path`
/// wins over `explicit` when `guess` is enabled.
pub fn resolve_format(explicit: MeshFormat, output_path: &Path, guess: bool) -> MeshFormat {
    if guess && !output_path.as_os_str().is_empty() {
        if let Some(format) = guess_format(output_path) {
            debug!(
                "guessed format `{}` from `{}`",
                format,
                output_path.display()
            );
            return format;
        }
    }
    explicit
}

/// Options for writing a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    // the format used when it can't be guessed from the file name
    pub format: MeshFormat,
    // guess the format from the output file extension
    pub guess_format: bool,
    pub output_path: PathBuf,
    // the cell data array holding boundary entity ids, XDA only
    pub entity_ids_array_name: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            format: MeshFormat::XmlGrid,
            guess_format: true,
            output_path: PathBuf::new(),
            entity_ids_array_name: None,
        }
    }
}

impl WriterConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: MeshFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_guess_format(mut self, guess: bool) -> Self {
        self.guess_format = guess;
        self
    }

    pub fn with_entity_ids_array(mut self, name: &str) -> Self {
        self.entity_ids_array_name = Some(name.to_string());
        self
    }

    /// The format that will be written with this configuration.
    pub fn resolved_format(&self) -> MeshFormat {
        resolve_format(self.format, &self.output_path, self.guess_format)
    }
}

/// Options passed to an XDA backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XdaOptions {
    // the name of the cell data array carrying boundary entity ids
    pub boundary_data_array_name: Option<String>,
}

/// Writes the legacy VTK unstructured grid format.
pub trait LegacyGridWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()>;
}

/// Writes the VTK XML unstructured grid format.
pub trait XmlGridWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()>;
}

/// Writes the libMesh XDA format.
pub trait XdaGridWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path, options: &XdaOptions) -> Result<()>;
}

/// Writes the FIDAP neutral format.
pub trait FdneutGridWriter {
    fn write(&self, mesh: &UnstructuredMesh, path: &Path) -> Result<()>;
}

/// Selects a file format and hands the mesh to the matching backend.
///
/// The writer keeps no state between calls: the mesh and the output
/// target are passed to every call.
pub struct MeshWriter {
    legacy: Box<dyn LegacyGridWriter>,
    xml: Box<dyn XmlGridWriter>,
    xda: Box<dyn XdaGridWriter>,
    fdneut: Box<dyn FdneutGridWriter>,
}

impl Default for MeshWriter {
    fn default() -> Self {
        Self {
            legacy: Box::new(LegacyVtkWriter::default()),
            xml: Box::new(VtuWriter),
            xda: Box::new(XdaWriter),
            fdneut: Box::new(FdneutWriter::default()),
        }
    }
}

impl MeshWriter {
    /// A writer using the built-in backends for every format.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legacy_writer(mut self, writer: impl LegacyGridWriter + 'static) -> Self {
        self.legacy = Box::new(writer);
        self
    }

    pub fn with_xml_writer(mut self, writer: impl XmlGridWriter + 'static) -> Self {
        self.xml = Box::new(writer);
        self
    }

    pub fn with_xda_writer(mut self, writer: impl XdaGridWriter + 'static) -> Self {
        self.xda = Box::new(writer);
        self
    }

    pub fn with_fdneut_writer(mut self, writer: impl FdneutGridWriter + 'static) -> Self {
        self.fdneut = Box::new(writer);
        self
    }

    /// Write `mesh` to `output_path` in `format`.
    ///
    /// Parameters
    /// ------------
    /// mesh
    ///   The mesh to write, it is only read.
    /// output_path
    ///   The file to create or overwrite.
    /// format
    ///   Which backend to use.
    /// entity_ids_array_name
    ///   The cell data array with boundary entity ids, only used for XDA
    ///   and only when non-empty.
    ///
    /// Returns
    /// ------------
    /// WriteResult<()>
    ///   A configuration error if `output_path` is empty, otherwise whatever
    ///   the backend reports. A failed backend may leave a partially written
    ///   file behind: files are written in place, not renamed into position.
    pub fn write(
        &self,
        mesh: &UnstructuredMesh,
        output_path: &Path,
        format: MeshFormat,
        entity_ids_array_name: Option<&str>,
    ) -> WriteResult<()> {
        if output_path.as_os_str().is_empty() {
            return Err(WriteError::no_output_path());
        }

        let result = match format {
            MeshFormat::LegacyGrid => {
                info!("Writing VTK mesh file.");
                self.legacy.write(mesh, output_path)
            }
            MeshFormat::XmlGrid => {
                info!("Writing VTK XML mesh file.");
                self.xml.write(mesh, output_path)
            }
            MeshFormat::XdaGrid => {
                info!("Writing Xda mesh file.");
                let options = XdaOptions {
                    boundary_data_array_name: entity_ids_array_name
                        .filter(|name| !name.is_empty())
                        .map(str::to_string),
                };
                self.xda.write(mesh, output_path, &options)
            }
            MeshFormat::FdneutGrid => {
                info!("Writing FDNEUT mesh file.");
                self.fdneut.write(mesh, output_path)
            }
            MeshFormat::PointTable => {
                info!("Writing PointData file.");
                return point_table::export_point_table(mesh, output_path);
            }
        };

        result.map_err(backend_error)
    }

    /// Write with the mesh taken from `mesh`, or from the upstream
    /// `input` if no mesh was set.
    pub fn write_with_fallback(
        &self,
        mesh: Option<&UnstructuredMesh>,
        input: Option<&UnstructuredMesh>,
        output_path: &Path,
        format: MeshFormat,
        entity_ids_array_name: Option<&str>,
    ) -> WriteResult<()> {
        let mesh = mesh.or(input).ok_or_else(WriteError::no_mesh)?;
        self.write(mesh, output_path, format, entity_ids_array_name)
    }

    /// Write using a format tag like `vtkxml`. When `guess` is set and the
    /// extension of `output_path` is recognized the tag is ignored, so an
    /// unknown tag is only an error when the extension doesn't decide.
    pub fn write_tagged(
        &self,
        mesh: &UnstructuredMesh,
        output_path: &Path,
        tag: &str,
        guess: bool,
        entity_ids_array_name: Option<&str>,
    ) -> WriteResult<()> {
        if output_path.as_os_str().is_empty() {
            return Err(WriteError::no_output_path());
        }
        let format = match guess.then(|| guess_format(output_path)).flatten() {
            Some(format) => format,
            None => tag.parse()?,
        };
        self.write(mesh, output_path, format, entity_ids_array_name)
    }

    /// Run a configured write: pick the mesh, resolve the format and
    /// dispatch to the backend.
    pub fn execute(
        &self,
        mesh: Option<&UnstructuredMesh>,
        input: Option<&UnstructuredMesh>,
        config: &WriterConfig,
    ) -> WriteResult<()> {
        let mesh = mesh.or(input).ok_or_else(WriteError::no_mesh)?;
        let format = config.resolved_format();
        self.write(
            mesh,
            &config.output_path,
            format,
            config.entity_ids_array_name.as_deref(),
        )
    }
}

/// Surface typed errors raised inside a backend as themselves and
/// anything else as a backend failure.
fn backend_error(err: anyhow::Error) -> WriteError {
    match err.downcast::<WriteError>() {
        Ok(typed) => typed,
        Err(other) => match other.downcast::<std::io::Error>() {
            Ok(io) => WriteError::Io(io),
            Err(other) => WriteError::Backend(other),
        },
    }
}
