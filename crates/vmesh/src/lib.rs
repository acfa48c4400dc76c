pub mod attributes;
pub mod error;
pub mod exchange;
pub mod mesh;

pub use attributes::{DataArray, DataArrays};
pub use error::{WriteError, WriteResult};
pub use exchange::{MeshFormat, MeshWriter, WriterConfig, guess_format, resolve_format};
pub use mesh::{Cell, CellType, UnstructuredMesh};
