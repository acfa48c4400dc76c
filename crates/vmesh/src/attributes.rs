use ahash::AHashMap;
use anyhow::{Result, anyhow};

/// A named, multi-component numeric array with one value-tuple per
/// point or per cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataArray {
    // some producers leave arrays unnamed, those are never exported by name
    pub name: Option<String>,

    // the number of values in each tuple, always at least 1
    pub components: usize,

    // tuple-major values: tuple `i` occupies `values[i * components..(i + 1) * components]`
    pub values: Vec<f64>,
}

impl DataArray {
    /// Create a named array from flat tuple-major values.
    ///
    /// Parameters
    /// ------------
    /// name
    ///   The array name.
    /// components
    ///   The number of components in each tuple.
    /// values
    ///   The flat values, a multiple of `components` long.
    pub fn new(name: &str, components: usize, values: Vec<f64>) -> Result<Self> {
        Self::build(Some(name.to_string()), components, values)
    }

    /// Create an array without a name.
    pub fn unnamed(components: usize, values: Vec<f64>) -> Result<Self> {
        Self::build(None, components, values)
    }

    /// Create a single-component array.
    pub fn scalars(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: Some(name.to_string()),
            components: 1,
            values,
        }
    }

    fn build(name: Option<String>, components: usize, values: Vec<f64>) -> Result<Self> {
        if components == 0 {
            return Err(anyhow!("data array must have at least one component"));
        }
        if values.len() % components != 0 {
            return Err(anyhow!(
                "{} values do not divide into tuples of {} components",
                values.len(),
                components
            ));
        }
        Ok(Self {
            name,
            components,
            values,
        })
    }

    /// The number of tuples stored in the array.
    pub fn tuples(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    /// The value of component `j` of tuple `i`.
    pub fn component(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.components + j]
    }

    /// The values of tuple `i`.
    pub fn tuple(&self, i: usize) -> &[f64] {
        &self.values[i * self.components..(i + 1) * self.components]
    }

    /// Names ending in `_` mark derived arrays used internally by
    /// processing steps, which are left out of text exports.
    pub fn is_internal(&self) -> bool {
        self.name.as_deref().is_some_and(|n| n.ends_with('_'))
    }
}

/// An ordered collection of data arrays attached to the points or
/// the cells of a mesh.
#[derive(Debug, Clone, Default)]
pub struct DataArrays {
    arrays: Vec<DataArray>,
    // name -> position in `arrays`, the first array wins on duplicates
    index: AHashMap<String, usize>,
}

impl DataArrays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an array, keeping insertion order.
    pub fn push(&mut self, array: DataArray) {
        if let Some(name) = &array.name {
            self.index.entry(name.clone()).or_insert(self.arrays.len());
        }
        self.arrays.push(array);
    }

    /// Look up an array by name.
    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.index.get(name).map(|&i| &self.arrays[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataArray> {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// The named arrays, in order. Unnamed arrays cannot be addressed
    /// by any of the file formats so they are skipped.
    pub fn named(&self) -> impl Iterator<Item = (&str, &DataArray)> {
        self.arrays
            .iter()
            .filter_map(|a| a.name.as_deref().map(|n| (n, a)))
    }
}

impl FromIterator<DataArray> for DataArrays {
    fn from_iter<T: IntoIterator<Item = DataArray>>(iter: T) -> Self {
        let mut result = DataArrays::new();
        for array in iter {
            result.push(array);
        }
        result
    }
}

impl<'a> IntoIterator for &'a DataArrays {
    type Item = &'a DataArray;
    type IntoIter = std::slice::Iter<'a, DataArray>;

    fn into_iter(self) -> Self::IntoIter {
        self.arrays.iter()
    }
}
