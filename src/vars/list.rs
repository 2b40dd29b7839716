//! VarList implementation
//!
//! Vec-backed ordered list; lookups are linear, which is fine for the
//! handful of variables a boot store holds.

use crate::error::{BootinfoError, Result};
use crate::format::BLOCK_SIZE;

use super::{validate_name, validate_value};

/// A single name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    value: String,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Bytes this variable takes when packed (both terminators included)
    pub fn packed_len(&self) -> usize {
        packed_len(&self.name, &self.value)
    }
}

fn packed_len(name: &str, value: &str) -> usize {
    name.len() + value.len() + 2
}

/// Ordered list of boot variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarList {
    entries: Vec<Variable>,
    /// Packed bytes used by all entries
    varsize: usize,
}

impl VarList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Packed bytes used by all variables, end-of-list marker excluded
    pub fn varsize(&self) -> usize {
        self.varsize
    }

    /// Look up a value by exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    /// Iterate over `(name, value)` pairs in list order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Set, replace or delete a variable.
    ///
    /// A `None` or empty value deletes. New names are appended at the tail;
    /// existing names keep their position. `max_size` bounds the total packed
    /// size of the list.
    pub fn set(&mut self, name: &str, value: Option<&str>, max_size: usize) -> Result<()> {
        let value = value.filter(|v| !v.is_empty());

        validate_name(name)?;
        if let Some(v) = value {
            validate_value(v)?;
        }
        if name.len() >= BLOCK_SIZE {
            return Err(BootinfoError::SizeExceeded(format!(
                "variable name is {} bytes, limit is {}",
                name.len(),
                BLOCK_SIZE - 1
            )));
        }

        let position = self.entries.iter().position(|var| var.name == name);

        let Some(v) = value else {
            return match position {
                Some(idx) => {
                    let removed = self.entries.remove(idx);
                    self.varsize -= removed.packed_len();
                    Ok(())
                }
                None => Err(BootinfoError::NotFound(name.to_string())),
            };
        };

        let added = packed_len(name, v);
        let released = position.map_or(0, |idx| self.entries[idx].packed_len());
        if v.len() >= max_size || self.varsize - released + added > max_size {
            return Err(BootinfoError::SizeExceeded(format!(
                "variable {} needs {} bytes, {} of {} in use",
                name, added, self.varsize, max_size
            )));
        }

        match position {
            Some(idx) => self.entries[idx].value = v.to_string(),
            None => self.entries.push(Variable {
                name: name.to_string(),
                value: v.to_string(),
            }),
        }
        self.varsize = self.varsize - released + added;
        Ok(())
    }

    /// Remove a variable by name
    pub fn remove(&mut self, name: &str) -> Result<()> {
        self.set(name, None, usize::MAX)
    }

    /// Copy out the variables whose names begin with an underscore
    pub fn preserved(&self) -> VarList {
        let mut kept = VarList::new();
        for var in self.entries.iter().filter(|var| var.name.starts_with('_')) {
            kept.push(var.name.clone(), var.value.clone());
        }
        kept
    }

    /// Append without validation (used when parsing stored variables)
    pub(super) fn push(&mut self, name: String, value: String) {
        let var = Variable { name, value };
        self.varsize += var.packed_len();
        self.entries.push(var);
    }
}

impl<'a> IntoIterator for &'a VarList {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward iterator over a [`VarList`]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Variable>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|var| (var.name.as_str(), var.value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
