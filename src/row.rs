use std::fmt;
use std::iter::FromIterator;
use std::ops;

/// A single CSV row: an ordered sequence of string fields.
///
/// All fields are stored contiguously in one `String`, alongside the end
/// offset of each field, so reading rows into a reused `Row` does not
/// allocate once its buffers are large enough.
///
/// Rows are independent of each other: no schema is enforced, so rows read
/// from the same data may have different lengths.
#[derive(Clone, Default, Eq, PartialEq, Hash)]
pub struct Row {
    /// All fields in this row, stored contiguously.
    fields: String,
    /// The ending offset of each field in `fields`.
    ends: Vec<usize>,
}

impl Row {
    /// Create a new empty `Row`.
    pub fn new() -> Row {
        Row::default()
    }

    /// Create a new empty `Row` with room for `buffer` bytes of field data
    /// spread over `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> Row {
        Row {
            fields: String::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    pub fn get(&self, i: usize) -> Option<&str> {
        let end = *self.ends.get(i)?;
        let start = match i.checked_sub(1) {
            None => 0,
            Some(prev) => self.ends[prev],
        };
        Some(&self.fields[start..end])
    }

    /// Returns true if and only if this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Returns the number of fields in this row.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Clear this row so that it has zero fields.
    ///
    /// Note that it is not necessary to clear the row to reuse it with
    /// `Reader::read_row`.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
    }

    /// Add a new field to the end of this row.
    pub fn push_field(&mut self, field: &str) {
        self.fields.push_str(field);
        self.ends.push(self.fields.len());
    }

    /// Returns an iterator over all fields in this row.
    pub fn iter(&self) -> RowIter {
        RowIter { row: self, start: 0, i: 0 }
    }

    /// Copy every field into its own `String`.
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().map(|f| f.to_string()).collect()
    }

    /// The buffers the tokenizer writes into.
    pub(crate) fn as_parts(&mut self) -> (&mut String, &mut Vec<usize>) {
        (&mut self.fields, &mut self.ends)
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Row(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl ops::Index<usize> for Row {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "field index {} out of bounds for row of length {}",
                i,
                self.len()
            ),
        }
    }
}

impl<T: AsRef<str>> From<Vec<T>> for Row {
    fn from(fields: Vec<T>) -> Row {
        Row::from_iter(fields)
    }
}

impl<'a, T: AsRef<str>> From<&'a [T]> for Row {
    fn from(fields: &'a [T]) -> Row {
        Row::from_iter(fields)
    }
}

impl<T: AsRef<str>> FromIterator<T> for Row {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Row {
        let mut row = Row::new();
        row.extend(iter);
        row
    }
}

impl<T: AsRef<str>> Extend<T> for Row {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for field in iter {
            self.push_field(field.as_ref());
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type IntoIter = RowIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for Row {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<'a, T: AsRef<str>> PartialEq<&'a [T]> for Row {
    fn eq(&self, other: &&'a [T]) -> bool {
        self == *other
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for Row {
    fn eq(&self, other: &Vec<T>) -> bool {
        self == other.as_slice()
    }
}

/// An iterator over the fields in a row.
#[derive(Clone, Debug)]
pub struct RowIter<'r> {
    row: &'r Row,
    start: usize,
    i: usize,
}

impl<'r> Iterator for RowIter<'r> {
    type Item = &'r str;

    fn next(&mut self) -> Option<&'r str> {
        let end = *self.row.ends.get(self.i)?;
        let field = &self.row.fields[self.start..end];
        self.start = end;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.row.len() - self.i;
        (n, Some(n))
    }
}

impl<'r> ExactSizeIterator for RowIter<'r> {}
