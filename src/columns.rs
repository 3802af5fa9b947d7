//! Column naming for tables derived from CSV headers.
//!
//! Header cells become column names in order. Repeated names are kept apart
//! by appending the 1-based occurrence count to every occurrence after the
//! first, so `A,B,A,A` becomes `A,B,A2,A3`.

use std::collections::{HashMap, HashSet};

/// A table name plus its ordered column list, as derived from one CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    /// The encoding-marker line that preceded the header, if any.
    pub marker: Option<String>,
}

impl TableDescriptor {
    pub fn from_headers(name: impl Into<String>, headers: &[String], marker: Option<String>) -> Self {
        Self {
            name: name.into(),
            columns: disambiguate(headers),
            marker,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Renames repeats to `<name><k>`; when that collides case-insensitively with
/// a name already taken, `k` keeps increasing until the name is free.
pub fn disambiguate(headers: &[String]) -> Vec<String> {
    let named = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            if header.trim().is_empty() {
                format!("column{}", idx + 1)
            } else {
                header.clone()
            }
        })
        .collect::<Vec<_>>();

    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(named.len());
    for name in &named {
        let count = occurrences.entry(name.as_str()).or_insert(0);
        *count += 1;
        let mut candidate = if *count == 1 {
            name.clone()
        } else {
            format!("{name}{count}")
        };
        // Database identifiers compare case-insensitively, so "Name" and "name2"
        // must not both map to an existing column.
        while taken.contains(&candidate.to_lowercase()) {
            *count += 1;
            candidate = format!("{name}{count}");
        }
        taken.insert(candidate.to_lowercase());
        columns.push(candidate);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn duplicates_receive_occurrence_suffix() {
        let columns = disambiguate(&names(&["A", "B", "A", "A"]));
        assert_eq!(columns, names(&["A", "B", "A2", "A3"]));
    }

    #[test]
    fn unique_headers_are_untouched() {
        let columns = disambiguate(&names(&["id", "name", "amount"]));
        assert_eq!(columns, names(&["id", "name", "amount"]));
    }

    #[test]
    fn generated_name_skips_existing_header() {
        let columns = disambiguate(&names(&["A", "A2", "A"]));
        assert_eq!(columns, names(&["A", "A2", "A3"]));
    }

    #[test]
    fn case_variants_do_not_collide() {
        let columns = disambiguate(&names(&["Name", "name"]));
        assert_eq!(columns, names(&["Name", "name2"]));
    }

    #[test]
    fn blank_headers_use_position() {
        let columns = disambiguate(&names(&["id", "", " "]));
        assert_eq!(columns, names(&["id", "column2", "column3"]));
    }
}
